use thiserror::Error;
use warp_intents_catalog::CatalogError;
use warp_intents_types::WarpError;

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("no template for intent '{0}'")]
    UnsupportedIntent(String),

    #[error("invalid value for input '{input}': {reason}")]
    InvalidParameter { input: String, reason: String },

    #[error("compiled warp is invalid: {0}")]
    InvalidWarp(#[from] WarpError),

    #[error("catalog error: {0}")]
    Catalog(String),
}

impl CompileError {
    pub(crate) fn invalid(input: &str, reason: impl Into<String>) -> Self {
        CompileError::InvalidParameter {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<CatalogError> for CompileError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnsupportedIntent(id) => CompileError::UnsupportedIntent(id),
            other => CompileError::Catalog(other.to_string()),
        }
    }
}
