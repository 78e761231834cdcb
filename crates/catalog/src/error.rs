use thiserror::Error;
use warp_intents_types::WarpError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unsupported intent: {0}")]
    UnsupportedIntent(String),

    #[error("template '{id}' is invalid: {source}")]
    InvalidTemplate {
        id: String,
        #[source]
        source: WarpError,
    },

    #[error("template '{0}' is defined more than once")]
    DuplicateTemplate(String),

    #[error("failed to parse template catalog: {0}")]
    Parse(#[from] serde_json::Error),
}
