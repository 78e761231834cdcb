use thiserror::Error;
use warp_intents_types::WarpError;

use crate::codec::CodecError;

#[derive(Debug, Clone, Error)]
pub enum AssemblyError {
    #[error("action '{action}' is missing a value for required input '{input}'")]
    MissingParameter { action: String, input: String },

    #[error("action '{action}' binds more than one input to {position}")]
    DuplicatePosition { action: String, position: String },

    #[error("cannot encode input '{input}': {source}")]
    Encoding {
        input: String,
        #[source]
        source: CodecError,
    },

    #[error("invalid address in {field}: {reason}")]
    InvalidAddress { field: String, reason: String },

    #[error("action '{action}' has no receiver")]
    MissingReceiver { action: String },

    #[error("action '{action}' cannot attach EGLD to a token transfer")]
    ValueWithTokenTransfer { action: String },

    #[error("invalid warp: {0}")]
    InvalidWarp(WarpError),

    #[error("failed to serialize warp: {0}")]
    Serialization(String),
}

impl From<WarpError> for AssemblyError {
    fn from(err: WarpError) -> Self {
        match err {
            WarpError::DuplicatePosition { label, position } => AssemblyError::DuplicatePosition {
                action: label,
                position,
            },
            other => AssemblyError::InvalidWarp(other),
        }
    }
}
