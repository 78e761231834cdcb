use thiserror::Error;

/// Failure to parse or validate a bech32 account address
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid bech32 address '{address}': {reason}")]
    InvalidBech32 { address: String, reason: String },

    #[error("address '{address}' has prefix '{found}', expected '{expected}'")]
    WrongPrefix {
        address: String,
        expected: String,
        found: String,
    },

    #[error("address '{address}' decodes to {len} bytes, expected 32")]
    WrongLength { address: String, len: usize },
}

/// Failure to parse a data type or an input position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown data type '{0}'")]
    UnknownDataType(String),

    #[error("malformed data type '{0}'")]
    MalformedDataType(String),

    #[error("invalid input position '{0}'")]
    InvalidPosition(String),

    #[error("invalid modifier '{0}'")]
    InvalidModifier(String),

    #[error("malformed token payment '{0}', expected IDENT|amount or IDENT|nonce|amount")]
    MalformedEsdt(String),
}

/// Structural problems in a Warp document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarpError {
    #[error("warp has no actions")]
    NoActions,

    #[error("action '{label}' is invalid: {reason}")]
    InvalidAction { label: String, reason: String },

    #[error("duplicate position '{position}' in action '{label}'")]
    DuplicatePosition { label: String, position: String },

    #[error("failed to serialize warp: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for WarpError {
    fn from(e: serde_json::Error) -> Self {
        WarpError::Serialization(e.to_string())
    }
}

/// Errors raised while signing a transaction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("failed to serialize transaction for signing: {0}")]
    Serialization(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("signer address {signer} does not match transaction sender {sender}")]
    SenderMismatch { signer: String, sender: String },
}
