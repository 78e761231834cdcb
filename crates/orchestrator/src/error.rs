use std::fmt;

use serde::Serialize;
use thiserror::Error;
use warp_intents_assembler::AssemblyError;
use warp_intents_chain::ChainError;
use warp_intents_compiler::CompileError;
use warp_intents_resolver::ResolveError;
use warp_intents_types::SignerError;

use crate::submission::AttemptRecord;

/// Terminal failures of the submission state machine
#[derive(Debug, Clone, Error)]
pub enum SubmissionError {
    #[error("could not fetch account nonce after {attempts} attempts: {last_error}")]
    NonceFetchFailed { attempts: u32, last_error: ChainError },

    #[error("signing failed: {0}")]
    SigningFailed(#[from] SignerError),

    #[error("insufficient funds: {message}")]
    InsufficientFunds { message: String },

    #[error("submission failed after {} attempts: {last_error}", .attempts.len())]
    SubmissionFailed {
        attempts: Vec<AttemptRecord>,
        last_error: ChainError,
    },
}

/// Failures of alias registration and lookup
#[derive(Debug, Clone, Error)]
pub enum AliasError {
    #[error("invalid alias '{0}': use 1-64 letters, digits, '-' or '_'")]
    InvalidAlias(String),

    #[error("alias '{alias}' is already registered to {hash}")]
    AliasTaken { alias: String, hash: String },

    #[error("alias registration failed: {0}")]
    RegistrationFailed(#[source] SubmissionError),

    #[error("alias lookup failed: {0}")]
    Lookup(ChainError),
}

/// Stable, machine readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UnrecognizedIntent,
    UnsupportedIntent,
    MissingParameter,
    InvalidParameter,
    InvalidWarp,
    NonceFetchFailed,
    SigningFailed,
    InsufficientFunds,
    SubmissionFailed,
    AliasTaken,
    AliasRegistrationFailed,
    InvalidAlias,
    ChainQueryFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnrecognizedIntent => "UNRECOGNIZED_INTENT",
            ErrorCode::UnsupportedIntent => "UNSUPPORTED_INTENT",
            ErrorCode::MissingParameter => "MISSING_PARAMETER",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::InvalidWarp => "INVALID_WARP",
            ErrorCode::NonceFetchFailed => "NONCE_FETCH_FAILED",
            ErrorCode::SigningFailed => "SIGNING_FAILED",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::SubmissionFailed => "SUBMISSION_FAILED",
            ErrorCode::AliasTaken => "ALIAS_TAKEN",
            ErrorCode::AliasRegistrationFailed => "ALIAS_REGISTRATION_FAILED",
            ErrorCode::InvalidAlias => "INVALID_ALIAS",
            ErrorCode::ChainQueryFailed => "CHAIN_QUERY_FAILED",
        }
    }

    /// Remediation hints shown next to the error
    pub fn hints(&self) -> &'static [&'static str] {
        match self {
            ErrorCode::UnrecognizedIntent => &[
                "Mention the action explicitly, e.g. \"stake 1 EGLD\" or \"send 2 EGLD to erd1...\"",
                "Use `call <contract> <function> with <args>` for arbitrary contract calls",
            ],
            ErrorCode::UnsupportedIntent => &["Run `warpgen templates` to list supported intents"],
            ErrorCode::MissingParameter => &[
                "Include every required value in the prompt, e.g. the receiver address",
            ],
            ErrorCode::InvalidParameter => &[
                "Check amounts, addresses and token identifiers against the template's constraints",
            ],
            ErrorCode::InvalidWarp => &["The warp must have at least one valid action"],
            ErrorCode::NonceFetchFailed => &[
                "Check the chain API URL and network connectivity",
                "Retry once the API is reachable",
            ],
            ErrorCode::SigningFailed => &["Check that the wallet key matches the sender address"],
            ErrorCode::InsufficientFunds => &[
                "Fund the wallet; the transaction needs value plus gas",
                "Devnet funds are available from the MultiversX faucet",
            ],
            ErrorCode::SubmissionFailed => &[
                "The network rejected the transaction repeatedly; retry later",
            ],
            ErrorCode::AliasTaken => &["Choose a different alias"],
            ErrorCode::AliasRegistrationFailed => &[
                "The warp transaction succeeded; register the alias again later",
            ],
            ErrorCode::InvalidAlias => &["Aliases use 1-64 letters, digits, '-' or '_'"],
            ErrorCode::ChainQueryFailed => &["Check the chain API URL and the identifier"],
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure of a pipeline request
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Alias(#[from] AliasError),

    #[error("chain query failed: {0}")]
    ChainQuery(#[source] ChainError),

    #[error("batch holds {got} prompts, at most {max} are allowed")]
    BatchTooLarge { max: usize, got: usize },

    #[error("'{0}' is neither a registered alias nor a hash")]
    UnknownIdentifier(String),
}

impl PipelineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::Resolve(_) => ErrorCode::UnrecognizedIntent,
            PipelineError::Compile(e) => match e {
                CompileError::UnsupportedIntent(_) => ErrorCode::UnsupportedIntent,
                CompileError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
                CompileError::InvalidWarp(_) | CompileError::Catalog(_) => ErrorCode::InvalidWarp,
            },
            PipelineError::Assembly(e) => match e {
                AssemblyError::MissingParameter { .. } | AssemblyError::MissingReceiver { .. } => {
                    ErrorCode::MissingParameter
                }
                AssemblyError::DuplicatePosition { .. }
                | AssemblyError::InvalidWarp(_)
                | AssemblyError::Serialization(_) => ErrorCode::InvalidWarp,
                AssemblyError::Encoding { .. }
                | AssemblyError::InvalidAddress { .. }
                | AssemblyError::ValueWithTokenTransfer { .. } => ErrorCode::InvalidParameter,
            },
            PipelineError::Submission(e) => submission_code(e),
            PipelineError::Alias(e) => match e {
                AliasError::InvalidAlias(_) => ErrorCode::InvalidAlias,
                AliasError::AliasTaken { .. } => ErrorCode::AliasTaken,
                AliasError::RegistrationFailed(_) => ErrorCode::AliasRegistrationFailed,
                AliasError::Lookup(_) => ErrorCode::ChainQueryFailed,
            },
            PipelineError::ChainQuery(_) | PipelineError::UnknownIdentifier(_) => {
                ErrorCode::ChainQueryFailed
            }
            PipelineError::BatchTooLarge { .. } => ErrorCode::InvalidParameter,
        }
    }

    pub fn hints(&self) -> &'static [&'static str] {
        self.code().hints()
    }

    /// Whether the failure happened before anything was sent to the network
    pub fn is_pre_network(&self) -> bool {
        matches!(
            self,
            PipelineError::Resolve(_)
                | PipelineError::Compile(_)
                | PipelineError::Assembly(_)
                | PipelineError::BatchTooLarge { .. }
        ) || matches!(self, PipelineError::Alias(AliasError::InvalidAlias(_)))
    }
}

pub(crate) fn submission_code(err: &SubmissionError) -> ErrorCode {
    match err {
        SubmissionError::NonceFetchFailed { .. } => ErrorCode::NonceFetchFailed,
        SubmissionError::SigningFailed(_) => ErrorCode::SigningFailed,
        SubmissionError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
        SubmissionError::SubmissionFailed { .. } => ErrorCode::SubmissionFailed,
    }
}

/// Serializable view of a [`PipelineError`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    pub hints: Vec<String>,
}

impl From<&PipelineError> for ErrorReport {
    fn from(err: &PipelineError) -> Self {
        let code = err.code();
        Self {
            code,
            message: err.to_string(),
            hints: code.hints().iter().map(|h| h.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::AliasRegistrationFailed).unwrap();
        assert_eq!(json, "\"ALIAS_REGISTRATION_FAILED\"");
        assert_eq!(
            ErrorCode::AliasRegistrationFailed.as_str(),
            "ALIAS_REGISTRATION_FAILED"
        );
    }

    #[test]
    fn test_every_code_has_hints() {
        let codes = [
            ErrorCode::UnrecognizedIntent,
            ErrorCode::UnsupportedIntent,
            ErrorCode::MissingParameter,
            ErrorCode::InvalidParameter,
            ErrorCode::InvalidWarp,
            ErrorCode::NonceFetchFailed,
            ErrorCode::SigningFailed,
            ErrorCode::InsufficientFunds,
            ErrorCode::SubmissionFailed,
            ErrorCode::AliasTaken,
            ErrorCode::AliasRegistrationFailed,
            ErrorCode::InvalidAlias,
            ErrorCode::ChainQueryFailed,
        ];
        for code in codes {
            assert!(!code.hints().is_empty(), "{code} has no hints");
        }
    }

    #[test]
    fn test_pipeline_error_mapping() {
        let err = PipelineError::from(AssemblyError::MissingParameter {
            action: "Send".to_string(),
            input: "Receiver".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::MissingParameter);
        assert!(err.is_pre_network());

        let err = PipelineError::from(SubmissionError::InsufficientFunds {
            message: "insufficient funds".to_string(),
        });
        assert_eq!(err.code(), ErrorCode::InsufficientFunds);
        assert!(!err.is_pre_network());

        let report = ErrorReport::from(&PipelineError::from(CompileError::UnsupportedIntent(
            "swap".to_string(),
        )));
        assert_eq!(report.code, ErrorCode::UnsupportedIntent);
        assert!(report.message.contains("swap"));
    }
}
