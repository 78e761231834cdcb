use thiserror::Error;
use warp_intents_retry::FailureClass;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by network ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("wallet error: {0}")]
    Wallet(String),
}

impl ChainError {
    /// Whether the failure came from the network path rather than the request
    ///
    /// Timeouts, connection failures and 5xx answers qualify. A 4xx rejection
    /// or a missing account will fail the same way on every attempt.
    pub fn is_network_error(&self) -> bool {
        match self {
            ChainError::Timeout(_) | ChainError::Transport(_) => true,
            ChainError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Map the error onto the retry policy's failure classes
    ///
    /// The network reports nonce and balance problems only through its
    /// error text, so classification is by message.
    pub fn class(&self) -> FailureClass {
        let message = match self {
            ChainError::Rejected { message, .. } => message.to_lowercase(),
            ChainError::Transport(message) => message.to_lowercase(),
            _ => return FailureClass::Transient,
        };
        if message.contains("insufficient funds") {
            FailureClass::InsufficientFunds
        } else if message.contains("lowernonceintx") || message.contains("nonce") {
            FailureClass::NonceConflict
        } else {
            FailureClass::Transient
        }
    }
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChainError::Timeout(err.to_string())
        } else if err.is_decode() {
            ChainError::Decode(err.to_string())
        } else {
            ChainError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(message: &str) -> ChainError {
        ChainError::Rejected {
            status: 400,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_network_errors() {
        assert!(ChainError::Timeout("slow".to_string()).is_network_error());
        assert!(ChainError::Transport("connection reset".to_string()).is_network_error());
        assert!(ChainError::Rejected {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_network_error());
        assert!(!rejected("invalid address").is_network_error());
        assert!(!ChainError::NotFound("account".to_string()).is_network_error());
        assert!(!ChainError::Decode("bad json".to_string()).is_network_error());
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            rejected("transaction generation failed: lowerNonceInTx: true").class(),
            FailureClass::NonceConflict
        );
        assert_eq!(
            rejected("invalid nonce").class(),
            FailureClass::NonceConflict
        );
        assert_eq!(
            rejected("insufficient funds for address erd1...").class(),
            FailureClass::InsufficientFunds
        );
        assert_eq!(rejected("internal issue").class(), FailureClass::Transient);
        assert_eq!(
            ChainError::Timeout("15s".to_string()).class(),
            FailureClass::Transient
        );
    }

    #[test]
    fn test_funds_win_over_nonce_wording() {
        assert_eq!(
            rejected("insufficient funds to cover tx with nonce 4").class(),
            FailureClass::InsufficientFunds
        );
    }
}
