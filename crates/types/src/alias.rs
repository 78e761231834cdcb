use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum alias length accepted by the registry
pub const MAX_ALIAS_LEN: usize = 64;

/// A human readable name bound to a transaction hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasRecord {
    pub alias: String,
    pub transaction_hash: String,
    pub registered_at: DateTime<Utc>,
}

/// Whether a string is a syntactically valid alias
pub fn is_valid_alias(alias: &str) -> bool {
    !alias.is_empty()
        && alias.len() <= MAX_ALIAS_LEN
        && alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_syntax() {
        assert!(is_valid_alias("my-stake_2"));
        assert!(!is_valid_alias(""));
        assert!(!is_valid_alias("has space"));
        assert!(!is_valid_alias("slash/alias"));
        assert!(!is_valid_alias(&"a".repeat(65)));
    }
}
