use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/// A fungible or semi-fungible token payment bound to an `esdt` input
///
/// Written as `IDENT|amount` or `IDENT|nonce|amount`. The amount stays in
/// human units until the input's scale is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsdtPayment {
    pub token: String,
    pub nonce: u64,
    pub amount: String,
}

impl EsdtPayment {
    pub fn new(token: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            nonce: 0,
            amount: amount.into(),
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn is_fungible(&self) -> bool {
        self.nonce == 0
    }
}

impl FromStr for EsdtPayment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseError::MalformedEsdt(s.to_string());
        let parts: Vec<&str> = s.split('|').map(str::trim).collect();
        let (token, nonce, amount) = match parts.as_slice() {
            [token, amount] => (*token, 0, *amount),
            [token, nonce, amount] => (*token, nonce.parse().map_err(|_| malformed())?, *amount),
            _ => return Err(malformed()),
        };
        if token.is_empty() || amount.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            token: token.to_string(),
            nonce,
            amount: amount.to_string(),
        })
    }
}

impl fmt::Display for EsdtPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nonce == 0 {
            write!(f, "{}|{}", self.token, self.amount)
        } else {
            write!(f, "{}|{}|{}", self.token, self.nonce, self.amount)
        }
    }
}
