use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warp_intents_types::SignedTransaction;

use crate::ChainError;

/// Read and write access to a MultiversX network
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Current account nonce
    async fn get_nonce(&self, address: &str) -> Result<u64, ChainError>;

    /// Broadcast a signed transaction, returning its hash
    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<String, ChainError>;

    async fn get_transaction(&self, hash: &str) -> Result<TransactionInfo, ChainError>;

    /// Read-only contract call; returns the raw return data parts
    async fn query(&self, query: &VmQuery) -> Result<Vec<Vec<u8>>, ChainError>;
}

/// What the network knows about a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    #[serde(rename = "txHash")]
    pub hash: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub value: String,
    /// Unix seconds
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Base64 payload
    #[serde(default)]
    pub data: Option<String>,
}

impl TransactionInfo {
    pub fn is_success(&self) -> bool {
        matches!(self.status.as_str(), "success" | "executed")
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_str(), "fail" | "invalid")
    }
}

/// A read-only contract query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VmQuery {
    pub sc_address: String,
    pub func_name: String,
    /// Hex-encoded arguments
    pub args: Vec<String>,
}

impl VmQuery {
    pub fn new(sc_address: impl Into<String>, func_name: impl Into<String>) -> Self {
        Self {
            sc_address: sc_address.into(),
            func_name: func_name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, hex_arg: impl Into<String>) -> Self {
        self.args.push(hex_arg.into());
        self
    }
}
