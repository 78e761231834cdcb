use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;
use warp_intents_types::SignedTransaction;

use crate::registry::{
    DEFAULT_REGISTRY_ADDRESS, REGISTER_FUNCTION, RESOLVE_FUNCTION, UNREGISTER_FUNCTION,
};
use crate::{ChainApi, ChainError, TransactionInfo, VmQuery};

/// A transaction the ledger accepted
#[derive(Debug, Clone)]
pub struct LedgerTransaction {
    pub hash: String,
    pub tx: SignedTransaction,
    pub status: String,
    pub timestamp: i64,
}

#[derive(Debug)]
struct AliasBinding {
    hash: String,
    owner: String,
}

#[derive(Debug, Default)]
struct LedgerState {
    nonces: HashMap<String, u64>,
    transactions: HashMap<String, LedgerTransaction>,
    order: Vec<String>,
    aliases: HashMap<String, AliasBinding>,
    nonce_failures: VecDeque<ChainError>,
    send_failures: VecDeque<ChainError>,
    nonce_fetches: u32,
    send_attempts: u32,
}

/// In-process stand-in for the network
///
/// Tracks account nonces, executes calls to the alias registry with
/// first-registration-wins semantics and can be scripted to fail the next
/// few nonce fetches or submissions. Used by tests and by mock mode.
#[derive(Debug)]
pub struct InMemoryLedger {
    registry_address: String,
    state: Mutex<LedgerState>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_registry(DEFAULT_REGISTRY_ADDRESS)
    }

    pub fn with_registry(registry_address: impl Into<String>) -> Self {
        Self {
            registry_address: registry_address.into(),
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub async fn set_nonce(&self, address: &str, nonce: u64) {
        self.state.lock().await.nonces.insert(address.to_string(), nonce);
    }

    /// Fail the next nonce fetches with these errors, in order
    pub async fn fail_nonce_fetches(&self, errors: impl IntoIterator<Item = ChainError>) {
        self.state.lock().await.nonce_failures.extend(errors);
    }

    /// Fail the next submissions with these errors, in order
    pub async fn fail_sends(&self, errors: impl IntoIterator<Item = ChainError>) {
        self.state.lock().await.send_failures.extend(errors);
    }

    pub async fn nonce_fetches(&self) -> u32 {
        self.state.lock().await.nonce_fetches
    }

    pub async fn send_attempts(&self) -> u32 {
        self.state.lock().await.send_attempts
    }

    /// Accepted transactions in submission order
    pub async fn transactions(&self) -> Vec<LedgerTransaction> {
        let state = self.state.lock().await;
        state
            .order
            .iter()
            .filter_map(|hash| state.transactions.get(hash).cloned())
            .collect()
    }

    pub async fn alias(&self, alias: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .aliases
            .get(alias)
            .map(|binding| binding.hash.clone())
    }

    /// Bind an alias directly, bypassing the registry contract
    pub async fn seed_alias(&self, alias: &str, hash: &str, owner: &str) {
        self.state.lock().await.aliases.insert(
            alias.to_string(),
            AliasBinding {
                hash: hash.to_string(),
                owner: owner.to_string(),
            },
        );
    }

    fn execute(&self, state: &mut LedgerState, tx: &SignedTransaction) -> &'static str {
        if tx.receiver() != self.registry_address {
            return "success";
        }
        let payload = String::from_utf8_lossy(tx.payload()).into_owned();
        let mut parts = payload.split('@');
        let function = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (function, args.as_slice()) {
            (REGISTER_FUNCTION, [hash, alias_hex]) => {
                let Some(alias) = decode_alias(alias_hex) else {
                    return "fail";
                };
                if state.aliases.contains_key(&alias) {
                    debug!(%alias, "alias already registered");
                    return "fail";
                }
                state.aliases.insert(
                    alias,
                    AliasBinding {
                        hash: hash.to_string(),
                        owner: tx.sender().to_string(),
                    },
                );
                "success"
            }
            (UNREGISTER_FUNCTION, [alias_hex]) => {
                let Some(alias) = decode_alias(alias_hex) else {
                    return "fail";
                };
                match state.aliases.get(&alias) {
                    Some(binding) if binding.owner == tx.sender() => {
                        state.aliases.remove(&alias);
                        "success"
                    }
                    _ => "fail",
                }
            }
            _ => "fail",
        }
    }
}

fn decode_alias(alias_hex: &str) -> Option<String> {
    hex::decode(alias_hex)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[async_trait]
impl ChainApi for InMemoryLedger {
    async fn get_nonce(&self, address: &str) -> Result<u64, ChainError> {
        let mut state = self.state.lock().await;
        state.nonce_fetches += 1;
        if let Some(err) = state.nonce_failures.pop_front() {
            return Err(err);
        }
        Ok(state.nonces.get(address).copied().unwrap_or_default())
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<String, ChainError> {
        let mut state = self.state.lock().await;
        state.send_attempts += 1;
        if let Some(err) = state.send_failures.pop_front() {
            return Err(err);
        }

        let expected = state.nonces.get(tx.sender()).copied().unwrap_or_default();
        if tx.nonce() < expected {
            return Err(ChainError::Rejected {
                status: 400,
                message: "transaction generation failed: lowerNonceInTx: true".to_string(),
            });
        }
        if tx.nonce() > expected {
            return Err(ChainError::Rejected {
                status: 400,
                message: "transaction generation failed: higherNonceInTx: true".to_string(),
            });
        }
        state.nonces.insert(tx.sender().to_string(), expected + 1);

        let body = serde_json::to_vec(tx).map_err(|e| ChainError::Decode(e.to_string()))?;
        let hash = hex::encode(Sha256::digest(&body));
        let status = self.execute(&mut state, tx);

        debug!(tx_hash = %hash, nonce = tx.nonce(), status, "ledger accepted transaction");
        state.order.push(hash.clone());
        state.transactions.insert(
            hash.clone(),
            LedgerTransaction {
                hash: hash.clone(),
                tx: tx.clone(),
                status: status.to_string(),
                timestamp: unix_now(),
            },
        );
        Ok(hash)
    }

    async fn get_transaction(&self, hash: &str) -> Result<TransactionInfo, ChainError> {
        let state = self.state.lock().await;
        let record = state
            .transactions
            .get(hash)
            .ok_or_else(|| ChainError::NotFound(hash.to_string()))?;
        let tx = &record.tx;
        Ok(TransactionInfo {
            hash: record.hash.clone(),
            status: record.status.clone(),
            sender: tx.sender().to_string(),
            receiver: tx.receiver().to_string(),
            value: tx.value().to_string(),
            timestamp: Some(record.timestamp),
            data: (!tx.payload().is_empty()).then(|| BASE64.encode(tx.payload())),
        })
    }

    async fn query(&self, query: &VmQuery) -> Result<Vec<Vec<u8>>, ChainError> {
        if query.sc_address != self.registry_address || query.func_name != RESOLVE_FUNCTION {
            return Err(ChainError::Rejected {
                status: 200,
                message: format!("invalid function {}", query.func_name),
            });
        }
        let alias = query
            .args
            .first()
            .and_then(|arg| decode_alias(arg))
            .ok_or_else(|| ChainError::Decode("resolveAlias needs one hex argument".to_string()))?;

        let state = self.state.lock().await;
        match state.aliases.get(&alias) {
            Some(binding) => {
                let hash = hex::decode(&binding.hash)
                    .map_err(|e| ChainError::Decode(format!("stored hash: {e}")))?;
                Ok(vec![hash])
            }
            None => Ok(Vec::new()),
        }
    }
}
