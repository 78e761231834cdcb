use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use warp_intents_types::{UnsignedTransaction, DEFAULT_CHAIN_ID, DEFAULT_GAS_PRICE};

use crate::{ChainApi, ChainError, VmQuery};

/// Devnet Warp registry contract
pub const DEFAULT_REGISTRY_ADDRESS: &str =
    "erd1qqqqqqqqqqqqqpgqje2f99vr6r7sk54thg03c9suzcvwr4nfl3tsfkdl36";

/// 0.02 EGLD, in atomic units
pub const REGISTRATION_FEE: &str = "20000000000000000";

pub const REGISTRY_GAS_LIMIT: u64 = 10_000_000;

pub const REGISTER_FUNCTION: &str = "registerWarp";
pub const UNREGISTER_FUNCTION: &str = "unregisterWarp";
pub const RESOLVE_FUNCTION: &str = "resolveAlias";

/// Call shapes of the on-chain alias registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryContract {
    pub address: String,
    pub registration_fee: String,
    pub gas_limit: u64,
    pub chain_id: String,
    pub gas_price: u64,
}

impl Default for RegistryContract {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_ADDRESS)
    }
}

impl RegistryContract {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            registration_fee: REGISTRATION_FEE.to_string(),
            gas_limit: REGISTRY_GAS_LIMIT,
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            gas_price: DEFAULT_GAS_PRICE,
        }
    }

    pub fn with_fee(mut self, fee: impl Into<String>) -> Self {
        self.registration_fee = fee.into();
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Chain the registry transactions are signed for
    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = chain_id.into();
        self
    }

    pub fn with_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = gas_price;
        self
    }

    fn transaction(&self, sender: &str) -> UnsignedTransaction {
        UnsignedTransaction::new(sender, self.address.clone())
            .with_chain_id(self.chain_id.clone())
            .with_gas_price(self.gas_price)
            .with_gas_limit(self.gas_limit)
    }

    /// `registerWarp@<hash>@<hex alias>`
    ///
    /// The hash is already hex and goes in as is.
    pub fn register_transaction(
        &self,
        sender: &str,
        warp_hash: &str,
        alias: &str,
    ) -> UnsignedTransaction {
        let payload = format!(
            "{REGISTER_FUNCTION}@{}@{}",
            warp_hash,
            hex::encode(alias.as_bytes())
        );
        self.transaction(sender)
            .with_value(self.registration_fee.clone())
            .with_payload(payload)
    }

    /// `unregisterWarp@<hex alias>`
    pub fn unregister_transaction(&self, sender: &str, alias: &str) -> UnsignedTransaction {
        let payload = format!("{UNREGISTER_FUNCTION}@{}", hex::encode(alias.as_bytes()));
        self.transaction(sender).with_payload(payload)
    }

    pub fn resolve_query(&self, alias: &str) -> VmQuery {
        VmQuery::new(self.address.clone(), RESOLVE_FUNCTION).with_arg(hex::encode(alias.as_bytes()))
    }
}

/// Lookup of alias bindings
#[async_trait]
pub trait AliasRegistry: Send + Sync {
    /// Hash bound to `alias`, if any
    async fn resolve_alias(&self, alias: &str) -> Result<Option<String>, ChainError>;
}

/// [`AliasRegistry`] backed by queries against the registry contract
pub struct ContractAliasRegistry {
    api: Arc<dyn ChainApi>,
    contract: RegistryContract,
}

impl ContractAliasRegistry {
    pub fn new(api: Arc<dyn ChainApi>, contract: RegistryContract) -> Self {
        Self { api, contract }
    }

    pub fn contract(&self) -> &RegistryContract {
        &self.contract
    }
}

#[async_trait]
impl AliasRegistry for ContractAliasRegistry {
    async fn resolve_alias(&self, alias: &str) -> Result<Option<String>, ChainError> {
        let parts = self.api.query(&self.contract.resolve_query(alias)).await?;
        let hash = parts
            .into_iter()
            .next()
            .filter(|part| !part.is_empty())
            .map(hex::encode);
        debug!(alias, found = hash.is_some(), "resolved alias");
        Ok(hash)
    }
}
