//! Chain access for the Warp pipeline
//!
//! - [`ChainApi`]: nonce lookup, broadcast, transaction status, contract queries
//! - [`HttpChainApi`]: the public MultiversX REST API
//! - [`InMemoryLedger`]: scripted in-process network for tests and mock mode
//! - [`Ed25519Wallet`]: signer for account transactions
//! - [`AliasRegistry`]: alias lookups against the registry contract

pub mod api;
pub mod error;
pub mod http;
pub mod ledger;
pub mod registry;
pub mod wallet;

pub use api::{ChainApi, TransactionInfo, VmQuery};
pub use error::ChainError;
pub use http::{HttpChainApi, DEFAULT_TIMEOUT};
pub use ledger::{InMemoryLedger, LedgerTransaction};
pub use registry::{
    AliasRegistry, ContractAliasRegistry, RegistryContract, DEFAULT_REGISTRY_ADDRESS,
    REGISTRATION_FEE, REGISTRY_GAS_LIMIT,
};
pub use wallet::Ed25519Wallet;
