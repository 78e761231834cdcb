//! Core configuration structures for the Warp pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Network environment and logging
    #[serde(default)]
    pub network: NetworkConfig,

    /// MultiversX API and transaction defaults
    #[serde(default)]
    pub chain: ChainConfig,

    /// Signing key source
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Link bases, publishing mode and resolver tables
    #[serde(default)]
    pub warp: WarpConfig,

    /// Alias registry contract
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Nonce fetch and submission retry limits
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Network environment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (devnet, testnet, mainnet)
    #[serde(default)]
    pub environment: Environment,

    /// Log filter directive, e.g. `info` or `info,warp_intents=debug`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format (pretty, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Enable metrics collection
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Run against the in-process ledger instead of the network
    #[serde(default)]
    pub mock_mode: bool,
}

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Devnet,
    Testnet,
    Mainnet,
}

/// MultiversX API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Chain identifier (`D` devnet, `T` testnet, `1` mainnet)
    #[serde(default = "default_chain_id")]
    pub chain_id: String,

    /// Gas price in atomic units
    #[serde(default = "default_gas_price")]
    pub gas_price: u64,

    /// Replaces every template or estimated gas limit when set
    #[serde(default)]
    pub gas_override: Option<u64>,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Where the signing key comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Environment variable holding the hex secret key
    #[serde(default = "default_secret_key_env")]
    pub secret_key_env: String,

    /// File holding the hex secret key; takes precedence over the variable
    #[serde(default)]
    pub secret_key_file: Option<PathBuf>,
}

/// How warps are published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    #[default]
    Inscribe,
    Execute,
}

/// Warp publishing and link configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarpConfig {
    /// Base URL of shareable warp links
    #[serde(default = "default_warp_base_url")]
    pub base_url: String,

    /// Base URL of the block explorer
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    /// QR image service endpoint
    #[serde(default = "default_qr_service_url")]
    pub qr_service_url: String,

    #[serde(default)]
    pub publish_mode: PublishMode,

    /// Maximum prompts per batch
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Creator recorded in warp metadata
    #[serde(default)]
    pub creator: Option<String>,

    /// Validator used when a staking prompt names none
    #[serde(default)]
    pub default_validator: Option<String>,

    /// Ticker (lower case) to token identifier; empty keeps the built-in table
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,

    /// Ticker to token decimals; every configured ticker needs an entry
    #[serde(default)]
    pub token_decimals: BTreeMap<String, u32>,
}

impl WarpConfig {
    /// Decimals keyed by token identifier, for the configured tickers
    pub fn decimals_by_identifier(&self) -> BTreeMap<String, u32> {
        self.tokens
            .iter()
            .filter_map(|(ticker, identifier)| {
                self.token_decimals
                    .get(ticker)
                    .map(|decimals| (identifier.clone(), *decimals))
            })
            .collect()
    }
}

/// Alias registry contract configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry contract address
    #[serde(default = "default_registry_address")]
    pub address: String,

    /// Registration fee in atomic units
    #[serde(default = "default_registration_fee")]
    pub registration_fee: String,

    #[serde(default = "default_registry_gas_limit")]
    pub gas_limit: u64,

    /// Pause between the warp transaction and the alias registration
    #[serde(default = "default_settle_wait_secs")]
    pub settle_wait_secs: u64,
}

/// Retry limits and linear backoff steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_nonce_fetch_attempts")]
    pub nonce_fetch_attempts: u32,

    #[serde(default = "default_nonce_fetch_step_secs")]
    pub nonce_fetch_step_secs: u64,

    #[serde(default = "default_submit_attempts")]
    pub submit_attempts: u32,

    #[serde(default = "default_nonce_conflict_step_secs")]
    pub nonce_conflict_step_secs: u64,

    #[serde(default = "default_transient_step_secs")]
    pub transient_step_secs: u64,
}

impl AppConfig {
    /// Public devnet defaults
    pub fn devnet() -> Self {
        Self::default()
    }

    /// Public mainnet endpoints
    ///
    /// The registry address has no mainnet default and must be configured.
    pub fn mainnet() -> Self {
        Self {
            network: NetworkConfig {
                environment: Environment::Mainnet,
                ..Default::default()
            },
            chain: ChainConfig {
                api_url: "https://api.multiversx.com".to_string(),
                chain_id: "1".to_string(),
                ..Default::default()
            },
            warp: WarpConfig {
                base_url: "https://usewarp.to".to_string(),
                explorer_url: "https://explorer.multiversx.com".to_string(),
                ..Default::default()
            },
            registry: RegistryConfig {
                address: String::new(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info,warp_intents=debug".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    "https://devnet-api.multiversx.com".to_string()
}

fn default_chain_id() -> String {
    "D".to_string()
}

fn default_gas_price() -> u64 {
    1_000_000_000
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_secret_key_env() -> String {
    "WARPGEN_SECRET_KEY".to_string()
}

fn default_warp_base_url() -> String {
    "https://devnet.usewarp.to".to_string()
}

fn default_explorer_url() -> String {
    "https://devnet-explorer.multiversx.com".to_string()
}

fn default_qr_service_url() -> String {
    "https://api.qrserver.com/v1/create-qr-code/".to_string()
}

fn default_max_batch_size() -> usize {
    5
}

fn default_registry_address() -> String {
    "erd1qqqqqqqqqqqqqpgqje2f99vr6r7sk54thg03c9suzcvwr4nfl3tsfkdl36".to_string()
}

fn default_registration_fee() -> String {
    "20000000000000000".to_string() // 0.02 EGLD
}

fn default_registry_gas_limit() -> u64 {
    10_000_000
}

fn default_settle_wait_secs() -> u64 {
    5
}

fn default_nonce_fetch_attempts() -> u32 {
    3
}

fn default_nonce_fetch_step_secs() -> u64 {
    2
}

fn default_submit_attempts() -> u32 {
    5
}

fn default_nonce_conflict_step_secs() -> u64 {
    5
}

fn default_transient_step_secs() -> u64 {
    3
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Devnet,
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_enabled: default_true(),
            mock_mode: false,
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            chain_id: default_chain_id(),
            gas_price: default_gas_price(),
            gas_override: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            secret_key_env: default_secret_key_env(),
            secret_key_file: None,
        }
    }
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            base_url: default_warp_base_url(),
            explorer_url: default_explorer_url(),
            qr_service_url: default_qr_service_url(),
            publish_mode: PublishMode::Inscribe,
            max_batch_size: default_max_batch_size(),
            creator: None,
            default_validator: None,
            tokens: BTreeMap::new(),
            token_decimals: BTreeMap::new(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            address: default_registry_address(),
            registration_fee: default_registration_fee(),
            gas_limit: default_registry_gas_limit(),
            settle_wait_secs: default_settle_wait_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            nonce_fetch_attempts: default_nonce_fetch_attempts(),
            nonce_fetch_step_secs: default_nonce_fetch_step_secs(),
            submit_attempts: default_submit_attempts(),
            nonce_conflict_step_secs: default_nonce_conflict_step_secs(),
            transient_step_secs: default_transient_step_secs(),
        }
    }
}
