//! Configuration loading from multiple sources

use crate::{AppConfig, ConfigError, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Prefix of environment overrides, e.g. `WARP_INTENTS_CHAIN__API_URL`
pub const ENV_PREFIX: &str = "WARP_INTENTS";

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// Supports TOML, YAML, and JSON formats based on file extension
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading config file");

        match extension {
            "toml" => Self::from_toml(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}",
                extension
            ))),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<AppConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<AppConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<AppConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Defaults overlaid with `WARP_INTENTS_*` environment variables
    pub fn from_env() -> Result<AppConfig> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Defaults overlaid with environment variables under a custom prefix
    ///
    /// Variables take the form `PREFIX_SECTION__KEY`; the double underscore
    /// separates nesting levels so keys may contain single underscores.
    /// For example: `WARP_INTENTS_NETWORK__MOCK_MODE=true`
    pub fn from_env_with_prefix(prefix: &str) -> Result<AppConfig> {
        Self::builder().add_env(prefix).build()
    }

    /// File values with environment overrides on top
    ///
    /// A variable only replaces the key it names; the rest of the file stays.
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<AppConfig> {
        if !path.exists() {
            return Err(ConfigError::LoadError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::builder().add_file(path, true).add_env(env_prefix).build()
    }

    /// The config file if given, then `WARP_INTENTS_*` variables
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        match path {
            Some(path) => Self::from_file_with_env(path, ENV_PREFIX),
            None => Self::from_env(),
        }
    }

    /// Build configuration using the config crate's builder pattern
    ///
    /// This allows for more complex configuration scenarios with multiple sources
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
        }
    }
}

/// Builder for complex configuration loading scenarios
pub struct ConfigLoaderBuilder {
    builder: ConfigBuilder<config::builder::DefaultState>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self.builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        self
    }

    /// Set a default value for a key
    pub fn set_default(mut self, key: &str, value: &str) -> Result<Self> {
        self.builder = self.builder.set_default(key, value)?;
        Ok(self)
    }

    /// Build the final configuration
    pub fn build(self) -> Result<AppConfig> {
        let config = self.builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Environment as NetworkEnvironment, PublishMode};
    use std::io::Write;

    #[test]
    fn test_load_from_toml() {
        let toml = r#"
            [network]
            environment = "testnet"
            log_level = "debug"
            mock_mode = true

            [chain]
            api_url = "https://testnet-api.multiversx.com"
            chain_id = "T"

            [warp]
            publish_mode = "execute"
            tokens = { usdc = "USDC-350c4e" }

            [retry]
            submit_attempts = 3
        "#;

        let config = ConfigLoader::from_toml(toml).unwrap();
        assert_eq!(config.network.environment, NetworkEnvironment::Testnet);
        assert!(config.network.mock_mode);
        assert_eq!(config.chain.chain_id, "T");
        assert_eq!(config.warp.publish_mode, PublishMode::Execute);
        assert_eq!(config.warp.tokens["usdc"], "USDC-350c4e");
        assert_eq!(config.retry.submit_attempts, 3);
        // untouched keys keep their defaults
        assert_eq!(config.retry.nonce_fetch_attempts, 3);
        assert_eq!(config.chain.timeout_secs, 15);
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
network:
  environment: mainnet
  log_format: json

registry:
  address: "erd1qqqqqqqqqqqqqpgqje2f99vr6r7sk54thg03c9suzcvwr4nfl3tsfkdl36"
  settle_wait_secs: 0
        "#;

        let config = ConfigLoader::from_yaml(yaml).unwrap();
        assert_eq!(config.network.environment, NetworkEnvironment::Mainnet);
        assert_eq!(config.network.log_format, "json");
        assert_eq!(config.registry.settle_wait_secs, 0);
        assert_eq!(config.registry.gas_limit, 10_000_000);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"
{
  "chain": { "gas_override": 20000000 },
  "warp": { "max_batch_size": 2, "creator": "erd1creator" }
}
        "#;

        let config = ConfigLoader::from_json(json).unwrap();
        assert_eq!(config.chain.gas_override, Some(20_000_000));
        assert_eq!(config.warp.max_batch_size, 2);
        assert_eq!(config.warp.creator.as_deref(), Some("erd1creator"));
    }

    #[test]
    fn test_unknown_environment_rejected() {
        let toml = r#"
            [network]
            environment = "staging"
        "#;
        assert!(matches!(
            ConfigLoader::from_toml(toml),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let toml = r#"
[network]
log_level = "debug"

[warp]
base_url = "https://usewarp.to"
        "#;

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config = ConfigLoader::from_file(file.path()).unwrap();
        assert_eq!(config.network.log_level, "debug");
        assert_eq!(config.warp.base_url, "https://usewarp.to");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new()
            .suffix(".ini")
            .tempfile()
            .unwrap();
        assert!(matches!(
            ConfigLoader::from_file(file.path()),
            Err(ConfigError::LoadError(_))
        ));
    }

    #[test]
    fn test_builder_set_default() {
        let config = ConfigLoader::builder()
            .set_default("chain.chain_id", "T")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.chain.chain_id, "T");
        assert_eq!(config.chain.gas_price, 1_000_000_000);
    }
}
