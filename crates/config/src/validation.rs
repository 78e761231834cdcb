//! Configuration validation

use crate::{AppConfig, ConfigError, Result};
use warp_intents_types::Address;

/// Largest batch the pipeline accepts
pub const MAX_BATCH_LIMIT: usize = 5;

/// Most decimals an ESDT may declare
pub const MAX_TOKEN_DECIMALS: u32 = 18;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
///
/// Every offending field is reported, joined with `; `.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let errors = collect_errors(config);

    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// All field errors of a configuration, in section order
pub fn collect_errors(config: &AppConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // Validate network config
    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    if !matches!(
        config.network.log_format.to_lowercase().as_str(),
        "pretty" | "text" | "json"
    ) {
        errors.push(ValidationError::new(
            "network.log_format",
            format!(
                "unknown log format '{}', must be pretty or json",
                config.network.log_format
            ),
        ));
    }

    // Validate chain config
    if let Err(e) = validate_url(&config.chain.api_url) {
        errors.push(ValidationError::new("chain.api_url", e));
    }

    if config.chain.chain_id.is_empty() {
        errors.push(ValidationError::new("chain.chain_id", "chain ID is required"));
    }

    if config.chain.gas_price == 0 {
        errors.push(ValidationError::new(
            "chain.gas_price",
            "must be greater than 0",
        ));
    }

    if config.chain.gas_override == Some(0) {
        errors.push(ValidationError::new(
            "chain.gas_override",
            "must be greater than 0 when set",
        ));
    }

    if config.chain.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "chain.timeout_secs",
            "must be greater than 0",
        ));
    }

    // Validate wallet config
    if config.wallet.secret_key_file.is_none() && config.wallet.secret_key_env.is_empty() {
        errors.push(ValidationError::new(
            "wallet.secret_key_env",
            "either a key file or an environment variable is required",
        ));
    }

    // Validate warp config
    for (field, value) in [
        ("warp.base_url", &config.warp.base_url),
        ("warp.explorer_url", &config.warp.explorer_url),
        ("warp.qr_service_url", &config.warp.qr_service_url),
    ] {
        if let Err(e) = validate_url(value) {
            errors.push(ValidationError::new(field, e));
        }
    }

    if config.warp.max_batch_size == 0 || config.warp.max_batch_size > MAX_BATCH_LIMIT {
        errors.push(ValidationError::new(
            "warp.max_batch_size",
            format!("must be between 1 and {MAX_BATCH_LIMIT}"),
        ));
    }

    if let Some(validator) = &config.warp.default_validator {
        if let Err(e) = validate_address(validator) {
            errors.push(ValidationError::new("warp.default_validator", e));
        }
    }

    for (ticker, token_id) in &config.warp.tokens {
        if ticker.is_empty() || token_id.is_empty() {
            errors.push(ValidationError::new(
                format!("warp.tokens.{ticker}"),
                "ticker and token identifier are required",
            ));
        }
        let field = format!("warp.token_decimals.{ticker}");
        match config.warp.token_decimals.get(ticker) {
            None => errors.push(ValidationError::new(
                field,
                "decimals are required for every configured token",
            )),
            Some(decimals) if *decimals > MAX_TOKEN_DECIMALS => errors.push(
                ValidationError::new(field, format!("must be at most {MAX_TOKEN_DECIMALS}")),
            ),
            Some(_) => {}
        }
    }

    // Validate registry config
    if config.registry.address.is_empty() {
        errors.push(ValidationError::new(
            "registry.address",
            "registry contract address is required",
        ));
    } else if let Err(e) = validate_address(&config.registry.address) {
        errors.push(ValidationError::new("registry.address", e));
    }

    if config.registry.registration_fee.is_empty()
        || !config
            .registry
            .registration_fee
            .chars()
            .all(|c| c.is_ascii_digit())
    {
        errors.push(ValidationError::new(
            "registry.registration_fee",
            "must be an integer amount in atomic units",
        ));
    }

    if config.registry.gas_limit == 0 {
        errors.push(ValidationError::new(
            "registry.gas_limit",
            "must be greater than 0",
        ));
    }

    // Validate retry config
    for (field, value) in [
        ("retry.nonce_fetch_attempts", config.retry.nonce_fetch_attempts),
        ("retry.submit_attempts", config.retry.submit_attempts),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be at least 1"));
        }
    }

    errors
}

/// Validate an HTTP(S) URL
pub fn validate_url(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    let parsed = url::Url::parse(value).map_err(|e| format!("invalid URL '{value}': {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("URL scheme must be http or https, got '{other}'")),
    }
}

/// Validate a bech32 account or contract address
pub fn validate_address(value: &str) -> std::result::Result<(), String> {
    Address::from_bech32(value)
        .map(|_| ())
        .map_err(|e| format!("invalid address '{value}': {e}"))
}

/// Validate every directive of a log filter
fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    let invalid = || {
        ValidationError::new(
            "network.log_level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )
    };

    if level.trim().is_empty() {
        return Err(invalid());
    }

    for directive in level.split(',') {
        let severity = directive
            .rsplit_once('=')
            .map(|(_, s)| s)
            .unwrap_or(directive);
        if !matches!(
            severity.trim().to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error" | "off"
        ) {
            return Err(invalid());
        }
    }
    Ok(())
}
