//! Builds a ready-to-run [`WarpPipeline`] from an [`AppConfig`]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use warp_intents_assembler::TransactionAssembler;
use warp_intents_catalog::{CatalogError, TemplateCatalog};
use warp_intents_chain::{
    ChainApi, ChainError, ContractAliasRegistry, Ed25519Wallet, HttpChainApi, InMemoryLedger,
    RegistryContract,
};
use warp_intents_compiler::WarpCompiler;
use warp_intents_config::{validate_config, AppConfig, ConfigError, WalletConfig};
use warp_intents_metrics::{MetricsError, PipelineMetrics};
use warp_intents_orchestrator::{
    AliasRegistrar, BuilderError, LinkBuilder, PipelineConfig, PublishMode,
    SubmissionConfig, SubmissionOrchestrator, WarpPipeline,
};
use warp_intents_resolver::{IntentResolver, ResolveError, ResolverContext};
use warp_intents_retry::{RetryPolicy, SubmissionPolicy};
use warp_intents_types::TransactionSigner;

/// Seed of the throwaway key used in mock mode when no key is configured
const MOCK_SEED: [u8; 32] = [7u8; 32];

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    Builder(#[from] BuilderError),

    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything a command needs, wired from configuration
pub struct Runtime {
    pub pipeline: WarpPipeline,
    pub catalog: Arc<TemplateCatalog>,
    pub signer: Arc<dyn TransactionSigner>,
    pub metrics: Option<Arc<PipelineMetrics>>,
    /// Set in mock mode
    pub ledger: Option<Arc<InMemoryLedger>>,
}

impl Runtime {
    /// Validate `config` and wire the pipeline around `signer`
    pub fn from_config(
        config: &AppConfig,
        signer: Arc<dyn TransactionSigner>,
    ) -> Result<Self, AppError> {
        validate_config(config)?;

        let metrics = if config.network.metrics_enabled {
            Some(Arc::new(PipelineMetrics::new()?))
        } else {
            None
        };

        let (api, ledger): (Arc<dyn ChainApi>, Option<Arc<InMemoryLedger>>) =
            if config.network.mock_mode {
                info!("running against the in-memory ledger");
                let ledger = Arc::new(InMemoryLedger::with_registry(&config.registry.address));
                (ledger.clone(), Some(ledger))
            } else {
                let api = HttpChainApi::new(
                    &config.chain.api_url,
                    Duration::from_secs(config.chain.timeout_secs),
                )?;
                (Arc::new(api), None)
            };

        let catalog = Arc::new(TemplateCatalog::builtin()?);
        let resolver = IntentResolver::new()?.with_context(resolver_context(config)?);

        let mut compiler = WarpCompiler::new(catalog.clone());
        if let Some(creator) = &config.warp.creator {
            compiler = compiler.with_creator(creator.clone());
        }

        let assembler = TransactionAssembler::default()
            .with_chain_id(config.chain.chain_id.clone())
            .with_gas_price(config.chain.gas_price)
            .with_token_decimals(config.warp.decimals_by_identifier());

        let mut orchestrator =
            SubmissionOrchestrator::new(api.clone()).with_config(submission_config(config));
        if let Some(metrics) = &metrics {
            orchestrator = orchestrator.with_metrics(metrics.clone());
        }
        let orchestrator = Arc::new(orchestrator);

        let contract = RegistryContract::new(config.registry.address.clone())
            .with_fee(config.registry.registration_fee.clone())
            .with_gas_limit(config.registry.gas_limit)
            .with_chain_id(config.chain.chain_id.clone())
            .with_gas_price(config.chain.gas_price);

        let mut registrar = AliasRegistrar::new(
            Arc::new(ContractAliasRegistry::new(api, contract.clone())),
            contract,
            orchestrator.clone(),
        )
        .with_settle_wait(Duration::from_secs(config.registry.settle_wait_secs));
        if let Some(metrics) = &metrics {
            registrar = registrar.with_metrics(metrics.clone());
        }

        let links = LinkBuilder::new(config.warp.base_url.clone(), config.warp.explorer_url.clone())
            .with_qr_service(config.warp.qr_service_url.clone());

        let mut builder = WarpPipeline::builder()
            .with_resolver(Arc::new(resolver))
            .with_compiler(Arc::new(compiler))
            .with_assembler(Arc::new(assembler))
            .with_orchestrator(orchestrator)
            .with_registrar(Arc::new(registrar))
            .with_signer(signer.clone())
            .with_links(links)
            .with_config(PipelineConfig {
                publish_mode: match config.warp.publish_mode {
                    warp_intents_config::PublishMode::Inscribe => PublishMode::Inscribe,
                    warp_intents_config::PublishMode::Execute => PublishMode::Execute,
                },
                max_batch_size: config.warp.max_batch_size,
                gas_override: config.chain.gas_override,
            });
        if let Some(metrics) = &metrics {
            builder = builder.with_metrics(metrics.clone());
        }
        let pipeline = builder.build()?;

        info!(
            environment = ?config.network.environment,
            chain_id = %config.chain.chain_id,
            publish_mode = ?config.warp.publish_mode,
            sender = %signer.address(),
            templates = catalog.len(),
            "pipeline ready"
        );

        Ok(Self {
            pipeline,
            catalog,
            signer,
            metrics,
            ledger,
        })
    }

    /// Prometheus text exposition, when metrics are enabled
    pub fn render_metrics(&self) -> Result<Option<String>, AppError> {
        match &self.metrics {
            Some(metrics) => Ok(Some(metrics.gather()?)),
            None => Ok(None),
        }
    }
}

fn resolver_context(config: &AppConfig) -> Result<ResolverContext, ResolveError> {
    let context = if config.warp.tokens.is_empty() {
        ResolverContext::new()?
    } else {
        ResolverContext::with_tokens(config.warp.tokens.clone())?
    };
    Ok(match &config.warp.default_validator {
        Some(validator) => context.with_default_validator(validator.clone()),
        None => context,
    })
}

/// Retry limits and per-call timeout from the `[retry]` and `[chain]` sections
pub fn submission_config(config: &AppConfig) -> SubmissionConfig {
    let retry = &config.retry;
    SubmissionConfig {
        nonce_policy: RetryPolicy::new(
            retry.nonce_fetch_attempts,
            Duration::from_secs(retry.nonce_fetch_step_secs),
        ),
        submission_policy: SubmissionPolicy {
            max_attempts: retry.submit_attempts,
            nonce_conflict_step: Duration::from_secs(retry.nonce_conflict_step_secs),
            transient_step: Duration::from_secs(retry.transient_step_secs),
        },
        call_timeout: Duration::from_secs(config.chain.timeout_secs),
    }
}

/// Signing key from the configured file, else the configured variable
///
/// In mock mode a missing key falls back to a fixed throwaway key.
pub fn load_signer(wallet: &WalletConfig, mock_mode: bool) -> Result<Ed25519Wallet, AppError> {
    let loaded = match &wallet.secret_key_file {
        Some(path) => read_key_file(path),
        None => Ed25519Wallet::from_env(&wallet.secret_key_env).map_err(AppError::from),
    };

    match loaded {
        Ok(wallet) => Ok(wallet),
        Err(e) if mock_mode => {
            warn!(error = %e, "no signing key configured, using the mock key");
            Ok(Ed25519Wallet::from_seed(MOCK_SEED)?)
        }
        Err(e) => Err(e),
    }
}

fn read_key_file(path: &Path) -> Result<Ed25519Wallet, AppError> {
    let secret = std::fs::read_to_string(path).map_err(|source| AppError::KeyFile {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Ed25519Wallet::from_secret_hex(&secret)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_config_from_retry_section() {
        let mut config = AppConfig::devnet();
        config.retry.submit_attempts = 2;
        config.retry.transient_step_secs = 1;
        config.chain.timeout_secs = 4;

        let submission = submission_config(&config);
        assert_eq!(submission.submission_policy.max_attempts, 2);
        assert_eq!(
            submission.submission_policy.transient_step,
            Duration::from_secs(1)
        );
        assert_eq!(submission.nonce_policy.max_attempts, 3);
        assert_eq!(submission.call_timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_default_submission_config_matches_orchestrator_default() {
        assert_eq!(
            submission_config(&AppConfig::devnet()),
            SubmissionConfig::default()
        );
    }

    #[test]
    fn test_mock_mode_falls_back_to_mock_key() {
        let wallet = WalletConfig {
            secret_key_env: "WARPGEN_APP_TEST_UNSET_KEY".to_string(),
            secret_key_file: None,
        };
        assert!(load_signer(&wallet, false).is_err());
        assert!(load_signer(&wallet, true).is_ok());
    }
}
