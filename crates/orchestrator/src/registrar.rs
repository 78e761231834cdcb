use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use warp_intents_chain::{AliasRegistry, RegistryContract};
use warp_intents_metrics::PipelineMetrics;
use warp_intents_types::{is_valid_alias, TransactionSigner};

use crate::error::AliasError;
use crate::submission::{SubmissionOrchestrator, SubmissionReport};

/// Pause between the primary transaction and the registration, so the
/// registry sees the warp transaction first
pub const ALIAS_SETTLE_WAIT: Duration = Duration::from_secs(5);

/// Advisory registry lookup result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AliasAvailability {
    Available,
    Taken { hash: String },
    /// The lookup itself failed; registration may still succeed
    Unknown { reason: String },
}

/// Binds aliases to warp transaction hashes through the registry contract
///
/// The availability check is advisory only. Two registrations of the same
/// alias can both pass it; the registry contract keeps the first one.
pub struct AliasRegistrar {
    registry: Arc<dyn AliasRegistry>,
    contract: RegistryContract,
    orchestrator: Arc<SubmissionOrchestrator>,
    settle_wait: Duration,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl AliasRegistrar {
    pub fn new(
        registry: Arc<dyn AliasRegistry>,
        contract: RegistryContract,
        orchestrator: Arc<SubmissionOrchestrator>,
    ) -> Self {
        Self {
            registry,
            contract,
            orchestrator,
            settle_wait: ALIAS_SETTLE_WAIT,
            metrics: None,
        }
    }

    pub fn with_settle_wait(mut self, settle_wait: Duration) -> Self {
        self.settle_wait = settle_wait;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn contract(&self) -> &RegistryContract {
        &self.contract
    }

    /// Trimmed alias, or `InvalidAlias`
    pub fn normalize(alias: &str) -> Result<&str, AliasError> {
        let trimmed = alias.trim();
        if is_valid_alias(trimmed) {
            Ok(trimmed)
        } else {
            Err(AliasError::InvalidAlias(alias.to_string()))
        }
    }

    /// Hash an alias currently points to
    pub async fn resolve(&self, alias: &str) -> Result<Option<String>, AliasError> {
        let alias = Self::normalize(alias)?;
        self.registry
            .resolve_alias(alias)
            .await
            .map_err(AliasError::Lookup)
    }

    pub async fn check_availability(&self, alias: &str) -> Result<AliasAvailability, AliasError> {
        let alias = Self::normalize(alias)?;
        let availability = match self.registry.resolve_alias(alias).await {
            Ok(None) => AliasAvailability::Available,
            Ok(Some(hash)) => AliasAvailability::Taken { hash },
            Err(e) => AliasAvailability::Unknown {
                reason: e.to_string(),
            },
        };
        Ok(availability)
    }

    /// Register `alias` for `warp_hash`
    ///
    /// Returns the report of the registration transaction. A failure here
    /// never affects the warp transaction itself.
    pub async fn register_alias(
        &self,
        warp_hash: &str,
        alias: &str,
        signer: &dyn TransactionSigner,
    ) -> Result<SubmissionReport, AliasError> {
        let result = self.try_register(warp_hash, alias, signer).await;
        self.record_outcome(match &result {
            Ok(_) => "registered",
            Err(AliasError::AliasTaken { .. }) => "taken",
            Err(AliasError::InvalidAlias(_)) => "invalid",
            Err(_) => "failed",
        });
        result
    }

    async fn try_register(
        &self,
        warp_hash: &str,
        alias: &str,
        signer: &dyn TransactionSigner,
    ) -> Result<SubmissionReport, AliasError> {
        let alias = Self::normalize(alias)?;

        match self.check_availability(alias).await? {
            AliasAvailability::Taken { hash } => {
                info!(alias, existing_hash = %hash, "alias already registered");
                return Err(AliasError::AliasTaken {
                    alias: alias.to_string(),
                    hash,
                });
            }
            AliasAvailability::Unknown { reason } => {
                warn!(alias, reason = %reason, "alias lookup failed, registering anyway");
            }
            AliasAvailability::Available => {}
        }

        if !self.settle_wait.is_zero() {
            tokio::time::sleep(self.settle_wait).await;
        }

        let tx = self
            .contract
            .register_transaction(signer.address(), warp_hash, alias);
        let report = self
            .orchestrator
            .submit(tx, signer)
            .await
            .map_err(AliasError::RegistrationFailed)?;

        info!(
            alias,
            warp_hash,
            registration_hash = %report.hash,
            "alias registration submitted"
        );
        Ok(report)
    }

    /// Release an alias owned by the signer
    pub async fn unregister_alias(
        &self,
        alias: &str,
        signer: &dyn TransactionSigner,
    ) -> Result<SubmissionReport, AliasError> {
        let alias = Self::normalize(alias)?;
        let tx = self.contract.unregister_transaction(signer.address(), alias);
        let report = self
            .orchestrator
            .submit(tx, signer)
            .await
            .map_err(AliasError::RegistrationFailed)?;

        info!(alias, tx_hash = %report.hash, "alias release submitted");
        self.record_outcome("unregistered");
        Ok(report)
    }

    fn record_outcome(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_alias_outcome(outcome);
        }
    }
}
