use std::fmt;
use std::time::Duration;

use prometheus::{Encoder, Registry, TextEncoder};

use crate::metrics::MetricSet;

/// Metrics recorder shared by the pipeline stages
pub struct PipelineMetrics {
    registry: Registry,
    set: MetricSet,
}

impl PipelineMetrics {
    /// Metrics backed by a fresh registry
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Register into an existing registry, e.g. one shared with other components
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let set = MetricSet::register(&registry)?;
        Ok(Self { registry, set })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTENT METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_intent_resolved(&self, intent_id: &str) {
        self.set
            .intents_resolved
            .with_label_values(&[intent_id])
            .inc();
    }

    /// Record a failure that happened before anything touched the network
    pub fn record_compile_failure(&self, code: &str) {
        self.set.compile_failures.with_label_values(&[code]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SUBMISSION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record one broadcast attempt; `result` is `ok` or a failure class
    pub fn record_submission_attempt(&self, result: &str) {
        self.set
            .submission_attempts
            .with_label_values(&[result])
            .inc();
    }

    pub fn record_submission_outcome(&self, code: &str, latency: Duration) {
        self.set
            .submission_outcomes
            .with_label_values(&[code])
            .inc();
        self.set
            .submission_latency
            .observe(latency.as_millis() as f64);
    }

    pub fn record_nonce_refresh(&self) {
        self.set.nonce_refreshes.inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ALIAS METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_alias_outcome(&self, outcome: &str) {
        self.set.alias_outcomes.with_label_values(&[outcome]).inc();
    }

    /// Prometheus text exposition of everything recorded so far
    pub fn gather(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

impl fmt::Debug for PipelineMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineMetrics").finish_non_exhaustive()
    }
}

/// Metrics error types
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
    #[error("registry error: {0}")]
    RegistryError(String),
}

impl From<prometheus::Error> for MetricsError {
    fn from(err: prometheus::Error) -> Self {
        MetricsError::RegistryError(err.to_string())
    }
}
