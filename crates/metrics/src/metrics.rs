use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

use crate::MetricsError;

const SUBMISSION_LATENCY_BUCKETS_MS: [f64; 8] =
    [50.0, 250.0, 1000.0, 3000.0, 10000.0, 30000.0, 60000.0, 120000.0];

/// Every metric the pipeline exports, registered against one registry
#[derive(Clone)]
pub struct MetricSet {
    // ═══════════════════════════════════════════════════════════════════════════
    // INTENT METRICS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Prompts resolved, by intent id
    pub intents_resolved: IntCounterVec,

    /// Compilation or assembly failures, by error code
    pub compile_failures: IntCounterVec,

    // ═══════════════════════════════════════════════════════════════════════════
    // SUBMISSION METRICS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Broadcast attempts, by result class (`ok`, `transient`, ...)
    pub submission_attempts: IntCounterVec,

    /// Terminal submission outcomes, by code
    pub submission_outcomes: IntCounterVec,

    pub nonce_refreshes: IntCounter,

    /// Wall time from nonce fetch to accepted broadcast (milliseconds)
    pub submission_latency: Histogram,

    // ═══════════════════════════════════════════════════════════════════════════
    // ALIAS METRICS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Alias registrations, by outcome (`registered`, `taken`, `failed`)
    pub alias_outcomes: IntCounterVec,
}

impl MetricSet {
    pub fn register(registry: &Registry) -> Result<Self, MetricsError> {
        let set = Self {
            intents_resolved: IntCounterVec::new(
                Opts::new(
                    "warp_intents_intents_resolved_total",
                    "Total prompts resolved to an intent",
                ),
                &["intent_id"],
            )?,
            compile_failures: IntCounterVec::new(
                Opts::new(
                    "warp_intents_compile_failures_total",
                    "Total compilation and assembly failures",
                ),
                &["code"],
            )?,
            submission_attempts: IntCounterVec::new(
                Opts::new(
                    "warp_intents_submission_attempts_total",
                    "Total transaction broadcast attempts",
                ),
                &["result"],
            )?,
            submission_outcomes: IntCounterVec::new(
                Opts::new(
                    "warp_intents_submission_outcomes_total",
                    "Total terminal submission outcomes",
                ),
                &["code"],
            )?,
            nonce_refreshes: IntCounter::new(
                "warp_intents_nonce_refreshes_total",
                "Total nonce re-fetches after a nonce conflict",
            )?,
            submission_latency: Histogram::with_opts(
                HistogramOpts::new(
                    "warp_intents_submission_latency_ms",
                    "Submission latency in milliseconds",
                )
                .buckets(SUBMISSION_LATENCY_BUCKETS_MS.to_vec()),
            )?,
            alias_outcomes: IntCounterVec::new(
                Opts::new(
                    "warp_intents_alias_outcomes_total",
                    "Total alias registration outcomes",
                ),
                &["outcome"],
            )?,
        };

        registry.register(Box::new(set.intents_resolved.clone()))?;
        registry.register(Box::new(set.compile_failures.clone()))?;
        registry.register(Box::new(set.submission_attempts.clone()))?;
        registry.register(Box::new(set.submission_outcomes.clone()))?;
        registry.register(Box::new(set.nonce_refreshes.clone()))?;
        registry.register(Box::new(set.submission_latency.clone()))?;
        registry.register(Box::new(set.alias_outcomes.clone()))?;

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        assert!(MetricSet::register(&registry).is_ok());
        assert!(matches!(
            MetricSet::register(&registry),
            Err(MetricsError::RegistryError(_))
        ));
    }
}
