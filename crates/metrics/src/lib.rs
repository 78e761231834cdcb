//! Metrics and tracing for the Warp pipeline
//!
//! Metrics live in an instance [`prometheus::Registry`] owned by
//! [`PipelineMetrics`], so several pipelines (or tests) in one process never
//! share counters.
//!
//! # Example
//!
//! ```
//! use warp_intents_metrics::PipelineMetrics;
//!
//! let metrics = PipelineMetrics::new().unwrap();
//! metrics.record_intent_resolved("staking");
//! assert!(metrics.gather().unwrap().contains("warp_intents_intents_resolved_total"));
//! ```

pub mod collector;
pub mod metrics;
pub mod tracing;

pub use collector::{MetricsError, PipelineMetrics};
pub use crate::metrics::MetricSet;
pub use crate::tracing::{init_tracing, DEFAULT_FILTER, CorrelationId, ErrorContext, LogFormat, RequestSpan, TracingError};
