use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,warp_intents=debug";

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(TracingError::UnknownFormat(other.to_string())),
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `filter`; `filter` falls back to [`DEFAULT_FILTER`].
/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_tracing(format: LogFormat, filter: Option<&str>) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)))
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Json => registry
            .with(
                subscriber_fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                subscriber_fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.map_err(|e| TracingError::InitError(e.to_string()))
}

/// Correlation ID for tracking one request across the pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(uuid::Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span context for one pipeline request
#[derive(Debug, Clone)]
pub struct RequestSpan {
    pub correlation_id: CorrelationId,
    pub operation: &'static str,
}

impl RequestSpan {
    pub fn new(operation: &'static str) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            operation,
        }
    }

    /// The tracing span; attach it to futures with `Instrument::instrument`
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "warp_request",
            correlation_id = %self.correlation_id,
            operation = self.operation,
        )
    }
}

/// Log an error with request context on its way up
pub trait ErrorContext {
    fn with_correlation_id(self, correlation_id: CorrelationId) -> Self;
}

impl<T, E> ErrorContext for Result<T, E>
where
    E: fmt::Display,
{
    fn with_correlation_id(self, correlation_id: CorrelationId) -> Self {
        self.map_err(|e| {
            tracing::error!(
                correlation_id = %correlation_id,
                error = %e,
                "request failed"
            );
            e
        })
    }
}

/// Tracing error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),
    #[error("unknown log format: {0}")]
    UnknownFormat(String),
}
