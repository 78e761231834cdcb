use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use warp_intents_chain::{ChainApi, ChainError, DEFAULT_TIMEOUT};
use warp_intents_metrics::PipelineMetrics;
use warp_intents_retry::{FailureClass, RetryDecision, RetryPolicy, SubmissionPolicy};
use warp_intents_types::{SignedTransaction, TransactionSigner, UnsignedTransaction};

use crate::error::{submission_code, SubmissionError};

/// Submission state machine stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Building,
    NonceFetching,
    Signing,
    Submitting,
    Confirmed,
    Failed,
}

/// A failed broadcast, as classified by the retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    pub class: FailureClass,
    pub message: String,
}

/// One broadcast attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 1-based
    pub attempt: u32,
    pub nonce: u64,
    /// Time waited between the previous attempt and this one
    pub backoff: Duration,
    pub failure: Option<AttemptFailure>,
}

impl AttemptRecord {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// What a successful submission went through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub hash: String,
    /// Nonce of the transaction the network accepted
    pub nonce: u64,
    pub attempts: Vec<AttemptRecord>,
    pub nonce_refreshes: u32,
    pub elapsed: Duration,
}

impl SubmissionReport {
    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }
}

/// Configuration for the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionConfig {
    pub nonce_policy: RetryPolicy,
    pub submission_policy: SubmissionPolicy,
    /// Upper bound on every single network call
    pub call_timeout: Duration,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            nonce_policy: RetryPolicy::nonce_fetch(),
            submission_policy: SubmissionPolicy::default(),
            call_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Fetches the nonce, signs and broadcasts one transaction with retries
///
/// Stages run `Building -> NonceFetching -> Signing -> Submitting`, ending in
/// `Confirmed` or `Failed`. A nonce conflict fetches a fresh nonce and signs
/// a new transaction; the signed transaction itself is never mutated.
pub struct SubmissionOrchestrator {
    api: Arc<dyn ChainApi>,
    config: SubmissionConfig,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl SubmissionOrchestrator {
    pub fn new(api: Arc<dyn ChainApi>) -> Self {
        Self {
            api,
            config: SubmissionConfig::default(),
            metrics: None,
        }
    }

    pub fn with_config(mut self, config: SubmissionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<dyn ChainApi> {
        &self.api
    }

    /// Drive one transaction to acceptance or a terminal failure
    pub async fn submit(
        &self,
        tx: UnsignedTransaction,
        signer: &dyn TransactionSigner,
    ) -> Result<SubmissionReport, SubmissionError> {
        let started = Instant::now();
        info!(
            stage = ?SubmissionStage::Building,
            sender = %tx.sender,
            receiver = %tx.receiver,
            value = %tx.value,
            gas_limit = tx.gas_limit,
            "submitting transaction"
        );

        let result = self.run(tx, signer, started).await;
        if let Some(metrics) = &self.metrics {
            let code = match &result {
                Ok(_) => "CONFIRMED",
                Err(e) => submission_code(e).as_str(),
            };
            metrics.record_submission_outcome(code, started.elapsed());
        }
        result
    }

    async fn run(
        &self,
        tx: UnsignedTransaction,
        signer: &dyn TransactionSigner,
        started: Instant,
    ) -> Result<SubmissionReport, SubmissionError> {
        let policy = self.config.submission_policy;
        let mut nonce = self.fetch_nonce(&tx.sender).await?;
        let mut signed = self.sign(&tx, nonce, signer)?;
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut nonce_refreshes = 0;
        let mut backoff = Duration::ZERO;
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(stage = ?SubmissionStage::Submitting, attempt, nonce, "broadcasting");

            match self.timed(self.api.send_transaction(&signed)).await {
                Ok(hash) => {
                    attempts.push(AttemptRecord {
                        attempt,
                        nonce,
                        backoff,
                        failure: None,
                    });
                    self.record_attempt("ok");
                    info!(
                        stage = ?SubmissionStage::Confirmed,
                        tx_hash = %hash,
                        nonce,
                        attempts = attempt,
                        "transaction accepted"
                    );
                    return Ok(SubmissionReport {
                        hash,
                        nonce,
                        attempts,
                        nonce_refreshes,
                        elapsed: started.elapsed(),
                    });
                }
                Err(err) => {
                    let class = err.class();
                    self.record_attempt(class.as_str());
                    attempts.push(AttemptRecord {
                        attempt,
                        nonce,
                        backoff,
                        failure: Some(AttemptFailure {
                            class,
                            message: err.to_string(),
                        }),
                    });

                    match policy.decide(class, attempt) {
                        RetryDecision::GiveUp => {
                            error!(
                                stage = ?SubmissionStage::Failed,
                                attempt,
                                class = class.as_str(),
                                error = %err,
                                "submission failed"
                            );
                            return Err(match class {
                                FailureClass::InsufficientFunds => {
                                    SubmissionError::InsufficientFunds {
                                        message: err.to_string(),
                                    }
                                }
                                _ => SubmissionError::SubmissionFailed {
                                    attempts,
                                    last_error: err,
                                },
                            });
                        }
                        RetryDecision::RetryAfter(delay) => {
                            warn!(
                                attempt,
                                class = class.as_str(),
                                delay_ms = delay.as_millis() as u64,
                                error = %err,
                                "broadcast failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                            backoff = delay;
                        }
                        RetryDecision::RefreshNonceAfter(delay) => {
                            warn!(
                                attempt,
                                stale_nonce = nonce,
                                delay_ms = delay.as_millis() as u64,
                                error = %err,
                                "nonce conflict, refreshing nonce"
                            );
                            tokio::time::sleep(delay).await;
                            backoff = delay;

                            nonce = self.fetch_nonce(&tx.sender).await?;
                            signed = self.sign(&tx, nonce, signer)?;
                            nonce_refreshes += 1;
                            if let Some(metrics) = &self.metrics {
                                metrics.record_nonce_refresh();
                            }
                        }
                    }
                }
            }
        }
    }

    async fn fetch_nonce(&self, sender: &str) -> Result<u64, SubmissionError> {
        debug!(stage = ?SubmissionStage::NonceFetching, sender, "fetching nonce");
        let api = Arc::clone(&self.api);
        let timeout = self.config.call_timeout;
        let sender = sender.to_string();

        self.config
            .nonce_policy
            .run_while("fetch_nonce", ChainError::is_network_error, move |_attempt| {
                let api = Arc::clone(&api);
                let sender = sender.clone();
                async move {
                    tokio::time::timeout(timeout, api.get_nonce(&sender))
                        .await
                        .unwrap_or_else(|_| Err(timeout_error("get_nonce", timeout)))
                }
            })
            .await
            .map_err(|e| SubmissionError::NonceFetchFailed {
                attempts: e.attempts,
                last_error: e.last_error,
            })
    }

    fn sign(
        &self,
        tx: &UnsignedTransaction,
        nonce: u64,
        signer: &dyn TransactionSigner,
    ) -> Result<SignedTransaction, SubmissionError> {
        debug!(stage = ?SubmissionStage::Signing, nonce, "signing");
        tx.clone().sign(nonce, signer).map_err(|e| {
            error!(stage = ?SubmissionStage::Failed, error = %e, "signing failed");
            SubmissionError::SigningFailed(e)
        })
    }

    async fn timed<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, ChainError>>,
    ) -> Result<T, ChainError> {
        let timeout = self.config.call_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| Err(timeout_error("send_transaction", timeout)))
    }

    fn record_attempt(&self, result: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_submission_attempt(result);
        }
    }
}

fn timeout_error(call: &str, timeout: Duration) -> ChainError {
    ChainError::Timeout(format!("{call} exceeded {}s", timeout.as_secs()))
}
