//! Submission state machine against the in-memory ledger

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use warp_intents_chain::{
    ChainApi, ChainError, Ed25519Wallet, InMemoryLedger, TransactionInfo, VmQuery,
};
use warp_intents_metrics::PipelineMetrics;
use warp_intents_orchestrator::{SubmissionError, SubmissionOrchestrator};
use warp_intents_retry::FailureClass;
use warp_intents_types::{SignedTransaction, TransactionSigner, UnsignedTransaction};

const SECRET: &str = "413f42575f7f26fad3317a778771212fdb80245850981e48b58a4f25e344e8f9";
const RECEIVER: &str = "erd1qqqqqqqqqqqqqpgqqz6vp7vs3p7u8t8gxppjq8qwkx7urj4g7a3szux93t";

fn wallet() -> Ed25519Wallet {
    Ed25519Wallet::from_secret_hex(SECRET).unwrap()
}

fn transfer(sender: &str) -> UnsignedTransaction {
    UnsignedTransaction::new(sender, RECEIVER)
        .with_value("1000000000000000000")
        .with_gas_limit(50_000)
}

fn transient() -> ChainError {
    ChainError::Transport("502 bad gateway".to_string())
}

fn setup() -> (Arc<InMemoryLedger>, SubmissionOrchestrator) {
    let ledger = Arc::new(InMemoryLedger::new());
    let orchestrator = SubmissionOrchestrator::new(ledger.clone());
    (ledger, orchestrator)
}

// ==================== Happy Path Tests ====================

#[tokio::test(start_paused = true)]
async fn test_first_attempt_succeeds() {
    let (ledger, orchestrator) = setup();
    let wallet = wallet();
    ledger.set_nonce(wallet.address(), 7).await;

    let started = Instant::now();
    let report = orchestrator
        .submit(transfer(wallet.address()), &wallet)
        .await
        .unwrap();

    assert_eq!(report.nonce, 7);
    assert_eq!(report.attempt_count(), 1);
    assert!(report.attempts[0].succeeded());
    assert_eq!(started.elapsed(), Duration::ZERO);

    let accepted = ledger.transactions().await;
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].hash, report.hash);
    assert_eq!(accepted[0].tx.nonce(), 7);
}

// ==================== Retry Tests ====================

#[tokio::test(start_paused = true)]
async fn test_k_transient_failures_take_k_plus_one_attempts() {
    let (ledger, orchestrator) = setup();
    let wallet = wallet();
    let k = 3;
    ledger.fail_sends((0..k).map(|_| transient())).await;

    let started = Instant::now();
    let report = orchestrator
        .submit(transfer(wallet.address()), &wallet)
        .await
        .unwrap();

    assert_eq!(report.attempt_count(), k + 1);
    assert_eq!(ledger.send_attempts().await, k + 1);

    let backoffs: Vec<Duration> = report.attempts.iter().map(|a| a.backoff).collect();
    assert_eq!(
        backoffs,
        vec![
            Duration::ZERO,
            Duration::from_secs(3),
            Duration::from_secs(6),
            Duration::from_secs(9),
        ]
    );
    assert!(backoffs.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(started.elapsed(), Duration::from_secs(18));

    for failed in &report.attempts[..k as usize] {
        assert_eq!(failed.failure.as_ref().unwrap().class, FailureClass::Transient);
    }
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_has_no_trailing_backoff() {
    let (ledger, orchestrator) = setup();
    let wallet = wallet();
    ledger.fail_sends((0..5).map(|_| transient())).await;

    let started = Instant::now();
    let err = orchestrator
        .submit(transfer(wallet.address()), &wallet)
        .await
        .unwrap_err();

    let SubmissionError::SubmissionFailed { attempts, last_error } = err else {
        panic!("expected SubmissionFailed, got {err:?}");
    };
    assert_eq!(attempts.len(), 5);
    assert_eq!(last_error, transient());
    // 3 + 6 + 9 + 12
    assert_eq!(started.elapsed(), Duration::from_secs(30));
    assert!(ledger.transactions().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_insufficient_funds_stops_after_one_attempt() {
    let (ledger, orchestrator) = setup();
    let wallet = wallet();
    ledger
        .fail_sends([ChainError::Rejected {
            status: 400,
            message: "insufficient funds for address".to_string(),
        }])
        .await;

    let started = Instant::now();
    let err = orchestrator
        .submit(transfer(wallet.address()), &wallet)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::InsufficientFunds { .. }));
    assert_eq!(ledger.send_attempts().await, 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_nonce_conflict_refetches_and_resigns() {
    let (ledger, orchestrator) = setup();
    let wallet = wallet();
    ledger.set_nonce(wallet.address(), 5).await;
    ledger
        .fail_sends([ChainError::Rejected {
            status: 400,
            message: "transaction generation failed: lowerNonceInTx: true".to_string(),
        }])
        .await;

    let started = Instant::now();
    let report = orchestrator
        .submit(transfer(wallet.address()), &wallet)
        .await
        .unwrap();

    assert_eq!(report.nonce_refreshes, 1);
    assert_eq!(ledger.nonce_fetches().await, 2);
    assert_eq!(report.attempt_count(), 2);
    assert_eq!(report.attempts[1].backoff, Duration::from_secs(5));
    assert_eq!(
        report.attempts[0].failure.as_ref().unwrap().class,
        FailureClass::NonceConflict
    );
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_stale_nonce_recovers_with_fresh_nonce() {
    let ledger = Arc::new(InMemoryLedger::new());
    let wallet = wallet();

    // Two submissions from the same sender race for nonce 0
    let first = SubmissionOrchestrator::new(ledger.clone());
    let second = SubmissionOrchestrator::new(ledger.clone());
    let (a, b) = tokio::join!(
        first.submit(transfer(wallet.address()), &wallet),
        second.submit(transfer(wallet.address()), &wallet),
    );

    let mut nonces = vec![a.unwrap().nonce, b.unwrap().nonce];
    nonces.sort_unstable();
    assert_eq!(nonces, vec![0, 1]);
    assert_eq!(ledger.get_nonce(wallet.address()).await.unwrap(), 2);
}

// ==================== Nonce Fetch Tests ====================

#[tokio::test(start_paused = true)]
async fn test_nonce_fetch_exhaustion() {
    let (ledger, orchestrator) = setup();
    let wallet = wallet();
    ledger
        .fail_nonce_fetches((0..3).map(|_| ChainError::Timeout("slow".to_string())))
        .await;

    let started = Instant::now();
    let err = orchestrator
        .submit(transfer(wallet.address()), &wallet)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::NonceFetchFailed { attempts: 3, .. }));
    // 2 + 4
    assert_eq!(started.elapsed(), Duration::from_secs(6));
    assert_eq!(ledger.send_attempts().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_nonce_fetch_recovers() {
    let (ledger, orchestrator) = setup();
    let wallet = wallet();
    ledger.fail_nonce_fetches([transient(), transient()]).await;

    let report = orchestrator
        .submit(transfer(wallet.address()), &wallet)
        .await
        .unwrap();
    assert_eq!(report.nonce, 0);
    assert_eq!(ledger.nonce_fetches().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_nonce_fetch_does_not_retry_rejections() {
    for failure in [
        ChainError::Rejected {
            status: 400,
            message: "invalid address".to_string(),
        },
        ChainError::NotFound("account".to_string()),
    ] {
        let (ledger, orchestrator) = setup();
        let wallet = wallet();
        ledger.fail_nonce_fetches([failure.clone()]).await;

        let started = Instant::now();
        let err = orchestrator
            .submit(transfer(wallet.address()), &wallet)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::NonceFetchFailed { attempts: 1, ref last_error } if *last_error == failure
        ));
        assert_eq!(ledger.nonce_fetches().await, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(ledger.send_attempts().await, 0);
    }
}

// ==================== Signing Tests ====================

#[tokio::test(start_paused = true)]
async fn test_signing_failure_is_fatal() {
    let (ledger, orchestrator) = setup();
    let wallet = wallet();

    let err = orchestrator
        .submit(transfer(RECEIVER), &wallet)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::SigningFailed(_)));
    assert_eq!(ledger.send_attempts().await, 0);
}

// ==================== Timeout Tests ====================

/// Delegates to the ledger but hangs on the first broadcast
struct HangingApi {
    ledger: InMemoryLedger,
    hang: tokio::sync::Mutex<bool>,
}

#[async_trait]
impl ChainApi for HangingApi {
    async fn get_nonce(&self, address: &str) -> Result<u64, ChainError> {
        self.ledger.get_nonce(address).await
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<String, ChainError> {
        let hang = std::mem::replace(&mut *self.hang.lock().await, false);
        if hang {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        self.ledger.send_transaction(tx).await
    }

    async fn get_transaction(&self, hash: &str) -> Result<TransactionInfo, ChainError> {
        self.ledger.get_transaction(hash).await
    }

    async fn query(&self, query: &VmQuery) -> Result<Vec<Vec<u8>>, ChainError> {
        self.ledger.query(query).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_call_timeout_is_retried_as_transient() {
    let api = Arc::new(HangingApi {
        ledger: InMemoryLedger::new(),
        hang: tokio::sync::Mutex::new(true),
    });
    let orchestrator = SubmissionOrchestrator::new(api);
    let wallet = wallet();

    let started = Instant::now();
    let report = orchestrator
        .submit(transfer(wallet.address()), &wallet)
        .await
        .unwrap();

    assert_eq!(report.attempt_count(), 2);
    let failure = report.attempts[0].failure.as_ref().unwrap();
    assert_eq!(failure.class, FailureClass::Transient);
    assert!(failure.message.contains("timed out"));
    // 15s timeout + 3s backoff
    assert_eq!(started.elapsed(), Duration::from_secs(18));
}

// ==================== Metrics Tests ====================

#[tokio::test(start_paused = true)]
async fn test_attempts_are_counted() {
    let ledger = Arc::new(InMemoryLedger::new());
    let metrics = Arc::new(PipelineMetrics::new().unwrap());
    let orchestrator = SubmissionOrchestrator::new(ledger.clone()).with_metrics(metrics.clone());
    let wallet = wallet();
    ledger.fail_sends([transient()]).await;

    orchestrator
        .submit(transfer(wallet.address()), &wallet)
        .await
        .unwrap();

    let exported = metrics.gather().unwrap();
    assert!(exported.contains(r#"warp_intents_submission_attempts_total{result="transient"} 1"#));
    assert!(exported.contains(r#"warp_intents_submission_attempts_total{result="ok"} 1"#));
    assert!(exported.contains(r#"warp_intents_submission_outcomes_total{code="CONFIRMED"} 1"#));
}
