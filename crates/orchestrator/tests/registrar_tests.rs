//! Alias registration against the in-memory registry

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use warp_intents_chain::{
    ChainError, ContractAliasRegistry, Ed25519Wallet, InMemoryLedger, RegistryContract,
    REGISTRATION_FEE,
};
use warp_intents_orchestrator::{
    AliasAvailability, AliasError, AliasRegistrar, SubmissionError, SubmissionOrchestrator,
};
use warp_intents_types::TransactionSigner;

const SECRET: &str = "413f42575f7f26fad3317a778771212fdb80245850981e48b58a4f25e344e8f9";
const HASH_A: &str = "b48f15e333b743d5a972566d8f99e02119de8556ee61b3ea14d17f2036f398c2";
const HASH_B: &str = "c3e63a8426de9357323db6a6a6ad9c811bf16c7c0b92db25237accf97023f83b";
const UNKNOWN_CONTRACT: &str = "erd1qqqqqqqqqqqqqpgqqz6vp7vs3p7u8t8gxppjq8qwkx7urj4g7a3szux93t";

fn wallet() -> Ed25519Wallet {
    Ed25519Wallet::from_secret_hex(SECRET).unwrap()
}

fn registrar(ledger: &Arc<InMemoryLedger>) -> AliasRegistrar {
    let contract = RegistryContract::default();
    let registry = Arc::new(ContractAliasRegistry::new(ledger.clone(), contract.clone()));
    let orchestrator = Arc::new(SubmissionOrchestrator::new(ledger.clone()));
    AliasRegistrar::new(registry, contract, orchestrator)
}

/// Registrar whose lookups always fail: the registry queries a contract the
/// ledger does not know
fn blind_registrar(ledger: &Arc<InMemoryLedger>) -> AliasRegistrar {
    let registry = Arc::new(ContractAliasRegistry::new(
        ledger.clone(),
        RegistryContract::new(UNKNOWN_CONTRACT),
    ));
    let orchestrator = Arc::new(SubmissionOrchestrator::new(ledger.clone()));
    AliasRegistrar::new(registry, RegistryContract::default(), orchestrator)
}

// ==================== Availability Tests ====================

#[tokio::test]
async fn test_check_availability() {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.seed_alias("taken", HASH_A, "erd1owner").await;
    let registrar = registrar(&ledger);

    assert_eq!(
        registrar.check_availability("free").await.unwrap(),
        AliasAvailability::Available
    );
    assert_eq!(
        registrar.check_availability(" taken ").await.unwrap(),
        AliasAvailability::Taken {
            hash: HASH_A.to_string()
        }
    );
    assert!(matches!(
        blind_registrar(&ledger).check_availability("free").await.unwrap(),
        AliasAvailability::Unknown { .. }
    ));
}

#[tokio::test]
async fn test_invalid_alias_never_reaches_the_network() {
    let ledger = Arc::new(InMemoryLedger::new());
    let registrar = registrar(&ledger);
    let wallet = wallet();

    let err = registrar
        .register_alias(HASH_A, "has spaces", &wallet)
        .await
        .unwrap_err();
    assert!(matches!(err, AliasError::InvalidAlias(_)));
    assert_eq!(ledger.nonce_fetches().await, 0);
    assert_eq!(ledger.send_attempts().await, 0);
}

// ==================== Registration Tests ====================

#[tokio::test(start_paused = true)]
async fn test_register_alias() {
    let ledger = Arc::new(InMemoryLedger::new());
    let registrar = registrar(&ledger);
    let wallet = wallet();

    let started = Instant::now();
    let report = registrar
        .register_alias(HASH_A, "my-stake", &wallet)
        .await
        .unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(ledger.alias("my-stake").await, Some(HASH_A.to_string()));

    let txs = ledger.transactions().await;
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].hash, report.hash);
    assert_eq!(txs[0].status, "success");
    assert_eq!(txs[0].tx.value(), REGISTRATION_FEE);
    assert_eq!(txs[0].tx.gas_limit(), 10_000_000);
    assert_eq!(
        txs[0].tx.payload(),
        format!("registerWarp@{HASH_A}@{}", hex::encode("my-stake")).as_bytes()
    );
}

#[tokio::test(start_paused = true)]
async fn test_taken_alias_is_rejected_before_submission() {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger.seed_alias("my-stake", HASH_A, "erd1owner").await;
    let registrar = registrar(&ledger);
    let wallet = wallet();

    let err = registrar
        .register_alias(HASH_B, "my-stake", &wallet)
        .await
        .unwrap_err();

    assert!(matches!(err, AliasError::AliasTaken { hash, .. } if hash == HASH_A));
    assert_eq!(ledger.send_attempts().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_lookup_still_registers() {
    let ledger = Arc::new(InMemoryLedger::new());
    let registrar = blind_registrar(&ledger);
    let wallet = wallet();

    registrar
        .register_alias(HASH_A, "blind", &wallet)
        .await
        .unwrap();
    assert_eq!(ledger.alias("blind").await, Some(HASH_A.to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_registration_failure_is_reported() {
    let ledger = Arc::new(InMemoryLedger::new());
    ledger
        .fail_sends([ChainError::Rejected {
            status: 400,
            message: "insufficient funds".to_string(),
        }])
        .await;
    let registrar = registrar(&ledger);
    let wallet = wallet();

    let err = registrar
        .register_alias(HASH_A, "broke", &wallet)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AliasError::RegistrationFailed(SubmissionError::InsufficientFunds { .. })
    ));
    assert_eq!(ledger.alias("broke").await, None);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_registrations_first_wins() {
    let ledger = Arc::new(InMemoryLedger::new());
    let registrar = registrar(&ledger);
    let alice = wallet();
    let bob = Ed25519Wallet::from_seed([7u8; 32]).unwrap();

    let (a, b) = tokio::join!(
        registrar.register_alias(HASH_A, "contested", &alice),
        registrar.register_alias(HASH_B, "contested", &bob),
    );

    // Both pass the advisory check and both transactions are accepted
    let a = a.unwrap();
    let b = b.unwrap();

    let bound = ledger.alias("contested").await.unwrap();
    assert!(bound == HASH_A || bound == HASH_B);

    let txs = ledger.transactions().await;
    let status_of = |hash: &str| {
        txs.iter()
            .find(|t| t.hash == hash)
            .map(|t| t.status.clone())
            .unwrap()
    };
    let statuses = [status_of(&a.hash), status_of(&b.hash)];
    assert_eq!(statuses.iter().filter(|s| *s == "success").count(), 1);
    assert_eq!(statuses.iter().filter(|s| *s == "fail").count(), 1);

    let winner = if statuses[0] == "success" { HASH_A } else { HASH_B };
    assert_eq!(bound, winner);

    // A later attempt sees the binding
    assert!(matches!(
        registrar.check_availability("contested").await.unwrap(),
        AliasAvailability::Taken { .. }
    ));
}

// ==================== Unregister Tests ====================

#[tokio::test(start_paused = true)]
async fn test_unregister_alias() {
    let ledger = Arc::new(InMemoryLedger::new());
    let registrar = registrar(&ledger);
    let wallet = wallet();

    registrar
        .register_alias(HASH_A, "temp", &wallet)
        .await
        .unwrap();
    let report = registrar.unregister_alias("temp", &wallet).await.unwrap();

    assert_eq!(ledger.alias("temp").await, None);
    let txs = ledger.transactions().await;
    let release = txs.iter().find(|t| t.hash == report.hash).unwrap();
    assert_eq!(
        release.tx.payload(),
        format!("unregisterWarp@{}", hex::encode("temp")).as_bytes()
    );
    assert_eq!(release.tx.sender(), wallet.address());
}
