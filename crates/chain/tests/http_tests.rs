//! HttpChainApi against a mock MultiversX API

use std::time::Duration;

use serde_json::json;
use warp_intents_chain::{ChainApi, ChainError, HttpChainApi, VmQuery};
use warp_intents_retry::FailureClass;
use warp_intents_types::{SignerError, TransactionSigner, UnsignedTransaction};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SENDER: &str = "erd1709y9mhz6487cfzv6t9xpa6hyxtc5kv4zl4za377tn0tqrhtht6sfrdfta";
const RECEIVER: &str = "erd1qqqqqqqqqqqqqpgqqz6vp7vs3p7u8t8gxppjq8qwkx7urj4g7a3szux93t";

struct StubSigner;

impl TransactionSigner for StubSigner {
    fn address(&self) -> &str {
        SENDER
    }

    fn sign(&self, _payload: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(vec![0xab; 64])
    }
}

async fn api(server: &MockServer) -> HttpChainApi {
    HttpChainApi::new(&server.uri(), Duration::from_secs(2)).unwrap()
}

// ==================== Account Tests ====================

#[tokio::test]
async fn test_get_nonce() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/accounts/{SENDER}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": SENDER,
            "nonce": 42,
            "balance": "1000"
        })))
        .mount(&server)
        .await;

    assert_eq!(api(&server).await.get_nonce(SENDER).await.unwrap(), 42);
}

#[tokio::test]
async fn test_get_nonce_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = api(&server).await.get_nonce(SENDER).await.unwrap_err();
    assert!(matches!(err, ChainError::Rejected { status: 502, .. }));
    assert_eq!(err.class(), FailureClass::Transient);
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"nonce": 1}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let api = HttpChainApi::new(&server.uri(), Duration::from_millis(50)).unwrap();
    let err = api.get_nonce(SENDER).await.unwrap_err();
    assert!(matches!(err, ChainError::Timeout(_)));
    assert_eq!(err.class(), FailureClass::Transient);
}

// ==================== Submission Tests ====================

#[tokio::test]
async fn test_send_transaction_posts_wire_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .and(body_partial_json(json!({
            "nonce": 7,
            "sender": SENDER,
            "receiver": RECEIVER,
            "chainID": "D",
            "version": 1
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "txHash": "5f4e",
            "receiver": RECEIVER,
            "sender": SENDER,
            "nonce": 7,
            "status": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let signed = UnsignedTransaction::new(SENDER, RECEIVER)
        .with_gas_limit(6_000_000)
        .with_payload("claimRewards")
        .sign(7, &StubSigner)
        .unwrap();

    let hash = api(&server).await.send_transaction(&signed).await.unwrap();
    assert_eq!(hash, "5f4e");
}

#[tokio::test]
async fn test_rejection_message_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "statusCode": 400,
            "message": "insufficient funds for address",
            "error": "Bad Request"
        })))
        .mount(&server)
        .await;

    let signed = UnsignedTransaction::new(SENDER, RECEIVER)
        .sign(0, &StubSigner)
        .unwrap();
    let err = api(&server).await.send_transaction(&signed).await.unwrap_err();
    assert_eq!(err.class(), FailureClass::InsufficientFunds);
}

// ==================== Lookup Tests ====================

#[tokio::test]
async fn test_get_transaction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "txHash": "abc",
            "status": "success",
            "sender": SENDER,
            "receiver": RECEIVER,
            "value": "0",
            "timestamp": 1_700_000_000
        })))
        .mount(&server)
        .await;

    let info = api(&server).await.get_transaction("abc").await.unwrap();
    assert!(info.is_success());
    assert_eq!(info.timestamp, Some(1_700_000_000));
}

#[tokio::test]
async fn test_get_transaction_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(matches!(
        api(&server).await.get_transaction("nope").await,
        Err(ChainError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_query_decodes_return_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vm-values/query"))
        .and(body_partial_json(json!({
            "scAddress": RECEIVER,
            "funcName": "resolveAlias",
            "args": ["6869"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "returnData": ["3q2+7w=="],
            "returnCode": "ok"
        })))
        .mount(&server)
        .await;

    let parts = api(&server)
        .await
        .query(&VmQuery::new(RECEIVER, "resolveAlias").with_arg("6869"))
        .await
        .unwrap();
    assert_eq!(parts, vec![vec![0xde, 0xad, 0xbe, 0xef]]);
}

#[tokio::test]
async fn test_query_error_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "returnData": [],
            "returnCode": "user error",
            "returnMessage": "alias not found"
        })))
        .mount(&server)
        .await;

    let err = api(&server)
        .await
        .query(&VmQuery::new(RECEIVER, "resolveAlias"))
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::Rejected { message, .. } if message == "alias not found"));
}
