use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use warp_intents_types::SignedTransaction;

use crate::{ChainApi, ChainError, TransactionInfo, VmQuery};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// [`ChainApi`] over the public MultiversX REST API
#[derive(Debug, Clone)]
pub struct HttpChainApi {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    nonce: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    return_data: Vec<String>,
    #[serde(default)]
    return_code: Option<String>,
    #[serde(default)]
    return_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpChainApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("warp-intents/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into a [`ChainError`]
    async fn check(response: Response, what: &str) -> Result<Response, ChainError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ChainError::NotFound(what.to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or(body);
        warn!(status = status.as_u16(), %message, what, "chain api returned an error");
        Err(ChainError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChainApi for HttpChainApi {
    async fn get_nonce(&self, address: &str) -> Result<u64, ChainError> {
        let response = self
            .client
            .get(self.url(&format!("/accounts/{address}")))
            .send()
            .await?;
        let account: AccountResponse = Self::check(response, address).await?.json().await?;
        debug!(address, nonce = account.nonce, "fetched account nonce");
        Ok(account.nonce)
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<String, ChainError> {
        let response = self
            .client
            .post(self.url("/transactions"))
            .json(tx)
            .send()
            .await?;
        let sent: SendResponse = Self::check(response, "transaction").await?.json().await?;
        debug!(tx_hash = %sent.tx_hash, nonce = tx.nonce(), "transaction accepted");
        Ok(sent.tx_hash)
    }

    async fn get_transaction(&self, hash: &str) -> Result<TransactionInfo, ChainError> {
        let response = self
            .client
            .get(self.url(&format!("/transactions/{hash}")))
            .send()
            .await?;
        Ok(Self::check(response, hash).await?.json().await?)
    }

    async fn query(&self, query: &VmQuery) -> Result<Vec<Vec<u8>>, ChainError> {
        let response = self
            .client
            .post(self.url("/vm-values/query"))
            .json(query)
            .send()
            .await?;
        let result: QueryResponse = Self::check(response, &query.func_name).await?.json().await?;

        if let Some(code) = result.return_code.as_deref() {
            if code != "ok" {
                return Err(ChainError::Rejected {
                    status: 200,
                    message: result.return_message.unwrap_or_else(|| code.to_string()),
                });
            }
        }

        result
            .return_data
            .iter()
            .map(|part| {
                BASE64
                    .decode(part)
                    .map_err(|e| ChainError::Decode(format!("return data: {e}")))
            })
            .collect()
    }
}
