use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Serialize, Serializer};

use crate::SignerError;

/// Devnet chain identifier
pub const DEFAULT_CHAIN_ID: &str = "D";

/// Minimum network gas price, in atomic units
pub const DEFAULT_GAS_PRICE: u64 = 1_000_000_000;

pub const TRANSACTION_VERSION: u32 = 1;

/// Decimals of the native EGLD token
pub const EGLD_DECIMALS: u32 = 18;

/// Produces signatures for serialized transactions
///
/// Implementations own the key material; the pipeline only ever sees the
/// signer's address and the signature bytes it returns.
pub trait TransactionSigner: Send + Sync {
    /// Bech32 address of the signing account
    fn address(&self) -> &str;

    /// Sign the canonical signing payload
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError>;
}

/// A transaction that has not yet been given a nonce or signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub sender: String,
    pub receiver: String,
    /// Atomic units of EGLD
    pub value: String,
    pub gas_price: u64,
    pub gas_limit: u64,
    /// Call data, e.g. `delegate@0123`
    pub payload: Vec<u8>,
    pub chain_id: String,
    pub version: u32,
}

impl UnsignedTransaction {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            value: "0".to_string(),
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit: 0,
            payload: Vec::new(),
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            version: TRANSACTION_VERSION,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = chain_id.into();
        self
    }

    /// Payload as text, lossy for non UTF-8 data
    pub fn payload_str(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Bytes that get signed for the given nonce
    ///
    /// Field order matters: the network re-serializes the transaction the
    /// same way before verifying the signature.
    pub fn signing_payload(&self, nonce: u64) -> Result<Vec<u8>, SignerError> {
        let body = SigningPayload {
            nonce,
            value: &self.value,
            receiver: &self.receiver,
            sender: &self.sender,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            data: (!self.payload.is_empty()).then(|| BASE64.encode(&self.payload)),
            chain_id: &self.chain_id,
            version: self.version,
        };
        serde_json::to_vec(&body).map_err(|e| SignerError::Serialization(e.to_string()))
    }

    /// Assign the nonce and sign in one step
    ///
    /// This is the only way to obtain a [`SignedTransaction`], so a nonce can
    /// never change underneath an existing signature.
    pub fn sign(
        self,
        nonce: u64,
        signer: &dyn TransactionSigner,
    ) -> Result<SignedTransaction, SignerError> {
        if signer.address() != self.sender {
            return Err(SignerError::SenderMismatch {
                signer: signer.address().to_string(),
                sender: self.sender,
            });
        }
        let payload = self.signing_payload(nonce)?;
        let signature = signer.sign(&payload)?;
        Ok(SignedTransaction {
            inner: self,
            nonce,
            signature,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningPayload<'a> {
    nonce: u64,
    value: &'a str,
    receiver: &'a str,
    sender: &'a str,
    gas_price: u64,
    gas_limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(rename = "chainID")]
    chain_id: &'a str,
    version: u32,
}

/// An immutable, signed transaction ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    inner: UnsignedTransaction,
    nonce: u64,
    signature: Vec<u8>,
}

impl SignedTransaction {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn sender(&self) -> &str {
        &self.inner.sender
    }

    pub fn receiver(&self) -> &str {
        &self.inner.receiver
    }

    pub fn value(&self) -> &str {
        &self.inner.value
    }

    pub fn gas_limit(&self) -> u64 {
        self.inner.gas_limit
    }

    pub fn payload(&self) -> &[u8] {
        &self.inner.payload
    }

    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.inner
    }
}

impl Serialize for SignedTransaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<'a> {
            nonce: u64,
            value: &'a str,
            receiver: &'a str,
            sender: &'a str,
            gas_price: u64,
            gas_limit: u64,
            #[serde(skip_serializing_if = "Option::is_none")]
            data: Option<String>,
            #[serde(rename = "chainID")]
            chain_id: &'a str,
            version: u32,
            signature: String,
        }

        let tx = &self.inner;
        Wire {
            nonce: self.nonce,
            value: &tx.value,
            receiver: &tx.receiver,
            sender: &tx.sender,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            data: (!tx.payload.is_empty()).then(|| BASE64.encode(&tx.payload)),
            chain_id: &tx.chain_id,
            version: tx.version,
            signature: hex::encode(&self.signature),
        }
        .serialize(serializer)
    }
}
