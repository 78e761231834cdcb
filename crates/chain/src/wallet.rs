use std::fmt;

use ed25519_dalek::{Signer, SigningKey};
use warp_intents_types::{Address, SignerError, TransactionSigner};

use crate::ChainError;

/// Ed25519 account key held in memory
pub struct Ed25519Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Ed25519Wallet {
    /// Wallet from a hex-encoded 32-byte secret key
    pub fn from_secret_hex(secret: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(secret.trim())
            .map_err(|e| ChainError::Wallet(format!("secret key is not hex: {e}")))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            ChainError::Wallet(format!("secret key must be 32 bytes, got {}", b.len()))
        })?;
        Self::from_seed(seed)
    }

    pub fn from_seed(seed: [u8; 32]) -> Result<Self, ChainError> {
        let signing_key = SigningKey::from_bytes(&seed);
        let address = Address::from_bytes(signing_key.verifying_key().to_bytes())
            .map_err(|e| ChainError::Wallet(e.to_string()))?;
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Wallet from the hex secret stored in an environment variable
    pub fn from_env(var: &str) -> Result<Self, ChainError> {
        let secret = std::env::var(var)
            .map_err(|_| ChainError::Wallet(format!("environment variable {var} is not set")))?;
        Self::from_secret_hex(&secret)
    }

    pub fn bech32(&self) -> &Address {
        &self.address
    }
}

impl TransactionSigner for Ed25519Wallet {
    fn address(&self) -> &str {
        self.address.as_str()
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignerError> {
        Ok(self.signing_key.sign(payload).to_bytes().to_vec())
    }
}

impl fmt::Debug for Ed25519Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Wallet")
            .field("address", &self.address.as_str())
            .finish_non_exhaustive()
    }
}
