use std::fmt;
use std::str::FromStr;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};

use crate::AddressError;

/// Human readable part of MultiversX account addresses
pub const ADDRESS_HRP: &str = "erd";

/// Length of a decoded account address (an ed25519 public key or contract id)
pub const ADDRESS_LEN: usize = 32;

/// A checksummed `erd1...` account address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    bech32: String,
    bytes: [u8; ADDRESS_LEN],
}

impl Address {
    /// Parse and checksum-verify a bech32 address
    pub fn from_bech32(address: &str) -> Result<Self, AddressError> {
        let (hrp, data) = bech32::decode(address).map_err(|e| AddressError::InvalidBech32 {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        let prefix = hrp.to_lowercase();
        if prefix != ADDRESS_HRP {
            return Err(AddressError::WrongPrefix {
                address: address.to_string(),
                expected: ADDRESS_HRP.to_string(),
                found: prefix,
            });
        }

        let bytes: [u8; ADDRESS_LEN] =
            data.as_slice()
                .try_into()
                .map_err(|_| AddressError::WrongLength {
                    address: address.to_string(),
                    len: data.len(),
                })?;

        Ok(Self {
            bech32: address.to_lowercase(),
            bytes,
        })
    }

    /// Build an address from raw public key bytes
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Result<Self, AddressError> {
        let hrp = Hrp::parse(ADDRESS_HRP).map_err(|e| AddressError::InvalidBech32 {
            address: hex::encode(bytes),
            reason: e.to_string(),
        })?;
        let bech32 =
            bech32::encode::<Bech32>(hrp, &bytes).map_err(|e| AddressError::InvalidBech32 {
                address: hex::encode(bytes),
                reason: e.to_string(),
            })?;
        Ok(Self { bech32, bytes })
    }

    pub fn as_str(&self) -> &str {
        &self.bech32
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.bytes
    }

    /// Hex form used in call data arguments
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Smart contract addresses start with eight zero bytes
    pub fn is_contract(&self) -> bool {
        self.bytes[..8].iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bech32)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s.trim())
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_bech32(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.bech32
    }
}
