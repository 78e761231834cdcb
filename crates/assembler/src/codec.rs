//! Argument codec
//!
//! Top-level arguments are hex strings joined with `@`. Numbers are minimal
//! big-endian bytes (zero is empty), addresses their 32 raw bytes. Values
//! inside a `list` use the nested encoding: fixed-width integers, and
//! a 4-byte length prefix for big integers, buffers and lists.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;
use warp_intents_types::{Address, DataType, EsdtPayment, InputValue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("'{value}' has more than {scale} decimal places")]
    TooPrecise { value: String, scale: u32 },

    #[error("'{value}' does not fit in {ty}")]
    OutOfRange { value: String, ty: String },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("'{0}' is not valid hex")]
    InvalidHex(String),

    #[error("'{0}' is not a boolean")]
    InvalidBool(String),

    #[error("invalid token payment: {0}")]
    InvalidPayment(String),

    #[error("expected {expected}, found {found}")]
    Shape { expected: String, found: String },
}

/// Convert a human amount into atomic units
///
/// `"1.5"` at scale 18 is `1500000000000000000`. Fractions finer than the
/// scale are rejected rather than rounded.
pub fn to_atomic(raw: &str, scale: u32) -> Result<u128, CodecError> {
    let raw = raw.trim();
    let overflow = || CodecError::OutOfRange {
        value: raw.to_string(),
        ty: "u128".to_string(),
    };
    let factor = 10u128.checked_pow(scale).ok_or_else(overflow)?;

    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        let whole: u128 = raw.parse().map_err(|_| overflow())?;
        return whole.checked_mul(factor).ok_or_else(overflow);
    }

    let amount = Decimal::from_str(raw).map_err(|_| CodecError::InvalidNumber(raw.to_string()))?;
    if amount.is_sign_negative() {
        return Err(CodecError::InvalidNumber(raw.to_string()));
    }
    let amount = amount.normalize();
    if amount.scale() > scale {
        return Err(CodecError::TooPrecise {
            value: raw.to_string(),
            scale,
        });
    }
    let mantissa = u128::try_from(amount.mantissa()).map_err(|_| overflow())?;
    let rescale = 10u128
        .checked_pow(scale - amount.scale())
        .ok_or_else(overflow)?;
    mantissa.checked_mul(rescale).ok_or_else(overflow)
}

/// Minimal big-endian bytes; zero encodes as no bytes at all
pub fn minimal_be_bytes(n: u128) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

/// Encodes bound values for one input
#[derive(Debug, Clone, Copy)]
pub struct ArgEncoder {
    /// Decimal scale applied to every amount leaf
    pub scale: Option<u32>,
}

impl ArgEncoder {
    pub fn new(scale: Option<u32>) -> Self {
        Self { scale }
    }

    /// Top-level encoding: one hex string per transaction argument
    pub fn encode(&self, ty: &DataType, value: &InputValue) -> Result<Vec<String>, CodecError> {
        let mut args = Vec::new();
        self.encode_top(ty, value, &mut args)?;
        Ok(args)
    }

    fn encode_top(
        &self,
        ty: &DataType,
        value: &InputValue,
        out: &mut Vec<String>,
    ) -> Result<(), CodecError> {
        match ty {
            DataType::Optional(inner) => self.encode_top(inner, value, out),
            DataType::Variadic(inner) => {
                for item in items(value) {
                    self.encode_top(inner, item, out)?;
                }
                Ok(())
            }
            DataType::Composite(fields) => {
                let parts = composite_parts(value, fields.len())?;
                for (field, part) in fields.iter().zip(parts) {
                    self.encode_top(&field.ty, part, out)?;
                }
                Ok(())
            }
            DataType::List(_) => {
                let mut buf = Vec::new();
                self.encode_nested(ty, value, &mut buf)?;
                out.push(hex::encode(buf));
                Ok(())
            }
            DataType::Esdt => {
                let payment = parse_payment(scalar(value)?)?;
                out.push(hex::encode(payment.token.as_bytes()));
                out.push(hex::encode(minimal_be_bytes(u128::from(payment.nonce))));
                out.push(hex::encode(minimal_be_bytes(
                    self.amount(&payment.amount)?,
                )));
                Ok(())
            }
            _ => {
                out.push(hex::encode(self.scalar_bytes(ty, scalar(value)?)?));
                Ok(())
            }
        }
    }

    /// Nested encoding, used for the members of a `list`
    fn encode_nested(
        &self,
        ty: &DataType,
        value: &InputValue,
        buf: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        match ty {
            DataType::Optional(inner) => {
                if value.is_blank() {
                    buf.push(0);
                } else {
                    buf.push(1);
                    self.encode_nested(inner, value, buf)?;
                }
                Ok(())
            }
            DataType::Variadic(inner) | DataType::List(inner) => {
                let list = items(value);
                push_len(buf, list.len());
                for item in list {
                    self.encode_nested(inner, item, buf)?;
                }
                Ok(())
            }
            DataType::Composite(fields) => {
                let parts = composite_parts(value, fields.len())?;
                for (field, part) in fields.iter().zip(parts) {
                    self.encode_nested(&field.ty, part, buf)?;
                }
                Ok(())
            }
            DataType::Esdt => {
                let payment = parse_payment(scalar(value)?)?;
                push_buffer(buf, payment.token.as_bytes());
                buf.extend_from_slice(&payment.nonce.to_be_bytes());
                push_buffer(buf, &minimal_be_bytes(self.amount(&payment.amount)?));
                Ok(())
            }
            DataType::Uint64 | DataType::Uint32 | DataType::Uint16 | DataType::Uint8 => {
                let raw = scalar(value)?;
                let n = self.amount(raw)?;
                let width = fixed_width(ty);
                check_range(raw, ty, n)?;
                buf.extend_from_slice(&n.to_be_bytes()[16 - width..]);
                Ok(())
            }
            DataType::Bool => {
                buf.push(parse_bool(scalar(value)?)? as u8);
                Ok(())
            }
            DataType::Address => {
                buf.extend_from_slice(&self.scalar_bytes(ty, scalar(value)?)?);
                Ok(())
            }
            _ => {
                let bytes = self.scalar_bytes(ty, scalar(value)?)?;
                push_buffer(buf, &bytes);
                Ok(())
            }
        }
    }

    fn scalar_bytes(&self, ty: &DataType, raw: &str) -> Result<Vec<u8>, CodecError> {
        let raw = raw.trim();
        match ty {
            DataType::BigUint | DataType::Numeric => Ok(minimal_be_bytes(self.amount(raw)?)),
            DataType::Uint64 | DataType::Uint32 | DataType::Uint16 | DataType::Uint8 => {
                let n = self.amount(raw)?;
                check_range(raw, ty, n)?;
                Ok(minimal_be_bytes(n))
            }
            DataType::Bool => Ok(if parse_bool(raw)? { vec![1] } else { Vec::new() }),
            DataType::Address => Address::from_bech32(raw)
                .map(|a| a.as_bytes().to_vec())
                .map_err(|e| CodecError::InvalidAddress(e.to_string())),
            DataType::Hex => {
                let digits = raw.strip_prefix("0x").unwrap_or(raw);
                let padded = if digits.len() % 2 == 1 {
                    format!("0{digits}")
                } else {
                    digits.to_string()
                };
                hex::decode(padded).map_err(|_| CodecError::InvalidHex(raw.to_string()))
            }
            DataType::Token | DataType::String => Ok(raw.as_bytes().to_vec()),
            other => Err(CodecError::Shape {
                expected: "a scalar type".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn amount(&self, raw: &str) -> Result<u128, CodecError> {
        to_atomic(raw, self.scale.unwrap_or(0))
    }
}

fn items(value: &InputValue) -> Vec<&InputValue> {
    match value {
        InputValue::List(list) => list.iter().collect(),
        InputValue::Scalar(s) if s.trim().is_empty() => Vec::new(),
        scalar => vec![scalar],
    }
}

fn composite_parts(value: &InputValue, expected: usize) -> Result<&[InputValue], CodecError> {
    match value {
        InputValue::List(parts) if parts.len() == expected => Ok(parts.as_slice()),
        other => Err(CodecError::Shape {
            expected: format!("{expected} composite fields"),
            found: other.to_string(),
        }),
    }
}

fn scalar(value: &InputValue) -> Result<&str, CodecError> {
    value.as_scalar().ok_or_else(|| CodecError::Shape {
        expected: "a single value".to_string(),
        found: value.to_string(),
    })
}

pub(crate) fn parse_payment(raw: &str) -> Result<EsdtPayment, CodecError> {
    raw.parse()
        .map_err(|e: warp_intents_types::ParseError| CodecError::InvalidPayment(e.to_string()))
}

fn parse_bool(raw: &str) -> Result<bool, CodecError> {
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(CodecError::InvalidBool(other.to_string())),
    }
}

fn fixed_width(ty: &DataType) -> usize {
    match ty {
        DataType::Uint64 => 8,
        DataType::Uint32 => 4,
        DataType::Uint16 => 2,
        _ => 1,
    }
}

fn check_range(raw: &str, ty: &DataType, n: u128) -> Result<(), CodecError> {
    let max = match ty {
        DataType::Uint64 => u128::from(u64::MAX),
        DataType::Uint32 => u128::from(u32::MAX),
        DataType::Uint16 => u128::from(u16::MAX),
        DataType::Uint8 => u128::from(u8::MAX),
        _ => u128::MAX,
    };
    if n > max {
        return Err(CodecError::OutOfRange {
            value: raw.to_string(),
            ty: ty.to_string(),
        });
    }
    Ok(())
}

fn push_len(buf: &mut Vec<u8>, len: usize) {
    buf.extend_from_slice(&(len as u32).to_be_bytes());
}

fn push_buffer(buf: &mut Vec<u8>, bytes: &[u8]) {
    push_len(buf, bytes.len());
    buf.extend_from_slice(bytes);
}
