use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Address, ParseError};

/// Declared type of an input slot
///
/// Types are written the way Warp documents spell them: scalar names such as
/// `biguint` or `address`, and wrappers such as `variadic:address`,
/// `list:token` or `composite(address|biguint)`. Composite members may carry
/// a label (`amount:biguint`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    BigUint,
    Numeric,
    Uint64,
    Uint32,
    Uint16,
    Uint8,
    Bool,
    Address,
    Token,
    Esdt,
    String,
    Hex,
    Optional(Box<DataType>),
    Variadic(Box<DataType>),
    List(Box<DataType>),
    Composite(Vec<CompositeField>),
}

/// One member of a `composite(...)` type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeField {
    pub label: Option<String>,
    pub ty: DataType,
}

impl DataType {
    /// Whether a bound value for this type is a list rather than a scalar
    pub fn is_multi_value(&self) -> bool {
        matches!(
            self,
            DataType::Variadic(_) | DataType::List(_) | DataType::Composite(_)
        )
    }

    /// Whether the type holds an amount that can carry a decimal scale
    pub fn is_amount(&self) -> bool {
        matches!(
            self,
            DataType::BigUint
                | DataType::Numeric
                | DataType::Uint64
                | DataType::Uint32
                | DataType::Uint16
                | DataType::Uint8
        )
    }

    /// Best guess at the type of a raw, untyped argument
    ///
    /// Valid account addresses become `address`, unsigned integers `biguint`
    /// and `0x`-prefixed hex `hex`; anything else is passed as a string.
    pub fn infer(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("erd1") && Address::from_bech32(raw).is_ok() {
            return DataType::Address;
        }
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            return DataType::BigUint;
        }
        if let Some(hex) = raw.strip_prefix("0x") {
            if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return DataType::Hex;
            }
        }
        DataType::String
    }

    fn scalar(name: &str) -> Option<Self> {
        let ty = match name {
            "biguint" => DataType::BigUint,
            "numeric" | "number" => DataType::Numeric,
            "uint64" => DataType::Uint64,
            "uint32" => DataType::Uint32,
            "uint16" => DataType::Uint16,
            "uint8" => DataType::Uint8,
            "bool" | "boolean" => DataType::Bool,
            "address" => DataType::Address,
            "token" | "tokenidentifier" => DataType::Token,
            "esdt" => DataType::Esdt,
            "string" => DataType::String,
            "hex" | "bytes" => DataType::Hex,
            _ => return None,
        };
        Some(ty)
    }

    fn parse(raw: &str) -> Result<Self, ParseError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(ParseError::MalformedDataType(raw.to_string()));
        }

        if let Some(inner) = s.strip_prefix("variadic:") {
            return Ok(DataType::Variadic(Box::new(Self::parse(inner)?)));
        }
        if let Some(inner) = s.strip_prefix("optional:") {
            return Ok(DataType::Optional(Box::new(Self::parse(inner)?)));
        }
        if let Some(inner) = s.strip_prefix("list:") {
            return Ok(DataType::List(Box::new(Self::parse(inner)?)));
        }
        if let Some(rest) = s.strip_prefix("composite(") {
            let body = rest
                .strip_suffix(')')
                .ok_or_else(|| ParseError::MalformedDataType(raw.to_string()))?;
            let fields = split_members(body)
                .into_iter()
                .map(CompositeField::parse)
                .collect::<Result<Vec<_>, _>>()?;
            if fields.is_empty() {
                return Err(ParseError::MalformedDataType(raw.to_string()));
            }
            return Ok(DataType::Composite(fields));
        }

        Self::scalar(&s.to_lowercase()).ok_or_else(|| ParseError::UnknownDataType(s.to_string()))
    }
}

impl CompositeField {
    fn parse(member: &str) -> Result<Self, ParseError> {
        let member = member.trim();
        // `label:type` unless the prefix is itself a wrapper keyword
        if let Some((head, tail)) = member.split_once(':') {
            let is_wrapper = matches!(head, "variadic" | "optional" | "list");
            if !is_wrapper && !head.starts_with("composite(") {
                return Ok(Self {
                    label: Some(head.to_string()),
                    ty: DataType::parse(tail)?,
                });
            }
        }
        Ok(Self {
            label: None,
            ty: DataType::parse(member)?,
        })
    }
}

/// Split `a|b|composite(c|d)` on top-level pipes only
fn split_members(body: &str) -> Vec<&str> {
    let mut members = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                members.push(&body[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < body.len() {
        members.push(&body[start..]);
    }
    members.into_iter().filter(|m| !m.trim().is_empty()).collect()
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::BigUint => f.write_str("biguint"),
            DataType::Numeric => f.write_str("numeric"),
            DataType::Uint64 => f.write_str("uint64"),
            DataType::Uint32 => f.write_str("uint32"),
            DataType::Uint16 => f.write_str("uint16"),
            DataType::Uint8 => f.write_str("uint8"),
            DataType::Bool => f.write_str("bool"),
            DataType::Address => f.write_str("address"),
            DataType::Token => f.write_str("token"),
            DataType::Esdt => f.write_str("esdt"),
            DataType::String => f.write_str("string"),
            DataType::Hex => f.write_str("hex"),
            DataType::Optional(inner) => write!(f, "optional:{inner}"),
            DataType::Variadic(inner) => write!(f, "variadic:{inner}"),
            DataType::List(inner) => write!(f, "list:{inner}"),
            DataType::Composite(fields) => {
                f.write_str("composite(")?;
                for (idx, field) in fields.iter().enumerate() {
                    if idx > 0 {
                        f.write_str("|")?;
                    }
                    if let Some(label) = &field.label {
                        write!(f, "{label}:")?;
                    }
                    write!(f, "{}", field.ty)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for DataType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DataType {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DataType> for String {
    fn from(ty: DataType) -> Self {
        ty.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer() {
        assert_eq!(
            DataType::infer("erd1709y9mhz6487cfzv6t9xpa6hyxtc5kv4zl4za377tn0tqrhtht6sfrdfta"),
            DataType::Address
        );
        assert_eq!(DataType::infer(" 1000 "), DataType::BigUint);
        assert_eq!(DataType::infer("0xdeadBEEF"), DataType::Hex);
        assert_eq!(DataType::infer("0x"), DataType::String);
        assert_eq!(DataType::infer("1.5"), DataType::String);
        assert_eq!(DataType::infer("erd1nope"), DataType::String);
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!("biguint".parse::<DataType>().unwrap(), DataType::BigUint);
        assert_eq!("address".parse::<DataType>().unwrap(), DataType::Address);
        assert_eq!("Bool".parse::<DataType>().unwrap(), DataType::Bool);
        assert!("float".parse::<DataType>().is_err());
    }

    #[test]
    fn test_parse_variadic_composite() {
        let ty: DataType = "variadic:composite(address|biguint)".parse().unwrap();
        let DataType::Variadic(inner) = &ty else {
            panic!("expected variadic, got {ty:?}");
        };
        let DataType::Composite(fields) = inner.as_ref() else {
            panic!("expected composite");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].ty, DataType::Address);
        assert_eq!(fields[1].ty, DataType::BigUint);
        assert_eq!(ty.to_string(), "variadic:composite(address|biguint)");
    }

    #[test]
    fn test_parse_labelled_composite_with_nested_list() {
        let raw = "list:composite(token_in:token|amount_in:biguint|arguments:list:string)";
        let ty: DataType = raw.parse().unwrap();
        let DataType::List(inner) = &ty else {
            panic!("expected list");
        };
        let DataType::Composite(fields) = inner.as_ref() else {
            panic!("expected composite");
        };
        assert_eq!(fields[0].label.as_deref(), Some("token_in"));
        assert_eq!(fields[2].ty, DataType::List(Box::new(DataType::String)));
        assert_eq!(ty.to_string(), raw);
    }

    #[test]
    fn test_malformed_composite() {
        assert!("composite(address|biguint".parse::<DataType>().is_err());
        assert!("composite()".parse::<DataType>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let ty: DataType = serde_json::from_str("\"optional:address\"").unwrap();
        assert_eq!(ty, DataType::Optional(Box::new(DataType::Address)));
        assert_eq!(serde_json::to_string(&ty).unwrap(), "\"optional:address\"");
    }
}
