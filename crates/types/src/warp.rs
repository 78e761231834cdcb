use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{DataType, ParseError, WarpError, PROTOCOL_VERSION};

/// Default creator recorded in generated Warp metadata
pub const DEFAULT_CREATOR: &str = "system";

pub const DEFAULT_PRIMARY_COLOR: &str = "#4161FF";
pub const DEFAULT_SECONDARY_COLOR: &str = "#8A6FFF";

/// A versioned, replayable description of one or more on-chain actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warp {
    // ═══════════════════════════════════════════════════════════════════════════
    // HEADER
    // ═══════════════════════════════════════════════════════════════════════════

    /// Protocol version, e.g. `warp:0.5.0`
    #[serde(rename = "protocol", default)]
    pub protocol_version: String,

    pub name: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Preview image shown by Warp clients
    #[serde(rename = "preview", default)]
    pub preview_uri: String,

    // ═══════════════════════════════════════════════════════════════════════════
    // BODY
    // ═══════════════════════════════════════════════════════════════════════════

    pub actions: Vec<Action>,

    // ═══════════════════════════════════════════════════════════════════════════
    // METADATA
    // ═══════════════════════════════════════════════════════════════════════════

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<WarpMeta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styling: Option<Styling>,
}

impl Warp {
    /// Structural checks that hold for every well-formed Warp
    pub fn validate(&self) -> Result<(), WarpError> {
        if self.actions.is_empty() {
            return Err(WarpError::NoActions);
        }
        for action in &self.actions {
            action.validate()?;
        }
        Ok(())
    }

    /// Canonical JSON bytes with metadata stripped
    ///
    /// Two Warps compiled from the same template and parameters produce the
    /// same bytes regardless of when they were created.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, WarpError> {
        let mut body = self.clone();
        body.meta = None;
        Ok(serde_json::to_vec(&body)?)
    }

    /// Lowercase hex SHA-256 of [`Warp::canonical_bytes`]
    pub fn content_hash(&self) -> Result<String, WarpError> {
        let digest = Sha256::digest(self.canonical_bytes()?);
        Ok(hex::encode(digest))
    }

    /// Stamp protocol version and metadata if they are missing
    ///
    /// `createdAt` is only ever written once; an existing `meta` keeps its
    /// timestamp and only has its content hash refreshed.
    pub fn ensure_meta(&mut self, creator: &str, now: DateTime<Utc>) -> Result<(), WarpError> {
        if self.protocol_version.is_empty() {
            self.protocol_version = PROTOCOL_VERSION.to_string();
        }
        let content_hash = self.content_hash()?;
        match &mut self.meta {
            Some(meta) => meta.content_hash = content_hash,
            None => {
                self.meta = Some(WarpMeta {
                    creator: creator.to_string(),
                    created_at: now,
                    content_hash,
                })
            }
        }
        Ok(())
    }

    /// Actions that produce a transaction when executed
    pub fn executable_actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(|a| a.kind != ActionKind::Query)
    }
}

/// Provenance of a Warp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarpMeta {
    pub creator: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "hash")]
    pub content_hash: String,
}

/// Client-side colours for rendering a Warp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Styling {
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,
}

impl Styling {
    /// Fill whichever colour the caller left out
    pub fn with_defaults(primary: Option<String>, secondary: Option<String>) -> Self {
        Self {
            primary_color: primary.unwrap_or_else(default_primary_color),
            secondary_color: secondary.unwrap_or_else(default_secondary_color),
        }
    }
}

impl Default for Styling {
    fn default() -> Self {
        Self::with_defaults(None, None)
    }
}

fn default_primary_color() -> String {
    DEFAULT_PRIMARY_COLOR.to_string()
}

fn default_secondary_color() -> String {
    DEFAULT_SECONDARY_COLOR.to_string()
}

/// What an action does on chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "contract", alias = "contractCall", alias = "sc-call")]
    ContractCall,
    #[serde(rename = "query")]
    Query,
    #[serde(rename = "transfer")]
    Transfer,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::ContractCall => "contract",
            ActionKind::Query => "query",
            ActionKind::Transfer => "transfer",
        };
        f.write_str(s)
    }
}

/// One executable step of a Warp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,

    pub label: String,

    #[serde(default)]
    pub description: String,

    /// Contract or recipient address; may be empty when an input fills `receiver`
    #[serde(rename = "address", default)]
    pub target_address: String,

    #[serde(rename = "func", default)]
    pub function_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,

    /// Human amount of native token attached to the call
    #[serde(rename = "value", default, skip_serializing_if = "Option::is_none")]
    pub value_amount: Option<String>,

    #[serde(default)]
    pub inputs: Vec<Input>,
}

impl Action {
    pub fn validate(&self) -> Result<(), WarpError> {
        let invalid = |reason: &str| WarpError::InvalidAction {
            label: self.label.clone(),
            reason: reason.to_string(),
        };

        match self.kind {
            ActionKind::Query => {
                if self.value_amount.is_some()
                    || self.inputs.iter().any(|i| i.position == InputPosition::Value)
                {
                    return Err(invalid("query actions cannot carry a value"));
                }
            }
            ActionKind::ContractCall => {
                if self.gas_limit.is_none() {
                    return Err(invalid("contract calls require a gas limit"));
                }
                if self.function_name.is_empty() {
                    return Err(invalid("contract calls require a function name"));
                }
            }
            ActionKind::Transfer => {}
        }

        let mut seen = HashSet::new();
        for input in &self.inputs {
            if !seen.insert(input.position) {
                return Err(WarpError::DuplicatePosition {
                    label: self.label.clone(),
                    position: input.position.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn input_at(&self, position: InputPosition) -> Option<&Input> {
        self.inputs.iter().find(|i| i.position == position)
    }
}

/// A named, typed, positioned parameter slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type")]
    pub data_type: DataType,

    pub position: InputPosition,

    #[serde(rename = "source", default)]
    pub source_kind: SourceKind,

    #[serde(default = "default_required")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "InputConstraints::is_empty")]
    pub constraints: InputConstraints,

    /// Decimal places used to convert a human amount into atomic units
    #[serde(
        rename = "modifier",
        default,
        skip_serializing_if = "Option::is_none",
        with = "scale_modifier"
    )]
    pub scale: Option<u32>,

    /// Template default applied when no parameter is supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<InputValue>,

    #[serde(rename = "value", default, skip_serializing_if = "Option::is_none")]
    pub bound_value: Option<InputValue>,
}

fn default_required() -> bool {
    true
}

/// Where a bound input lands in the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InputPosition {
    Value,
    Receiver,
    Transfer,
    Arg(u32),
}

impl fmt::Display for InputPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputPosition::Value => f.write_str("value"),
            InputPosition::Receiver => f.write_str("receiver"),
            InputPosition::Transfer => f.write_str("transfer"),
            InputPosition::Arg(n) => write!(f, "arg:{n}"),
        }
    }
}

impl FromStr for InputPosition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "value" => return Ok(InputPosition::Value),
            "receiver" => return Ok(InputPosition::Receiver),
            "transfer" => return Ok(InputPosition::Transfer),
            _ => {}
        }
        let index = s
            .strip_prefix("arg:")
            .or_else(|| s.strip_prefix("arguments."))
            .ok_or_else(|| ParseError::InvalidPosition(s.to_string()))?;
        index
            .parse::<u32>()
            .map(InputPosition::Arg)
            .map_err(|_| ParseError::InvalidPosition(s.to_string()))
    }
}

impl TryFrom<String> for InputPosition {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InputPosition> for String {
    fn from(position: InputPosition) -> Self {
        position.to_string()
    }
}

/// Whether an input is fixed by the template or filled by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Literal,
    #[default]
    Field,
}

/// Limits a bound value must respect
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(rename = "options", default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl InputConstraints {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.pattern.is_none() && self.allowed_values.is_empty()
    }
}

/// A bound value: a scalar, or a nested list for variadic and composite types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Scalar(String),
    List(Vec<InputValue>),
}

impl InputValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        InputValue::Scalar(value.into())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            InputValue::Scalar(s) => Some(s),
            InputValue::List(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            InputValue::Scalar(s) => s.trim().is_empty(),
            InputValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Scalar(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        InputValue::Scalar(value)
    }
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Scalar(s) => f.write_str(s),
            InputValue::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// `scale:N` modifier strings
mod scale_modifier {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(scale: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match scale {
            Some(n) => serializer.serialize_str(&format!("scale:{n}")),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => s
                .strip_prefix("scale:")
                .and_then(|n| n.parse().ok())
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid modifier '{s}'"))),
        }
    }
}
