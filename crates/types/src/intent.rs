use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::InputValue;

/// Default gas limit for raw contract calls
pub const DEFAULT_DIRECT_CALL_GAS: u64 = 10_000_000;

/// Parameters extracted from a prompt, keyed by template input name
pub type IntentParams = BTreeMap<String, InputValue>;

/// Outcome of classifying a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Resolution {
    /// A catalog template plus the parameters to bind into it
    #[serde(rename_all = "camelCase")]
    Template {
        intent_id: String,
        params: IntentParams,
    },
    /// Raw contract coordinates supplied by the user
    DirectCall(DirectCall),
}

impl Resolution {
    pub fn template(intent_id: impl Into<String>, params: IntentParams) -> Self {
        Resolution::Template {
            intent_id: intent_id.into(),
            params,
        }
    }

    /// Label used in logs and metrics
    pub fn intent_id(&self) -> &str {
        match self {
            Resolution::Template { intent_id, .. } => intent_id,
            Resolution::DirectCall(_) => "directCall",
        }
    }
}

/// A contract call described by address, function and raw arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectCall {
    pub contract_address: String,
    pub function_name: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Human amount of EGLD attached to the call
    #[serde(default = "default_value")]
    pub value: String,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

impl DirectCall {
    pub fn new(contract_address: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            function_name: function_name.into(),
            args: Vec::new(),
            value: default_value(),
            gas_limit: default_gas_limit(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Comma separated arguments, trimmed, empties dropped
    pub fn with_args_csv(mut self, args: &str) -> Self {
        self.args = args
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }
}

fn default_value() -> String {
    "0".to_string()
}

fn default_gas_limit() -> u64 {
    DEFAULT_DIRECT_CALL_GAS
}
