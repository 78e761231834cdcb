use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use warp_intents_types::{
    Action, ActionKind, Address, DataType, DirectCall, InputPosition, InputValue,
    UnsignedTransaction, Warp, DEFAULT_CHAIN_ID, DEFAULT_GAS_PRICE, EGLD_DECIMALS,
};

use crate::codec::{minimal_be_bytes, parse_payment, to_atomic, ArgEncoder, CodecError};
use crate::gas::{GasEstimator, LinearGasEstimator};
use crate::AssemblyError;

/// What to build a transaction from
#[derive(Debug, Clone, Copy)]
pub enum AssemblySource<'a> {
    Warp(&'a Warp),
    Direct(&'a DirectCall),
}

/// Builds unsigned transactions; never touches the network
#[derive(Debug, Clone)]
pub struct TransactionAssembler {
    estimator: Arc<dyn GasEstimator>,
    chain_id: String,
    gas_price: u64,
    /// Token identifier to decimals; wins over the input's scale
    token_decimals: BTreeMap<String, u32>,
}

impl Default for TransactionAssembler {
    fn default() -> Self {
        Self::new(Arc::new(LinearGasEstimator::default()))
    }
}

impl TransactionAssembler {
    pub fn new(estimator: Arc<dyn GasEstimator>) -> Self {
        Self {
            estimator,
            chain_id: DEFAULT_CHAIN_ID.to_string(),
            gas_price: DEFAULT_GAS_PRICE,
            token_decimals: BTreeMap::new(),
        }
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = chain_id.into();
        self
    }

    pub fn with_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_token_decimals(mut self, token_decimals: BTreeMap<String, u32>) -> Self {
        self.token_decimals = token_decimals;
        self
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Build the transaction for a Warp or a direct call
    ///
    /// A Warp with exactly one executable action becomes a call to that
    /// action's target. Anything else (several actions, or only queries) is
    /// published as an inscription.
    pub fn assemble(
        &self,
        source: AssemblySource<'_>,
        sender: &str,
        gas_override: Option<u64>,
    ) -> Result<UnsignedTransaction, AssemblyError> {
        match source {
            AssemblySource::Warp(warp) => {
                warp.validate()?;
                match warp.actions.as_slice() {
                    [action] if action.kind != ActionKind::Query => {
                        self.assemble_action(action, sender, gas_override)
                    }
                    _ => self.inscribe(warp, sender, gas_override),
                }
            }
            AssemblySource::Direct(call) => self.assemble_direct(call, sender, gas_override),
        }
    }

    /// A transaction that calls one action
    pub fn assemble_action(
        &self,
        action: &Action,
        sender: &str,
        gas_override: Option<u64>,
    ) -> Result<UnsignedTransaction, AssemblyError> {
        action.validate()?;
        let sender = parse_address("sender", sender)?;
        let built = self.build_action(action, &sender)?;

        let gas_limit = gas_override
            .or(action.gas_limit)
            .unwrap_or_else(|| self.estimator.estimate(&[action.kind], built.payload.len()));

        debug!(
            action = %action.label,
            receiver = %built.receiver,
            payload_len = built.payload.len(),
            gas_limit,
            "assembled action transaction"
        );

        Ok(self
            .transaction(sender.as_str(), &built.receiver)
            .with_value(built.value.to_string())
            .with_gas_limit(gas_limit)
            .with_payload(built.payload))
    }

    /// Publish the whole Warp document as a self-addressed transaction
    ///
    /// Required inputs of executable actions must still be bound.
    pub fn inscribe(
        &self,
        warp: &Warp,
        sender: &str,
        gas_override: Option<u64>,
    ) -> Result<UnsignedTransaction, AssemblyError> {
        warp.validate()?;
        let sender = parse_address("sender", sender)?;
        for action in warp.executable_actions() {
            check_required(action)?;
        }

        let payload =
            serde_json::to_vec(warp).map_err(|e| AssemblyError::Serialization(e.to_string()))?;
        let kinds: Vec<ActionKind> = warp.actions.iter().map(|a| a.kind).collect();
        let gas_limit =
            gas_override.unwrap_or_else(|| self.estimator.estimate(&kinds, payload.len()));

        debug!(
            warp = %warp.name,
            actions = kinds.len(),
            payload_len = payload.len(),
            gas_limit,
            "assembled inscription transaction"
        );

        Ok(self
            .transaction(sender.as_str(), sender.as_str())
            .with_gas_limit(gas_limit)
            .with_payload(payload))
    }

    fn assemble_direct(
        &self,
        call: &DirectCall,
        sender: &str,
        gas_override: Option<u64>,
    ) -> Result<UnsignedTransaction, AssemblyError> {
        let sender = parse_address("sender", sender)?;
        let contract = parse_address("contractAddress", &call.contract_address)?;
        let encoder = ArgEncoder::new(None);

        let mut parts = vec![call.function_name.trim().to_string()];
        for (idx, arg) in call.args.iter().enumerate() {
            let encoded = encoder
                .encode(&DataType::infer(arg), &InputValue::scalar(arg.trim()))
                .map_err(|source| AssemblyError::Encoding {
                    input: format!("arg{idx}"),
                    source,
                })?;
            parts.extend(encoded);
        }
        let payload = parts.join("@");
        let value = to_atomic(&call.value, EGLD_DECIMALS).map_err(|source| {
            AssemblyError::Encoding {
                input: "value".to_string(),
                source,
            }
        })?;

        debug!(
            function = %call.function_name,
            contract = %contract,
            args = call.args.len(),
            "assembled direct call"
        );

        Ok(self
            .transaction(sender.as_str(), contract.as_str())
            .with_value(value.to_string())
            .with_gas_limit(gas_override.unwrap_or(call.gas_limit))
            .with_payload(payload))
    }

    fn transaction(&self, sender: &str, receiver: &str) -> UnsignedTransaction {
        UnsignedTransaction::new(sender, receiver)
            .with_chain_id(self.chain_id.clone())
            .with_gas_price(self.gas_price)
    }

    fn build_action(
        &self,
        action: &Action,
        sender: &Address,
    ) -> Result<BuiltAction, AssemblyError> {
        check_required(action)?;

        let mut value: Option<u128> = None;
        let mut receiver: Option<Address> = None;
        let mut payment = None;
        let mut args: BTreeMap<u32, Vec<String>> = BTreeMap::new();

        for input in &action.inputs {
            let Some(bound) = input.bound_value.as_ref().filter(|v| !v.is_blank()) else {
                continue;
            };
            let encoding = |source: CodecError| AssemblyError::Encoding {
                input: input.name.clone(),
                source,
            };
            let scalar = || {
                bound.as_scalar().ok_or_else(|| {
                    encoding(CodecError::Shape {
                        expected: "a single value".to_string(),
                        found: bound.to_string(),
                    })
                })
            };

            match input.position {
                InputPosition::Value => {
                    let atomic = to_atomic(scalar()?, input.scale.unwrap_or(0));
                    value = Some(atomic.map_err(encoding)?);
                }
                InputPosition::Receiver => {
                    receiver = Some(parse_address(&input.name, scalar()?)?);
                }
                InputPosition::Transfer => {
                    let parsed = parse_payment(scalar()?).map_err(encoding)?;
                    let scale = self
                        .token_decimals
                        .get(&parsed.token)
                        .copied()
                        .or(input.scale)
                        .unwrap_or(0);
                    let amount = to_atomic(&parsed.amount, scale).map_err(encoding)?;
                    payment = Some((parsed, amount));
                }
                InputPosition::Arg(n) => {
                    let encoded = ArgEncoder::new(input.scale)
                        .encode(&input.data_type, bound)
                        .map_err(encoding)?;
                    args.insert(n, encoded);
                }
            }
        }

        let value = match (value, action.value_amount.as_deref()) {
            (Some(v), _) => v,
            (None, Some(human)) => to_atomic(human, EGLD_DECIMALS).map_err(|source| {
                AssemblyError::Encoding {
                    input: "value".to_string(),
                    source,
                }
            })?,
            (None, None) => 0,
        };

        let receiver = match receiver {
            Some(r) => r,
            None if action.target_address.trim().is_empty() => {
                return Err(AssemblyError::MissingReceiver {
                    action: action.label.clone(),
                })
            }
            None => parse_address("address", &action.target_address)?,
        };

        let call_args: Vec<String> = args.into_values().flatten().collect();
        let function = action.function_name.trim();

        let Some((payment, amount)) = payment else {
            let payload = if function.is_empty() {
                String::new()
            } else {
                std::iter::once(function.to_string())
                    .chain(call_args)
                    .collect::<Vec<_>>()
                    .join("@")
            };
            return Ok(BuiltAction {
                receiver: receiver.to_string(),
                value,
                payload,
            });
        };

        if value > 0 {
            return Err(AssemblyError::ValueWithTokenTransfer {
                action: action.label.clone(),
            });
        }

        let mut parts = Vec::new();
        let tx_receiver = if payment.is_fungible() {
            parts.push("ESDTTransfer".to_string());
            parts.push(hex::encode(payment.token.as_bytes()));
            parts.push(hex::encode(minimal_be_bytes(amount)));
            receiver.to_string()
        } else {
            // NFT and SFT transfers are sent to self and name the real receiver
            parts.push("ESDTNFTTransfer".to_string());
            parts.push(hex::encode(payment.token.as_bytes()));
            parts.push(hex::encode(minimal_be_bytes(u128::from(payment.nonce))));
            parts.push(hex::encode(minimal_be_bytes(amount)));
            parts.push(receiver.to_hex());
            sender.to_string()
        };
        if !function.is_empty() {
            parts.push(hex::encode(function.as_bytes()));
            parts.extend(call_args);
        }

        Ok(BuiltAction {
            receiver: tx_receiver,
            value: 0,
            payload: parts.join("@"),
        })
    }
}

struct BuiltAction {
    receiver: String,
    value: u128,
    payload: String,
}

fn check_required(action: &Action) -> Result<(), AssemblyError> {
    let missing = action.inputs.iter().find(|input| {
        input.required
            && input
                .bound_value
                .as_ref()
                .map_or(true, InputValue::is_blank)
            && !matches!(input.data_type, DataType::Optional(_))
    });
    match missing {
        Some(input) => Err(AssemblyError::MissingParameter {
            action: action.label.clone(),
            input: input.name.clone(),
        }),
        None => Ok(()),
    }
}

fn parse_address(field: &str, raw: &str) -> Result<Address, AssemblyError> {
    Address::from_bech32(raw.trim()).map_err(|e| AssemblyError::InvalidAddress {
        field: field.to_string(),
        reason: e.to_string(),
    })
}
