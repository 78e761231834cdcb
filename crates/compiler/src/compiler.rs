use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};
use warp_intents_catalog::TemplateCatalog;
use warp_intents_types::{
    Action, ActionKind, Address, DataType, DirectCall, Input, InputConstraints, InputPosition,
    InputValue, IntentParams, SourceKind, Styling, Warp, DEFAULT_CREATOR, EGLD_DECIMALS,
};

use crate::constraints::check_input;
use crate::normalize::PositionNormalizer;
use crate::CompileError;

/// Preview image for Warps built from raw contract coordinates
pub const DIRECT_CALL_PREVIEW: &str = "https://api.dicebear.com/7.x/icons/svg?seed=";

/// Binds resolved intents into Warps
#[derive(Debug, Clone)]
pub struct WarpCompiler {
    catalog: Arc<TemplateCatalog>,
    normalizer: PositionNormalizer,
    creator: String,
}

impl WarpCompiler {
    pub fn new(catalog: Arc<TemplateCatalog>) -> Self {
        Self {
            catalog,
            normalizer: PositionNormalizer::default(),
            creator: DEFAULT_CREATOR.to_string(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: PositionNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Creator recorded in the metadata of every compiled Warp
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Bind `params` into the template registered for `intent_id`
    pub fn compile(
        &self,
        intent_id: &str,
        params: &IntentParams,
        styling: Option<Styling>,
    ) -> Result<Warp, CompileError> {
        self.compile_at(intent_id, params, styling, Utc::now())
    }

    /// [`WarpCompiler::compile`] with an explicit creation time
    pub fn compile_at(
        &self,
        intent_id: &str,
        params: &IntentParams,
        styling: Option<Styling>,
        now: DateTime<Utc>,
    ) -> Result<Warp, CompileError> {
        let template = self.catalog.get_template(intent_id)?;
        let mut warp = template.warp.clone();

        for name in params.keys() {
            let known = warp
                .actions
                .iter()
                .any(|action| action.input(name).is_some());
            if !known {
                debug!(intent_id, input = %name, "ignoring parameter with no matching input");
            }
        }

        for action in &mut warp.actions {
            bind_inputs(action, params)?;
        }

        let warp = self.finish(warp, styling, now)?;
        info!(
            intent_id,
            actions = warp.actions.len(),
            params = params.len(),
            "compiled warp"
        );
        Ok(warp)
    }

    /// Wrap raw contract coordinates in a one-action Warp
    pub fn compile_direct(
        &self,
        call: &DirectCall,
        styling: Option<Styling>,
    ) -> Result<Warp, CompileError> {
        self.compile_direct_at(call, styling, Utc::now())
    }

    pub fn compile_direct_at(
        &self,
        call: &DirectCall,
        styling: Option<Styling>,
        now: DateTime<Utc>,
    ) -> Result<Warp, CompileError> {
        Address::from_bech32(&call.contract_address)
            .map_err(|e| CompileError::invalid("contractAddress", e.to_string()))?;
        if call.function_name.trim().is_empty() {
            return Err(CompileError::invalid(
                "functionName",
                "a function name is required",
            ));
        }

        let mut inputs: Vec<Input> = call
            .args
            .iter()
            .enumerate()
            .map(|(idx, arg)| {
                literal_input(
                    format!("arg{idx}"),
                    DataType::infer(arg),
                    InputPosition::Arg(idx as u32),
                    arg,
                )
            })
            .collect();

        let value = call.value.trim();
        let value_amount = if is_zero(value) {
            None
        } else {
            let mut input = literal_input(
                "value".to_string(),
                DataType::Numeric,
                InputPosition::Value,
                value,
            );
            input.scale = Some(EGLD_DECIMALS);
            inputs.push(input);
            Some(value.to_string())
        };

        let function = call.function_name.trim();
        let warp = Warp {
            protocol_version: String::new(),
            name: format!("Call {function}"),
            title: format!("Call {function}"),
            description: format!("Calls {function} on {}", call.contract_address),
            preview_uri: format!("{DIRECT_CALL_PREVIEW}{function}"),
            actions: vec![Action {
                kind: ActionKind::ContractCall,
                label: function.to_string(),
                description: String::new(),
                target_address: call.contract_address.clone(),
                function_name: function.to_string(),
                gas_limit: Some(call.gas_limit),
                value_amount,
                inputs,
            }],
            meta: None,
            styling: None,
        };

        for action in &warp.actions {
            for input in &action.inputs {
                if let Some(value) = &input.bound_value {
                    check_input(input, value)?;
                }
            }
        }

        let warp = self.finish(warp, styling, now)?;
        info!(
            function,
            contract = %call.contract_address,
            args = call.args.len(),
            "compiled direct call"
        );
        Ok(warp)
    }

    /// Complete an externally supplied Warp
    ///
    /// Fills in protocol version and metadata, applies position
    /// normalization and re-validates. Existing metadata keeps its
    /// creation time.
    pub fn normalize(&self, warp: Warp) -> Result<Warp, CompileError> {
        let styling = warp.styling.clone();
        self.finish(warp, styling, Utc::now())
    }

    fn finish(
        &self,
        mut warp: Warp,
        styling: Option<Styling>,
        now: DateTime<Utc>,
    ) -> Result<Warp, CompileError> {
        self.normalizer.apply(&mut warp);
        for action in &mut warp.actions {
            sync_value_amount(action);
        }
        if styling.is_some() {
            warp.styling = styling;
        }
        warp.validate()?;
        warp.ensure_meta(&self.creator, now)?;
        Ok(warp)
    }
}

fn bind_inputs(action: &mut Action, params: &IntentParams) -> Result<(), CompileError> {
    for input in &mut action.inputs {
        let value = params
            .get(&input.name)
            .filter(|v| !v.is_blank())
            .or(input.default.as_ref())
            .filter(|v| !v.is_blank())
            .cloned();
        if let Some(value) = &value {
            check_input(input, value)?;
        }
        if value.is_some() {
            input.bound_value = value;
        }
    }
    Ok(())
}

/// Keep the action's human value equal to whatever is bound at `value`
fn sync_value_amount(action: &mut Action) {
    if action.kind == ActionKind::Query {
        return;
    }
    let bound = action
        .input_at(InputPosition::Value)
        .and_then(|input| input.bound_value.as_ref())
        .and_then(InputValue::as_scalar)
        .map(str::to_string);
    if let Some(value) = bound {
        action.value_amount = Some(value);
    }
}

fn literal_input(name: String, data_type: DataType, position: InputPosition, raw: &str) -> Input {
    Input {
        name,
        description: String::new(),
        data_type,
        position,
        source_kind: SourceKind::Literal,
        required: true,
        constraints: InputConstraints::default(),
        scale: None,
        default: None,
        bound_value: Some(InputValue::scalar(raw.trim())),
    }
}

fn is_zero(value: &str) -> bool {
    value.is_empty() || value.parse::<Decimal>().map(|d| d.is_zero()).unwrap_or(false)
}
