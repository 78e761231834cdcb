use tracing::debug;
use warp_intents_types::{Action, ActionKind, InputPosition, Warp};

/// Which actions a position rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Contract calls to the named function
    Function(&'static str),
    /// Every action of the given kind
    Kind(ActionKind),
}

impl RuleScope {
    fn applies_to(&self, action: &Action) -> bool {
        match self {
            RuleScope::Function(name) => action.function_name == *name,
            RuleScope::Kind(kind) => action.kind == *kind,
        }
    }
}

/// Pins one named input to a fixed position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRule {
    pub scope: RuleScope,
    pub input: &'static str,
    pub position: InputPosition,
}

impl PositionRule {
    pub const fn new(scope: RuleScope, input: &'static str, position: InputPosition) -> Self {
        Self {
            scope,
            input,
            position,
        }
    }
}

/// Known signatures whose argument layout templates must respect
pub const DEFAULT_POSITION_RULES: &[PositionRule] = &[
    PositionRule::new(
        RuleScope::Function("delegate"),
        "Validator",
        InputPosition::Arg(0),
    ),
    PositionRule::new(
        RuleScope::Function("mint"),
        "Quantity",
        InputPosition::Arg(0),
    ),
    PositionRule::new(
        RuleScope::Function("swapTokensFixedInput"),
        "Min Amount Out",
        InputPosition::Arg(2),
    ),
    PositionRule::new(
        RuleScope::Kind(ActionKind::Transfer),
        "Receiver",
        InputPosition::Receiver,
    ),
];

/// Declarative position fix-ups applied to every compiled Warp
#[derive(Debug, Clone)]
pub struct PositionNormalizer {
    rules: Vec<PositionRule>,
}

impl Default for PositionNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_POSITION_RULES.to_vec())
    }
}

impl PositionNormalizer {
    pub fn new(rules: Vec<PositionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[PositionRule] {
        &self.rules
    }

    /// Apply every matching rule; returns how many inputs moved
    pub fn apply(&self, warp: &mut Warp) -> usize {
        let mut moved = 0;
        for action in &mut warp.actions {
            for rule in &self.rules {
                if !rule.scope.applies_to(action) {
                    continue;
                }
                let Some(input) = action.inputs.iter_mut().find(|i| i.name == rule.input) else {
                    continue;
                };
                if input.position != rule.position {
                    debug!(
                        action = %action.label,
                        input = rule.input,
                        from = %input.position,
                        to = %rule.position,
                        "normalized input position"
                    );
                    input.position = rule.position;
                    moved += 1;
                }
            }
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp_intents_types::{DataType, Input, InputConstraints, SourceKind};

    fn input(name: &str, position: InputPosition) -> Input {
        Input {
            name: name.to_string(),
            description: String::new(),
            data_type: DataType::Address,
            position,
            source_kind: SourceKind::Field,
            required: true,
            constraints: InputConstraints::default(),
            scale: None,
            default: None,
            bound_value: None,
        }
    }

    fn warp_with(kind: ActionKind, function: &str, inputs: Vec<Input>) -> Warp {
        Warp {
            protocol_version: String::new(),
            name: "test".to_string(),
            title: "test".to_string(),
            description: String::new(),
            preview_uri: String::new(),
            actions: vec![Action {
                kind,
                label: "step".to_string(),
                description: String::new(),
                target_address: String::new(),
                function_name: function.to_string(),
                gas_limit: Some(1_000_000),
                value_amount: None,
                inputs,
            }],
            meta: None,
            styling: None,
        }
    }

    #[test]
    fn test_delegate_validator_pinned_to_first_arg() {
        let mut warp = warp_with(
            ActionKind::ContractCall,
            "delegate",
            vec![input("Validator", InputPosition::Arg(3))],
        );
        assert_eq!(PositionNormalizer::default().apply(&mut warp), 1);
        assert_eq!(
            warp.actions[0].inputs[0].position,
            InputPosition::Arg(0)
        );
    }

    #[test]
    fn test_transfer_receiver() {
        let mut warp = warp_with(
            ActionKind::Transfer,
            "",
            vec![input("Receiver", InputPosition::Arg(0))],
        );
        PositionNormalizer::default().apply(&mut warp);
        assert_eq!(warp.actions[0].inputs[0].position, InputPosition::Receiver);
    }

    #[test]
    fn test_other_functions_untouched() {
        let mut warp = warp_with(
            ActionKind::ContractCall,
            "unDelegate",
            vec![input("Validator", InputPosition::Arg(2))],
        );
        assert_eq!(PositionNormalizer::default().apply(&mut warp), 0);
        assert_eq!(warp.actions[0].inputs[0].position, InputPosition::Arg(2));
    }

    #[test]
    fn test_already_normalized_is_noop() {
        let mut warp = warp_with(
            ActionKind::ContractCall,
            "swapTokensFixedInput",
            vec![input("Min Amount Out", InputPosition::Arg(2))],
        );
        assert_eq!(PositionNormalizer::default().apply(&mut warp), 0);
    }
}
