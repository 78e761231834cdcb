use regex::Regex;
use rust_decimal::Decimal;
use warp_intents_types::{Address, DataType, EsdtPayment, Input, InputConstraints, InputValue};

use crate::CompileError;

/// Check a bound value against its input's type and constraints
pub fn check_input(input: &Input, value: &InputValue) -> Result<(), CompileError> {
    let pattern = match &input.constraints.pattern {
        Some(p) => Some(
            Regex::new(p)
                .map_err(|e| CompileError::invalid(&input.name, format!("bad pattern: {e}")))?,
        ),
        None => None,
    };
    let checker = Checker {
        input: &input.name,
        constraints: &input.constraints,
        pattern,
    };
    checker.check(&input.data_type, value)
}

struct Checker<'a> {
    input: &'a str,
    constraints: &'a InputConstraints,
    pattern: Option<Regex>,
}

impl Checker<'_> {
    fn fail(&self, reason: impl Into<String>) -> CompileError {
        CompileError::invalid(self.input, reason)
    }

    fn check(&self, ty: &DataType, value: &InputValue) -> Result<(), CompileError> {
        match (ty, value) {
            (DataType::Optional(inner), _) => self.check(inner, value),
            (DataType::Variadic(inner) | DataType::List(inner), InputValue::List(items)) => {
                items.iter().try_for_each(|item| self.check(inner, item))
            }
            // a lone scalar is a one-element list
            (DataType::Variadic(inner) | DataType::List(inner), InputValue::Scalar(_)) => {
                self.check(inner, value)
            }
            (DataType::Composite(fields), InputValue::List(parts)) => {
                if fields.len() != parts.len() {
                    return Err(self.fail(format!(
                        "expected {} composite fields, got {}",
                        fields.len(),
                        parts.len()
                    )));
                }
                fields
                    .iter()
                    .zip(parts)
                    .try_for_each(|(field, part)| self.check(&field.ty, part))
            }
            (DataType::Composite(_), InputValue::Scalar(s)) => {
                Err(self.fail(format!("expected a composite value, got '{s}'")))
            }
            (_, InputValue::List(_)) => Err(self.fail(format!("type {ty} takes a single value"))),
            (_, InputValue::Scalar(raw)) => self.check_scalar(ty, raw.trim()),
        }
    }

    fn check_scalar(&self, ty: &DataType, raw: &str) -> Result<(), CompileError> {
        match ty {
            DataType::Esdt => {
                let payment: EsdtPayment = raw.parse().map_err(|e| self.fail(format!("{e}")))?;
                self.check_allowed(&payment.token)?;
                self.check_amount(&payment.amount)
            }
            _ if ty.is_amount() => {
                self.check_pattern(raw)?;
                self.check_amount(raw)
            }
            DataType::Address => {
                Address::from_bech32(raw).map_err(|e| self.fail(e.to_string()))?;
                self.check_pattern(raw)?;
                self.check_allowed(raw)
            }
            DataType::Bool => match raw {
                "true" | "false" | "1" | "0" => Ok(()),
                _ => Err(self.fail(format!("'{raw}' is not a boolean"))),
            },
            _ => {
                self.check_pattern(raw)?;
                self.check_allowed(raw)
            }
        }
    }

    fn check_amount(&self, raw: &str) -> Result<(), CompileError> {
        let amount: Decimal = raw
            .parse()
            .map_err(|_| self.fail(format!("'{raw}' is not a number")))?;
        if amount.is_sign_negative() {
            return Err(self.fail(format!("'{raw}' is negative")));
        }
        if let Some(min) = self.constraints.min {
            if amount < min {
                return Err(self.fail(format!("{raw} is below the minimum of {min}")));
            }
        }
        Ok(())
    }

    fn check_pattern(&self, raw: &str) -> Result<(), CompileError> {
        match &self.pattern {
            Some(re) if !re.is_match(raw) => {
                Err(self.fail(format!("'{raw}' does not match {}", re.as_str())))
            }
            _ => Ok(()),
        }
    }

    fn check_allowed(&self, raw: &str) -> Result<(), CompileError> {
        let allowed = &self.constraints.allowed_values;
        if allowed.is_empty() || allowed.iter().any(|a| a == raw) {
            Ok(())
        } else {
            Err(self.fail(format!("'{raw}' is not one of {}", allowed.join(", "))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp_intents_types::{InputPosition, SourceKind};

    fn input(ty: &str, constraints: InputConstraints) -> Input {
        Input {
            name: "Amount".to_string(),
            description: String::new(),
            data_type: ty.parse().unwrap(),
            position: InputPosition::Value,
            source_kind: SourceKind::Field,
            required: true,
            constraints,
            scale: None,
            default: None,
            bound_value: None,
        }
    }

    fn min(value: &str) -> InputConstraints {
        InputConstraints {
            min: Some(value.parse().unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_min_amount() {
        let stake = input("numeric", min("0.1"));
        assert!(check_input(&stake, &"1".into()).is_ok());
        assert!(check_input(&stake, &"0.1".into()).is_ok());
        assert!(matches!(
            check_input(&stake, &"0.05".into()),
            Err(CompileError::InvalidParameter { input, .. }) if input == "Amount"
        ));
    }

    #[test]
    fn test_amount_must_be_numeric() {
        let amount = input("biguint", InputConstraints::default());
        assert!(check_input(&amount, &"lots".into()).is_err());
        assert!(check_input(&amount, &"-1".into()).is_err());
    }

    #[test]
    fn test_esdt_options_compare_token() {
        let payment = input(
            "esdt",
            InputConstraints {
                allowed_values: vec!["XEGLD-23b511".to_string()],
                ..Default::default()
            },
        );
        assert!(check_input(&payment, &"XEGLD-23b511|2".into()).is_ok());
        assert!(check_input(&payment, &"USDC-c76f1f|2".into()).is_err());
        assert!(check_input(&payment, &"XEGLD-23b511".into()).is_err());
    }

    #[test]
    fn test_pattern() {
        let validator = Input {
            data_type: DataType::Address,
            constraints: InputConstraints {
                pattern: Some("^erd1qqqqqqqqqqqqqpgq".to_string()),
                ..Default::default()
            },
            ..input("address", InputConstraints::default())
        };
        assert!(check_input(
            &validator,
            &"erd1qqqqqqqqqqqqqpgqd9rvv2n378e27jcts8vfwynpkm8ng7g7945ssu2js8".into()
        )
        .is_ok());
        assert!(check_input(
            &validator,
            &"erd1709y9mhz6487cfzv6t9xpa6hyxtc5kv4zl4za377tn0tqrhtht6sfrdfta".into()
        )
        .is_err());
    }

    #[test]
    fn test_composite_rows() {
        let rows = input("variadic:composite(address|biguint)", InputConstraints::default());
        let good = InputValue::List(vec![InputValue::List(vec![
            "erd1709y9mhz6487cfzv6t9xpa6hyxtc5kv4zl4za377tn0tqrhtht6sfrdfta".into(),
            "1.5".into(),
        ])]);
        assert!(check_input(&rows, &good).is_ok());

        let short = InputValue::List(vec![InputValue::List(vec!["1.5".into()])]);
        assert!(check_input(&rows, &short).is_err());
    }

    #[test]
    fn test_scalar_type_rejects_list() {
        let amount = input("biguint", InputConstraints::default());
        let value = InputValue::List(vec!["1".into()]);
        assert!(check_input(&amount, &value).is_err());
    }
}
