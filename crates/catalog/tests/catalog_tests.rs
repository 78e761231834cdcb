//! Invariants over every entry of the builtin catalog

use warp_intents_catalog::TemplateCatalog;
use warp_intents_types::{ActionKind, Address, InputPosition};

#[test]
fn test_every_contract_address_is_checksummed() {
    let catalog = TemplateCatalog::builtin().unwrap();
    for entry in catalog.iter() {
        for action in entry.actions() {
            if action.target_address.is_empty() {
                assert_eq!(action.kind, ActionKind::Transfer, "{}", entry.id);
                continue;
            }
            let address = Address::from_bech32(&action.target_address)
                .unwrap_or_else(|e| panic!("{}: {e}", entry.id));
            assert!(address.is_contract(), "{} targets a user account", entry.id);
        }
    }
}

#[test]
fn test_address_defaults_are_checksummed() {
    let catalog = TemplateCatalog::builtin().unwrap();
    for entry in catalog.iter() {
        for action in entry.actions() {
            for input in &action.inputs {
                if input.data_type != warp_intents_types::DataType::Address {
                    continue;
                }
                if let Some(default) = input.default.as_ref().and_then(|d| d.as_scalar()) {
                    Address::from_bech32(default)
                        .unwrap_or_else(|e| panic!("{}.{}: {e}", entry.id, input.name));
                }
            }
        }
    }
}

#[test]
fn test_queries_never_carry_value() {
    let catalog = TemplateCatalog::builtin().unwrap();
    let queries: Vec<_> = catalog
        .iter()
        .flat_map(|e| e.actions())
        .filter(|a| a.kind == ActionKind::Query)
        .collect();

    assert!(queries.len() >= 5);
    for query in queries {
        assert!(query.value_amount.is_none());
        assert!(query.input_at(InputPosition::Value).is_none());
    }
}

#[test]
fn test_contract_calls_have_gas() {
    let catalog = TemplateCatalog::builtin().unwrap();
    for action in catalog.iter().flat_map(|e| e.actions()) {
        if action.kind == ActionKind::ContractCall {
            assert!(action.gas_limit.is_some(), "{} has no gas", action.label);
        }
    }
}

#[test]
fn test_transfer_templates_need_a_receiver() {
    let catalog = TemplateCatalog::builtin().unwrap();
    for id in ["transfer", "transferToken"] {
        let action = &catalog.actions(id).unwrap()[0];
        let receiver = action.input_at(InputPosition::Receiver).unwrap();
        assert!(receiver.required);
        assert!(receiver.default.is_none());
    }
}
