//! Assembly of catalog Warps into unsigned transactions

use std::collections::BTreeMap;
use std::sync::Arc;

use warp_intents_assembler::{
    AssemblyError, AssemblySource, LinearGasEstimator, TransactionAssembler,
};
use warp_intents_catalog::TemplateCatalog;
use warp_intents_compiler::WarpCompiler;
use warp_intents_types::{Address, DirectCall, InputValue, IntentParams, Warp};

const SENDER: &str = "erd1709y9mhz6487cfzv6t9xpa6hyxtc5kv4zl4za377tn0tqrhtht6sfrdfta";
const VALIDATOR: &str = "erd1qqqqqqqqqqqqqpgqd9rvv2n378e27jcts8vfwynpkm8ng7g7945ssu2js8";
const DELEGATION: &str = "erd1qqqqqqqqqqqqqpgqqz6vp7vs3p7u8t8gxppjq8qwkx7urj4g7a3szux93t";

fn compile(intent_id: &str, pairs: &[(&str, &str)]) -> Warp {
    let params: IntentParams = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), InputValue::from(*v)))
        .collect();
    WarpCompiler::new(Arc::new(TemplateCatalog::builtin().unwrap()))
        .compile(intent_id, &params, None)
        .unwrap()
}

fn assembler() -> TransactionAssembler {
    TransactionAssembler::default()
}

fn hex_address(bech32: &str) -> String {
    Address::from_bech32(bech32).unwrap().to_hex()
}

// ==================== Contract Call Tests ====================

#[test]
fn test_staking_transaction() {
    let warp = compile("staking", &[("Amount", "2"), ("Validator", VALIDATOR)]);
    let tx = assembler()
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap();

    assert_eq!(tx.sender, SENDER);
    assert_eq!(tx.receiver, DELEGATION);
    assert_eq!(tx.value, "2000000000000000000");
    assert_eq!(tx.gas_limit, 12_000_000);
    assert_eq!(tx.payload_str(), format!("delegate@{}", hex_address(VALIDATOR)));
    assert_eq!(tx.chain_id, "D");
}

#[test]
fn test_gas_override_wins() {
    let warp = compile("claimRewards", &[]);
    let tx = assembler()
        .assemble(AssemblySource::Warp(&warp), SENDER, Some(42_000_000))
        .unwrap();
    assert_eq!(tx.gas_limit, 42_000_000);
    assert_eq!(tx.value, "0");
}

#[test]
fn test_bulksend_rows_flatten_in_order() {
    let mut params = IntentParams::new();
    params.insert(
        "destinations".to_string(),
        InputValue::List(vec![
            InputValue::List(vec![SENDER.into(), "1".into()]),
            InputValue::List(vec![VALIDATOR.into(), "0.5".into()]),
        ]),
    );
    params.insert("egldAmount".to_string(), "1.5".into());
    let warp = WarpCompiler::new(Arc::new(TemplateCatalog::builtin().unwrap()))
        .compile("bulksend", &params, None)
        .unwrap();

    let tx = assembler()
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap();
    let payload = tx.payload_str();
    let parts: Vec<&str> = payload.split('@').collect();

    assert_eq!(parts[0], "bulksend");
    assert_eq!(&parts[1..], &[
        hex_address(SENDER).as_str(),
        "0de0b6b3a7640000",
        hex_address(VALIDATOR).as_str(),
        "06f05b59d3b20000",
    ]);
    assert_eq!(tx.value, "1500000000000000000");
}

// ==================== Transfer Tests ====================

#[test]
fn test_egld_transfer() {
    let warp = compile("transfer", &[("Amount", "0.25"), ("Receiver", VALIDATOR)]);
    let tx = assembler()
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap();
    assert_eq!(tx.receiver, VALIDATOR);
    assert_eq!(tx.value, "250000000000000000");
    assert!(tx.payload.is_empty());
    assert_eq!(tx.gas_limit, 3_000_000 + 50_000);
}

#[test]
fn test_token_transfer() {
    let warp = compile(
        "transferToken",
        &[("Payment", "USDC-c76f1f|10"), ("Receiver", VALIDATOR)],
    );
    let tx = assembler()
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap();
    assert_eq!(tx.receiver, VALIDATOR);
    assert_eq!(tx.value, "0");
    assert_eq!(
        tx.payload_str(),
        format!("ESDTTransfer@{}@989680", hex::encode("USDC-c76f1f"))
    );
}

#[test]
fn test_token_decimals_override_template_scale() {
    let warp = compile(
        "transferToken",
        &[("Payment", "RIDE-7d18e9|1.5"), ("Receiver", VALIDATOR)],
    );

    // the template scale of 6 cannot express 1.5 at 18 decimals correctly
    let tx = assembler()
        .with_token_decimals(BTreeMap::from([("RIDE-7d18e9".to_string(), 18)]))
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap();
    assert_eq!(
        tx.payload_str(),
        format!("ESDTTransfer@{}@14d1120d7b160000", hex::encode("RIDE-7d18e9"))
    );

    // tokens without an entry keep the template scale
    let tx = assembler()
        .with_token_decimals(BTreeMap::from([("RIDE-7d18e9".to_string(), 18)]))
        .assemble(
            AssemblySource::Warp(&compile(
                "transferToken",
                &[("Payment", "USDC-c76f1f|10"), ("Receiver", VALIDATOR)],
            )),
            SENDER,
            None,
        )
        .unwrap();
    assert!(tx.payload_str().ends_with("@989680"));
}

#[test]
fn test_token_payment_with_contract_call() {
    let warp = compile("xoxnoUnDelegate", &[("tokenAmount", "XEGLD-23b511|1")]);
    let tx = assembler()
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap();
    assert_eq!(
        tx.payload_str(),
        format!(
            "ESDTTransfer@{}@0de0b6b3a7640000@{}",
            hex::encode("XEGLD-23b511"),
            hex::encode("unDelegate")
        )
    );
}

#[test]
fn test_missing_receiver_is_missing_parameter() {
    let warp = compile("transfer", &[("Amount", "1")]);
    let err = assembler()
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap_err();
    assert!(matches!(
        err,
        AssemblyError::MissingParameter { input, .. } if input == "Receiver"
    ));

    let err = assembler().inscribe(&warp, SENDER, None).unwrap_err();
    assert!(matches!(err, AssemblyError::MissingParameter { .. }));
}

#[test]
fn test_unbound_variadic_rows_are_missing_parameter() {
    for (intent_id, input_name) in [
        ("bulksend", "destinations"),
        ("bulksendSameAmount", "destinations"),
        ("smartSend", "params"),
    ] {
        let warp = compile(intent_id, &[]);
        let err = assembler()
            .assemble(AssemblySource::Warp(&warp), SENDER, None)
            .unwrap_err();
        assert!(
            matches!(&err, AssemblyError::MissingParameter { input, .. } if input == input_name),
            "{intent_id}: {err:?}"
        );

        let err = assembler().inscribe(&warp, SENDER, None).unwrap_err();
        assert!(matches!(err, AssemblyError::MissingParameter { .. }), "{intent_id}");
    }
}

#[test]
fn test_empty_variadic_rows_are_missing_parameter() {
    let warp = WarpCompiler::new(Arc::new(TemplateCatalog::builtin().unwrap()))
        .compile(
            "bulksendSameAmount",
            &IntentParams::from([("destinations".to_string(), InputValue::List(vec![]))]),
            None,
        )
        .unwrap();
    let err = assembler()
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap_err();
    assert!(matches!(err, AssemblyError::MissingParameter { .. }));
}

// ==================== Inscription Tests ====================

#[test]
fn test_query_warp_is_inscribed() {
    let warp = compile("hatomProtocolReserves", &[]);
    let tx = assembler()
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap();
    assert_eq!(tx.receiver, SENDER);
    assert_eq!(tx.value, "0");

    let published: Warp = serde_json::from_slice(&tx.payload).unwrap();
    assert_eq!(published, warp);
    assert_eq!(
        tx.gas_limit,
        3_000_000 + 100_000 + 10 * tx.payload.len() as u64
    );
}

#[test]
fn test_multi_action_warp_keeps_declaration_order() {
    let mut warp = compile("claimRewards", &[]);
    let mut second = warp.actions[0].clone();
    second.label = "second".to_string();
    warp.actions.push(second);

    let tx = assembler().inscribe(&warp, SENDER, None).unwrap();
    let published: Warp = serde_json::from_slice(&tx.payload).unwrap();
    let labels: Vec<_> = published.actions.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, vec![warp.actions[0].label.as_str(), "second"]);
}

#[test]
fn test_duplicate_positions_rejected() {
    let mut warp = compile("staking", &[]);
    let mut extra = warp.actions[0].input("Validator").unwrap().clone();
    extra.name = "Other".to_string();
    warp.actions[0].inputs.push(extra);

    let err = assembler()
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap_err();
    assert!(matches!(err, AssemblyError::DuplicatePosition { .. }));
}

// ==================== Direct Call Tests ====================

#[test]
fn test_direct_call() {
    let call = DirectCall::new(DELEGATION, "stake")
        .with_args_csv(&format!("{VALIDATOR}, 16, 0x0a, hi"))
        .with_value("1");
    let tx = assembler()
        .assemble(AssemblySource::Direct(&call), SENDER, None)
        .unwrap();

    assert_eq!(tx.receiver, DELEGATION);
    assert_eq!(tx.value, "1000000000000000000");
    assert_eq!(tx.gas_limit, 10_000_000);
    assert_eq!(
        tx.payload_str(),
        format!("stake@{}@10@0a@6869", hex_address(VALIDATOR))
    );
}

#[test]
fn test_invalid_sender() {
    let call = DirectCall::new(DELEGATION, "stake");
    assert!(matches!(
        assembler().assemble(AssemblySource::Direct(&call), "erd1bad", None),
        Err(AssemblyError::InvalidAddress { .. })
    ));
}

#[test]
fn test_custom_estimator_and_chain() {
    let estimator = LinearGasEstimator {
        base: 1_000,
        ..LinearGasEstimator::default()
    };
    let warp = compile("transfer", &[("Amount", "1"), ("Receiver", VALIDATOR)]);
    let tx = TransactionAssembler::new(Arc::new(estimator))
        .with_chain_id("1")
        .assemble(AssemblySource::Warp(&warp), SENDER, None)
        .unwrap();
    assert_eq!(tx.gas_limit, 1_000 + 50_000);
    assert_eq!(tx.chain_id, "1");
}
