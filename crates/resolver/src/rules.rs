use std::str::FromStr;

use rust_decimal::Decimal;
use warp_intents_types::{DirectCall, InputValue, IntentParams};

use crate::resolver::{Prompt, ResolverContext};

/// Staking provider used when a prompt names no validator
pub const DEFAULT_VALIDATOR: &str = "erd1qqqqqqqqqqqqqpgqd9rvv2n378e27jcts8vfwynpkm8ng7g7945ssu2js8";

pub const DEFAULT_STAKE_AMOUNT: &str = "1";
pub const DEFAULT_TRANSFER_AMOUNT: &str = "0.1";
pub const DEFAULT_TOKEN_AMOUNT: &str = "10";

/// Liquid staking token returned by the XOXNO pool
pub const XEGLD_TOKEN: &str = "XEGLD-23b511";

pub type Predicate = fn(&Prompt<'_>, &ResolverContext) -> bool;
pub type Extractor = fn(&Prompt<'_>, &ResolverContext) -> Extraction;

/// What a matching rule produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    Template(&'static str),
    DirectCall,
}

/// Parameters pulled out of a prompt by a rule's extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Params(IntentParams),
    DirectCall(DirectCall),
}

/// One row of the dispatch table: `(predicate, extractor, target)`
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub target: RuleTarget,
    predicate: Predicate,
    extractor: Extractor,
}

impl Rule {
    pub const fn template(intent_id: &'static str, predicate: Predicate, extractor: Extractor) -> Self {
        Self {
            name: intent_id,
            target: RuleTarget::Template(intent_id),
            predicate,
            extractor,
        }
    }

    pub const fn direct_call(predicate: Predicate, extractor: Extractor) -> Self {
        Self {
            name: "directCall",
            target: RuleTarget::DirectCall,
            predicate,
            extractor,
        }
    }

    pub fn matches(&self, prompt: &Prompt<'_>, ctx: &ResolverContext) -> bool {
        (self.predicate)(prompt, ctx)
    }

    pub fn extract(&self, prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
        (self.extractor)(prompt, ctx)
    }
}

/// The builtin table, most specific rules first
///
/// Order matters: `unstake` contains `stake`, provider-specific staking must
/// win over generic staking, and every multi-send rule must precede plain
/// `send`.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::direct_call(is_direct_call, direct_call),
        // read-only queries
        Rule::template("hatomProtocolReserves", |p, _| p.contains("protocol reserves") && p.contains("hatom"), no_params),
        Rule::template("hatomRewardsReserve", |p, _| p.contains("rewards reserve") && p.contains("hatom"), no_params),
        Rule::template("hatomCashReserve", |p, _| p.contains("cash reserve") && p.contains("hatom"), no_params),
        Rule::template("hatomTotalWithdrawable", |p, _| p.contains("total withdrawable") && p.contains("hatom"), no_params),
        Rule::template("xoxnoTotalWithdrawn", |p, _| p.contains("total withdrawn") && p.contains("xoxno"), no_params),
        // provider operations
        Rule::template("xoxnoMigratePending", |p, _| p.contains("migrate pending") && p.contains("xoxno"), egld_payment),
        Rule::template("xoxnoAddRewards", |p, _| p.contains("add rewards") && p.contains("xoxno"), egld_payment),
        Rule::template("claimRewards", |p, _| p.contains("claim") && p.contains("reward"), no_params),
        Rule::template("xoxnoUnDelegate", |p, _| p.contains_any(&["undelegate", "unstake", "withdraw"]) && p.contains("xoxno"), xegld_undelegate),
        Rule::template("unstaking", |p, _| p.contains_any(&["unstake", "unstaking", "undelegate"]), unstaking),
        Rule::template("liquidStakingXoxno", |p, _| p.contains_any(&["stake", "delegate"]) && p.contains("xoxno"), egld_payment),
        Rule::template("liquidStakingHatom", |p, _| p.contains_any(&["stake", "delegate"]) && p.contains("hatom"), egld_payment),
        Rule::template("staking", |p, _| p.contains_any(&["stake", "staking", "delegate"]), staking),
        Rule::template("xoxnoMarketplaceDeposit", |p, _| p.contains("deposit") && p.contains("marketplace") && p.contains("xoxno"), egld_payment),
        // distribution
        Rule::template("smartSend", |p, _| p.contains_any(&["smart send", "smartsend"]), smart_send),
        Rule::template("bulksendSameAmount", |p, _| p.contains_any(&["bulksend same amount", "send same amount"]), same_amount),
        Rule::template("bulksend", |p, _| p.contains("bulksend"), bulksend),
        // transfers
        Rule::template("transferToken", |p, ctx| p.contains_any(&["send", "transfer"]) && ctx.find_ticker(p).is_some(), token_transfer),
        Rule::template("transfer", |p, _| p.contains_any(&["send", "transfer"]), transfer),
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
// EXTRACTORS
// ═══════════════════════════════════════════════════════════════════════════

fn no_params(_: &Prompt<'_>, _: &ResolverContext) -> Extraction {
    Extraction::Params(IntentParams::new())
}

fn params<const N: usize>(pairs: [(&str, InputValue); N]) -> Extraction {
    Extraction::Params(
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

fn egld_amount(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Option<String> {
    ctx.egld_amount
        .captures(&prompt.lower)
        .map(|caps| caps[1].to_string())
}

fn recipient(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Option<String> {
    ctx.recipient
        .captures(&prompt.lower)
        .or_else(|| ctx.address.captures(&prompt.lower))
        .map(|caps| caps[1].to_string())
}

fn staking(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
    let amount = egld_amount(prompt, ctx).unwrap_or_else(|| DEFAULT_STAKE_AMOUNT.to_string());
    let validator = ctx
        .validator
        .captures(&prompt.lower)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| ctx.default_validator.clone());
    params([("Amount", amount.into()), ("Validator", validator.into())])
}

fn unstaking(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
    let amount = egld_amount(prompt, ctx).unwrap_or_else(|| DEFAULT_STAKE_AMOUNT.to_string());
    params([("Amount", amount.into())])
}

fn egld_payment(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
    let amount = egld_amount(prompt, ctx).unwrap_or_else(|| DEFAULT_STAKE_AMOUNT.to_string());
    params([("egldAmount", amount.into())])
}

fn xegld_undelegate(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
    let amount = ctx
        .xegld_amount
        .captures(&prompt.lower)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| DEFAULT_STAKE_AMOUNT.to_string());
    params([("tokenAmount", format!("{XEGLD_TOKEN}|{amount}").into())])
}

/// `(address, amount)` rows plus their total, which becomes the payment
fn address_amount_rows(prompt: &Prompt<'_>, ctx: &ResolverContext, input: &str) -> Extraction {
    let mut rows = Vec::new();
    let mut total = Decimal::ZERO;
    for caps in ctx.address_amount.captures_iter(&prompt.lower) {
        let amount = &caps[2];
        if let Ok(value) = Decimal::from_str(amount) {
            total += value;
        }
        rows.push(InputValue::List(vec![InputValue::from(&caps[1]), InputValue::from(amount)]));
    }

    let mut extracted = IntentParams::new();
    if !rows.is_empty() {
        extracted.insert("egldAmount".to_string(), total.normalize().to_string().into());
        extracted.insert(input.to_string(), InputValue::List(rows));
    }
    Extraction::Params(extracted)
}

fn bulksend(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
    address_amount_rows(prompt, ctx, "destinations")
}

fn smart_send(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
    address_amount_rows(prompt, ctx, "params")
}

fn same_amount(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
    let destinations: Vec<InputValue> = ctx
        .address
        .captures_iter(&prompt.lower)
        .map(|caps| InputValue::from(&caps[1]))
        .collect();

    let mut extracted = IntentParams::new();
    if let Some(amount) = egld_amount(prompt, ctx) {
        extracted.insert("egldAmount".to_string(), amount.into());
    }
    if !destinations.is_empty() {
        extracted.insert("destinations".to_string(), InputValue::List(destinations));
    }
    Extraction::Params(extracted)
}

fn token_transfer(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
    let identifier = ctx
        .find_ticker(prompt)
        .map(|(_, id)| id.to_string())
        .unwrap_or_default();
    let amount = ctx
        .token_amount
        .captures(&prompt.lower)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| DEFAULT_TOKEN_AMOUNT.to_string());

    let mut extracted = IntentParams::new();
    extracted.insert("Payment".to_string(), format!("{identifier}|{amount}").into());
    if let Some(receiver) = recipient(prompt, ctx) {
        extracted.insert("Receiver".to_string(), receiver.into());
    }
    Extraction::Params(extracted)
}

fn transfer(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
    let amount = egld_amount(prompt, ctx).unwrap_or_else(|| DEFAULT_TRANSFER_AMOUNT.to_string());

    let mut extracted = IntentParams::new();
    extracted.insert("Amount".to_string(), amount.into());
    if let Some(receiver) = recipient(prompt, ctx) {
        extracted.insert("Receiver".to_string(), receiver.into());
    }
    Extraction::Params(extracted)
}

fn is_direct_call(prompt: &Prompt<'_>, ctx: &ResolverContext) -> bool {
    ctx.direct_call.is_match(prompt.original.trim())
}

fn direct_call(prompt: &Prompt<'_>, ctx: &ResolverContext) -> Extraction {
    let Some(caps) = ctx.direct_call.captures(prompt.original.trim()) else {
        return Extraction::Params(IntentParams::new());
    };

    let mut call = DirectCall::new(caps[1].to_lowercase(), &caps[2]);
    if let Some(args) = caps.get(3) {
        call = call.with_args_csv(args.as_str());
    }
    if let Some(value) = caps.get(4) {
        call = call.with_value(value.as_str());
    }
    Extraction::DirectCall(call)
}
