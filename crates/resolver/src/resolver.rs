use std::collections::BTreeMap;

use regex::Regex;
use tracing::{debug, info};
use warp_intents_types::Resolution;

use crate::rules::{default_rules, Extraction, Rule, RuleTarget, DEFAULT_VALIDATOR};
use crate::ResolveError;

/// A prompt in both its original and lower-cased form
///
/// Keyword predicates run on the lower-cased text. Function names in direct
/// calls are case sensitive, so extractors can still read the original.
#[derive(Debug, Clone)]
pub struct Prompt<'a> {
    pub original: &'a str,
    pub lower: String,
}

impl<'a> Prompt<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            lower: original.trim().to_lowercase(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    pub fn contains_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.lower.contains(n))
    }
}

/// Compiled patterns and lookup tables shared by every rule
#[derive(Debug, Clone)]
pub struct ResolverContext {
    /// `<amount> egld` or `<amount> erd`
    pub egld_amount: Regex,
    /// `<amount> xegld` or `<amount> egld`
    pub xegld_amount: Regex,
    /// `validator <address>`
    pub validator: Regex,
    /// `to <address>`
    pub recipient: Regex,
    /// any account address
    pub address: Regex,
    /// `<address> <amount>` pairs
    pub address_amount: Regex,
    /// `call <address> <function> [with a, b] [value <n> egld]`
    pub direct_call: Regex,
    /// `<amount> <ticker>` for known fungible tokens
    pub token_amount: Regex,
    /// Ticker (lower case) to token identifier
    pub tokens: BTreeMap<String, String>,
    pub default_validator: String,
}

impl ResolverContext {
    pub fn new() -> Result<Self, ResolveError> {
        let mut tokens = BTreeMap::new();
        tokens.insert("usdc".to_string(), "USDC-c76f1f".to_string());
        tokens.insert("usdt".to_string(), "USDT-f8c08c".to_string());
        Self::with_tokens(tokens)
    }

    pub fn with_tokens(tokens: BTreeMap<String, String>) -> Result<Self, ResolveError> {
        let tokens: BTreeMap<String, String> = tokens
            .into_iter()
            .map(|(ticker, id)| (ticker.to_lowercase(), id))
            .collect();
        let tickers = if tokens.is_empty() {
            // never matches
            r"\b\B".to_string()
        } else {
            tokens
                .keys()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|")
        };

        Ok(Self {
            egld_amount: Regex::new(r"\b(\d+(?:\.\d+)?)\s*(?:egld|erd)\b")?,
            xegld_amount: Regex::new(r"\b(\d+(?:\.\d+)?)\s*x?egld\b")?,
            validator: Regex::new(r"validator\s+(erd1[a-z0-9]{58})\b")?,
            recipient: Regex::new(r"\bto\s+(erd1[a-z0-9]{58})\b")?,
            address: Regex::new(r"\b(erd1[a-z0-9]{58})\b")?,
            address_amount: Regex::new(r"\b(erd1[a-z0-9]{58})\s*[:=,]?\s*(\d+(?:\.\d+)?)\b")?,
            direct_call: Regex::new(
                r"(?i)^\s*call\s+(erd1[a-z0-9]{58})\s+([A-Za-z_][A-Za-z0-9_]*)(?:\s+with\s+(.+?))?(?:\s+value\s+(\d+(?:\.\d+)?)\s*egld)?\s*$",
            )?,
            token_amount: Regex::new(&format!(r"\b(\d+(?:\.\d+)?)\s*({tickers})\b"))?,
            tokens,
            default_validator: DEFAULT_VALIDATOR.to_string(),
        })
    }

    pub fn with_default_validator(mut self, validator: impl Into<String>) -> Self {
        self.default_validator = validator.into();
        self
    }

    /// First known ticker mentioned in the prompt
    pub fn find_ticker(&self, prompt: &Prompt<'_>) -> Option<(&str, &str)> {
        self.tokens
            .iter()
            .find(|(ticker, _)| contains_word(&prompt.lower, ticker))
            .map(|(t, id)| (t.as_str(), id.as_str()))
    }
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|w| w == word)
}

/// Ordered first-match dispatcher over a rule table
#[derive(Debug, Clone)]
pub struct IntentResolver {
    rules: Vec<Rule>,
    context: ResolverContext,
}

impl IntentResolver {
    /// Resolver with the builtin rule table
    pub fn new() -> Result<Self, ResolveError> {
        Ok(Self {
            rules: default_rules(),
            context: ResolverContext::new()?,
        })
    }

    pub fn with_rules(rules: Vec<Rule>, context: ResolverContext) -> Self {
        Self { rules, context }
    }

    pub fn with_context(mut self, context: ResolverContext) -> Self {
        self.context = context;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn context(&self) -> &ResolverContext {
        &self.context
    }

    /// Classify a prompt
    pub fn resolve(&self, prompt_text: &str) -> Result<Resolution, ResolveError> {
        if prompt_text.trim().is_empty() {
            return Err(ResolveError::EmptyPrompt);
        }
        let prompt = Prompt::new(prompt_text);

        let rule = self
            .rules
            .iter()
            .find(|rule| rule.matches(&prompt, &self.context))
            .ok_or_else(|| ResolveError::UnrecognizedIntent {
                prompt: prompt_text.to_string(),
            })?;

        debug!(rule = rule.name, "prompt matched rule");

        let resolution = match (rule.extract(&prompt, &self.context), rule.target) {
            (Extraction::Params(params), RuleTarget::Template(intent_id)) => {
                Resolution::template(intent_id, params)
            }
            (Extraction::DirectCall(call), _) => Resolution::DirectCall(call),
            (Extraction::Params(_), RuleTarget::DirectCall) => {
                return Err(ResolveError::UnrecognizedIntent {
                    prompt: prompt_text.to_string(),
                })
            }
        };

        info!(intent_id = resolution.intent_id(), "resolved prompt");
        Ok(resolution)
    }
}
