//! Intent resolution
//!
//! Prompts are classified by an ordered table of keyword rules. The first
//! rule whose predicate matches wins; its extractor pulls parameters out of
//! the prompt with fixed patterns and falls back to documented defaults.
//! A prompt that matches nothing is an error, never a silent default.

mod error;
mod resolver;
mod rules;

pub use error::ResolveError;
pub use resolver::{IntentResolver, Prompt, ResolverContext};
pub use rules::{default_rules, Extraction, Rule, RuleTarget, DEFAULT_VALIDATOR};
