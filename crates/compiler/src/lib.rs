//! Warp compiler
//!
//! Turns a resolved intent into a concrete [`Warp`](warp_intents_types::Warp):
//! the catalog template is cloned, parameters are bound over defaults,
//! constraints are checked and argument positions normalized.

pub mod compiler;
pub mod constraints;
pub mod error;
pub mod normalize;

pub use compiler::{WarpCompiler, DIRECT_CALL_PREVIEW};
pub use error::CompileError;
pub use normalize::{PositionNormalizer, PositionRule, RuleScope};
