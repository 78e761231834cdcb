//! Prompt-to-transaction Warp pipeline for MultiversX
//!
//! The workspace crates are re-exported under short names; [`app`] wires
//! them together from an [`config::AppConfig`].

pub mod app;

pub use warp_intents_assembler as assembler;
pub use warp_intents_catalog as catalog;
pub use warp_intents_chain as chain;
pub use warp_intents_compiler as compiler;
pub use warp_intents_config as config;
pub use warp_intents_metrics as metrics;
pub use warp_intents_orchestrator as orchestrator;
pub use warp_intents_resolver as resolver;
pub use warp_intents_retry as retry;
pub use warp_intents_types as types;

pub use app::{load_signer, submission_config, AppError, Runtime};
