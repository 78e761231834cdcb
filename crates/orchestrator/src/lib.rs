//! Submission, alias registration and the end-to-end Warp pipeline
//!
//! - [`SubmissionOrchestrator`]: nonce, sign, broadcast, with retries
//! - [`AliasRegistrar`]: binds human readable aliases to warp hashes
//! - [`LinkBuilder`]: shareable, explorer and QR links
//! - [`WarpPipeline`]: prompt to published warp

pub mod error;
pub mod links;
pub mod pipeline;
pub mod registrar;
pub mod submission;

pub use error::{AliasError, ErrorCode, ErrorReport, PipelineError, SubmissionError};
pub use links::{LinkBuilder, DEFAULT_EXPLORER_URL, DEFAULT_QR_SERVICE_URL, DEFAULT_WARP_BASE_URL};
pub use pipeline::{
    BatchItem, BuilderError, PipelineConfig, Preview, PublishMode, TransactionSummary,
    WarpDetails, WarpOutcome, WarpPipeline, WarpPipelineBuilder, MAX_BATCH_SIZE,
};
pub use registrar::{AliasAvailability, AliasRegistrar, ALIAS_SETTLE_WAIT};
pub use submission::{
    AttemptFailure, AttemptRecord, SubmissionConfig, SubmissionOrchestrator, SubmissionReport,
    SubmissionStage,
};
