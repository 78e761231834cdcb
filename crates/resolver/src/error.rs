use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no intent recognised in prompt: {prompt}")]
    UnrecognizedIntent { prompt: String },

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("invalid resolver pattern: {0}")]
    Pattern(#[from] regex::Error),
}
