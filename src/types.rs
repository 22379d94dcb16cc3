//! Shared error type for the summarization pipeline.

use thiserror::Error;

/// Errors surfaced by pipeline stages.
///
/// Every variant is confined to the file being processed; the orchestrator
/// catches them at the file boundary and converts them into a per-file
/// failure without aborting the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The raw record could not be parsed into the expected schema.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The extracted text was missing or too short to summarize.
    #[error("insufficient content: {0}")]
    InsufficientContent(String),

    /// The embedding backend failed; processing of the file aborts.
    #[error("embedding backend error: {0}")]
    Embedding(String),

    /// Output persistence failed.
    #[error("storage error: {0}")]
    Storage(String),
}
