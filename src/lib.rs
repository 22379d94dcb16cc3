//! ```text
//! Input records ──► storage::load_record ──► PaperContent
//!                                  │
//! PaperContent ──► chunking::TextChunker ──► chunks
//!                                  │
//! chunks ──► embeddings::EmbeddingProvider ──► vectors
//!                                  │
//! vectors ──► selection::RepresentativeSelector ──► representative chunks
//!                                  │
//! representative chunks ──► generator::SummaryGenerator ──┬─► cache::SummaryCache
//!                                                         └─► Summary
//!
//! Summary ──► storage::save_processed ──► output records
//! ```
//!
//! The whole flow runs once per input file under a bounded worker pool; see
//! [`pipeline::Pipeline`] for the per-file procedure and the run-level
//! aggregation.

pub mod cache;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod generator;
pub mod pipeline;
pub mod records;
pub mod selection;
pub mod storage;
pub mod summary;
pub mod types;

pub use cache::SummaryCache;
pub use config::Config;
pub use embeddings::{EmbeddingProvider, HttpEmbeddingProvider, MockEmbeddingProvider};
pub use generator::{ChatBackend, GenerationError, OpenAiChatBackend, SummaryGenerator};
pub use pipeline::{Pipeline, RunStats};
pub use selection::RepresentativeSelector;
pub use summary::Summary;
pub use types::PipelineError;
