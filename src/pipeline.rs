//! Per-file orchestration and the bounded worker pool driving a run.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Semaphore, mpsc};
use tracing::{info, warn};

use crate::cache::SummaryCache;
use crate::chunking::TextChunker;
use crate::config::Config;
use crate::embeddings::EmbeddingProvider;
use crate::generator::{ChatBackend, SummaryGenerator};
use crate::selection::RepresentativeSelector;
use crate::storage;
use crate::summary::Summary;
use crate::types::PipelineError;

/// Representative excerpts requested per paper (fewer when the paper has
/// fewer chunks).
const REPRESENTATIVE_CHUNK_COUNT: usize = 5;

/// Papers with less extracted text than this are rejected.
const MIN_CONTENT_LEN: usize = 100;

/// Aggregate counts reported after a full run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub completion_percentage: f64,
}

impl RunStats {
    fn new(total: usize, successful: usize, failed: usize) -> Self {
        let completion_percentage = if total > 0 {
            (successful as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };
        Self {
            total,
            successful,
            failed,
            completion_percentage,
        }
    }

    fn empty() -> Self {
        Self::new(0, 0, 0)
    }
}

/// Drives the full pipeline for a batch of input files.
///
/// Cloning is cheap (shared handles); `run` clones the pipeline into one
/// task per file.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    selector: RepresentativeSelector,
    generator: Arc<SummaryGenerator>,
}

impl Pipeline {
    /// Wires the pipeline components from one immutable config snapshot and
    /// the injected model backends.
    pub fn new(
        config: Config,
        embedder: Arc<dyn EmbeddingProvider>,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        let config = Arc::new(config);
        let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap);
        let cache = SummaryCache::new(
            config.cache_root().map(Path::to_path_buf),
            config.force_regenerate,
        );
        let generator = Arc::new(SummaryGenerator::new(&config, backend, cache));
        Self {
            config,
            chunker,
            embedder,
            selector: RepresentativeSelector::new(),
            generator,
        }
    }

    /// Processes one input file end to end.
    ///
    /// Every failure is confined to this file: the error is returned to the
    /// pool worker, counted, and the run continues. A generation failure is
    /// absorbed here into a fallback summary so the paper still gets an
    /// output record; embedding failures abort the file instead.
    pub async fn process_file(&self, filename: &str) -> Result<(), PipelineError> {
        let output_path = self.config.output_dir.join(filename);
        if !self.config.force_regenerate && storage::has_summary(&output_path).await {
            info!(file = %filename, "skipping, already processed");
            return Ok(());
        }

        let input_path = self.config.input_dir.join(filename);
        let record = storage::load_record(&input_path).await?;
        let paper = self.chunker.extract_content(&record);
        if paper.full_text.len() < MIN_CONTENT_LEN {
            return Err(PipelineError::InsufficientContent(format!(
                "{filename}: {} characters of extracted text",
                paper.full_text.len()
            )));
        }

        let chunks = self.chunker.split(&paper.full_text);
        let embeddings = self.embedder.embed_batch(&chunks).await?;
        let representative_count = REPRESENTATIVE_CHUNK_COUNT.min(chunks.len());
        let representative = self
            .selector
            .select(&chunks, &embeddings, representative_count);

        let summary = match self.generator.summarize(&paper, &representative).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!(file = %filename, error = %err, "summary generation failed, using fallback");
                Summary::fallback(&paper.title)
            }
        };

        storage::save_processed(&output_path, &record, summary).await?;
        info!(file = %filename, "successfully processed");
        Ok(())
    }

    /// Processes every input file under a bounded worker pool and reports
    /// aggregate counts.
    ///
    /// One task is spawned per file; a semaphore caps how many run at once.
    /// Results are counted as they complete, in whatever order the workers
    /// finish. The pool lives exactly as long as this call.
    pub async fn run(&self) -> RunStats {
        let files = storage::list_input_files(&self.config.input_dir).await;
        let total = files.len();
        if total == 0 {
            warn!(dir = %self.config.input_dir.display(), "no input files found");
            return RunStats::empty();
        }
        info!(total, workers = self.config.max_workers, "processing input files");

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let (tx, mut rx) = mpsc::channel::<bool>(total);
        for path in files {
            let Some(filename) = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(String::from)
            else {
                let _ = tx.send(false).await;
                continue;
            };
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            let pipeline = self.clone();
            tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("worker semaphore closed");
                let outcome = pipeline.process_file(&filename).await;
                if let Err(err) = &outcome {
                    warn!(file = %filename, error = %err, "failed to process file");
                }
                let _ = tx.send(outcome.is_ok()).await;
            });
        }
        drop(tx);

        let mut successful = 0usize;
        let mut failed = 0usize;
        while let Some(succeeded) = rx.recv().await {
            if succeeded {
                successful += 1;
            } else {
                failed += 1;
            }
        }

        let stats = RunStats::new(total, successful, failed);
        info!(
            total = stats.total,
            successful = stats.successful,
            failed = stats.failed,
            completion_percentage = stats.completion_percentage,
            "processing complete"
        );
        stats
    }
}
