//! End-to-end runs over temporary directories with mock model backends.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tempfile::tempdir;

use papersmith::config::Config;
use papersmith::embeddings::MockEmbeddingProvider;
use papersmith::generator::{ChatBackend, GenerationError};
use papersmith::pipeline::Pipeline;
use papersmith::summary::GENERATION_FAILED;

/// Backend that always answers with the given content and counts calls.
struct ScriptedChat {
    content: String,
    calls: Arc<AtomicUsize>,
}

impl ScriptedChat {
    fn new(content: String) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                content,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl ChatBackend for ScriptedChat {
    async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.content.clone())
    }

    fn id(&self) -> &str {
        "scripted"
    }
}

/// Backend that fails every request.
struct FailingChat;

#[async_trait]
impl ChatBackend for FailingChat {
    async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String, GenerationError> {
        Err(GenerationError::Backend("scripted failure".to_string()))
    }

    fn id(&self) -> &str {
        "failing"
    }
}

fn summary_content(headline: &str) -> String {
    json!({
        "headline": headline,
        "tldr": "Short.",
        "context": "Context.",
        "methodology": "Methods.",
        "key_points": ["one", "two"],
        "accessible_explanation": "Plain explanation.",
        "significance": "Matters.",
        "questions_raised": ["why?"]
    })
    .to_string()
}

fn valid_record(headline: &str) -> String {
    json!({
        "data": {
            "headline": headline,
            "description": "This research paper investigates the long-term behaviour of widget ensembles under periodic load, with detailed measurements across many configurations.",
            "content": "The experimental section describes the apparatus, the measurement protocol, and the statistical treatment of the collected data in considerable depth.",
            "sections": [
                {"text": "Results show consistent improvements across all tested configurations."},
                "Discussion places the findings in the context of prior ensemble studies."
            ]
        },
        "author": "A. Researcher",
        "category": "Physics",
        "hyperlinks": ["https://example.com/widgets"],
        "timestamp": "2024-05-01T00:00:00Z",
        "scraper_id": "scraper-7",
        "website_url": "https://example.com",
        "source_type": "journal"
    })
    .to_string()
}

fn test_config(input: &Path, output: &Path, cache: Option<&Path>) -> Config {
    Config {
        input_dir: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        cache_dir: cache
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default(),
        rate_limit_pause_ms: 0,
        max_workers: 2,
        ..Default::default()
    }
}

fn pipeline_with(config: Config, backend: Arc<dyn ChatBackend>) -> Pipeline {
    Pipeline::new(config, Arc::new(MockEmbeddingProvider::new()), backend)
}

async fn read_output(path: &Path) -> serde_json::Value {
    let raw = tokio::fs::read_to_string(path).await.unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[tokio::test]
async fn run_counts_malformed_files_without_aborting() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();

    for index in 0..3 {
        let name = format!("paper_{index}.json");
        tokio::fs::write(input.path().join(name), valid_record(&format!("Paper {index}")))
            .await
            .unwrap();
    }
    tokio::fs::write(input.path().join("broken.json"), "{not json at all")
        .await
        .unwrap();
    tokio::fs::write(
        input.path().join("thin.json"),
        json!({"data": {"headline": "X", "description": "short"}, "author": "A", "category": "C"})
            .to_string(),
    )
    .await
    .unwrap();

    let (chat, _calls) = ScriptedChat::new(summary_content("Generated"));
    let pipeline = pipeline_with(
        test_config(input.path(), output.path(), None),
        Arc::new(chat),
    );
    let stats = pipeline.run().await;

    assert_eq!(stats.total, 5);
    assert_eq!(stats.successful, 3);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.completion_percentage, 60.0);

    for index in 0..3 {
        let path = output.path().join(format!("paper_{index}.json"));
        assert!(path.exists(), "missing output for paper_{index}");
    }
    assert!(!output.path().join("broken.json").exists());
    assert!(!output.path().join("thin.json").exists());
}

#[tokio::test]
async fn insufficient_content_writes_no_output() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    tokio::fs::write(
        input.path().join("thin.json"),
        json!({"data": {"headline": "X", "description": "short"}, "author": "A", "category": "C"})
            .to_string(),
    )
    .await
    .unwrap();

    let (chat, calls) = ScriptedChat::new(summary_content("Generated"));
    let pipeline = pipeline_with(
        test_config(input.path(), output.path(), None),
        Arc::new(chat),
    );
    let stats = pipeline.run().await;

    assert_eq!(stats.total, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!output.path().join("thin.json").exists());
}

#[tokio::test]
async fn existing_outputs_are_skipped() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    tokio::fs::write(input.path().join("paper.json"), valid_record("Done Already"))
        .await
        .unwrap();
    tokio::fs::write(
        output.path().join("paper.json"),
        json!({"summary": {"headline": "Done Already"}}).to_string(),
    )
    .await
    .unwrap();

    let (chat, calls) = ScriptedChat::new(summary_content("Generated"));
    let pipeline = pipeline_with(
        test_config(input.path(), output.path(), None),
        Arc::new(chat),
    );
    let stats = pipeline.run().await;

    assert_eq!(stats.successful, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn force_regenerate_reprocesses_existing_outputs() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    tokio::fs::write(input.path().join("paper.json"), valid_record("Done Already"))
        .await
        .unwrap();
    tokio::fs::write(
        output.path().join("paper.json"),
        json!({"summary": {"headline": "Stale"}}).to_string(),
    )
    .await
    .unwrap();

    let (chat, calls) = ScriptedChat::new(summary_content("Regenerated"));
    let mut config = test_config(input.path(), output.path(), None);
    config.force_regenerate = true;
    let pipeline = pipeline_with(config, Arc::new(chat));
    let stats = pipeline.run().await;

    assert_eq!(stats.successful, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let value = read_output(&output.path().join("paper.json")).await;
    assert_eq!(value["summary"]["headline"], "Regenerated");
}

#[tokio::test]
async fn failing_backend_still_produces_fallback_output() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    tokio::fs::write(input.path().join("paper.json"), valid_record("Fallback Paper"))
        .await
        .unwrap();

    let pipeline = pipeline_with(
        test_config(input.path(), output.path(), None),
        Arc::new(FailingChat),
    );
    let stats = pipeline.run().await;

    // Generation failure degrades the summary but the file still succeeds.
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.failed, 0);

    let value = read_output(&output.path().join("paper.json")).await;
    assert_eq!(value["summary"]["headline"], "Fallback Paper");
    assert_eq!(value["summary"]["tldr"], GENERATION_FAILED);
    assert_eq!(value["summary"]["key_points"][0], GENERATION_FAILED);
}

#[tokio::test]
async fn shared_titles_reuse_the_cache() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let cache = tempdir().unwrap();
    tokio::fs::write(input.path().join("first.json"), valid_record("Shared Title"))
        .await
        .unwrap();
    tokio::fs::write(input.path().join("second.json"), valid_record("Shared Title"))
        .await
        .unwrap();

    let (chat, calls) = ScriptedChat::new(summary_content("Shared Title"));
    let mut config = test_config(input.path(), output.path(), Some(cache.path()));
    // One worker keeps the second file behind the first so it can hit the
    // freshly written cache entry.
    config.max_workers = 1;
    let pipeline = pipeline_with(config, Arc::new(chat));
    let stats = pipeline.run().await;

    assert_eq!(stats.successful, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(output.path().join("first.json").exists());
    assert!(output.path().join("second.json").exists());
}

#[tokio::test]
async fn output_keeps_passthrough_metadata_and_drops_body() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    tokio::fs::write(input.path().join("paper.json"), valid_record("Metadata Paper"))
        .await
        .unwrap();

    let (chat, _calls) = ScriptedChat::new(summary_content("Metadata Paper"));
    let pipeline = pipeline_with(
        test_config(input.path(), output.path(), None),
        Arc::new(chat),
    );
    pipeline.run().await;

    let value = read_output(&output.path().join("paper.json")).await;
    assert_eq!(value["category"], "Physics");
    assert_eq!(value["scraper_id"], "scraper-7");
    assert_eq!(value["author"], "A. Researcher");
    assert_eq!(value["data"]["headline"], "Metadata Paper");
    assert!(value["data"].get("description").is_none());
    assert!(value["data"].get("content").is_none());
    assert_eq!(value["summary"]["headline"], "Metadata Paper");
}
