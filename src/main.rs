use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use papersmith::config::Config;
use papersmith::embeddings::HttpEmbeddingProvider;
use papersmith::generator::OpenAiChatBackend;
use papersmith::pipeline::Pipeline;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config_path = env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            error!(path = %config_path, error = %err, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(?config, "loaded configuration");

    if let Err(err) = std::fs::create_dir_all(&config.output_dir) {
        error!(dir = %config.output_dir.display(), error = %err, "failed to create output directory");
        return ExitCode::FAILURE;
    }
    if let Some(cache_root) = config.cache_root() {
        if let Err(err) = std::fs::create_dir_all(cache_root) {
            error!(dir = %cache_root.display(), error = %err, "failed to create cache directory");
            return ExitCode::FAILURE;
        }
    }

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let embedder = match HttpEmbeddingProvider::new(
        &config.api_key,
        &config.embedding_base_url,
        &config.embedding_model_name,
        timeout,
    ) {
        Ok(embedder) => Arc::new(embedder),
        Err(err) => {
            error!(error = %err, "failed to build embedding client");
            return ExitCode::FAILURE;
        }
    };
    let backend = match OpenAiChatBackend::new(
        &config.api_key,
        &config.api_base_url,
        &config.model_name,
        timeout,
    ) {
        Ok(backend) => Arc::new(backend),
        Err(err) => {
            error!(error = %err, "failed to build chat client");
            return ExitCode::FAILURE;
        }
    };

    let pipeline = Pipeline::new(config, embedder, backend);
    let stats = pipeline.run().await;

    println!("Processed: {} files", stats.total);
    println!(
        "Successful: {} ({}%)",
        stats.successful, stats.completion_percentage
    );
    println!("Failed: {}", stats.failed);

    // The exit code reflects batch completion, not per-file success.
    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
