//! Input discovery and record persistence.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::records::{ProcessedRecord, RawRecord};
use crate::summary::Summary;
use crate::types::PipelineError;

/// Lists the `.json` files in `dir`, sorted by name for a stable order.
///
/// A missing or unreadable directory yields an empty list with a warning;
/// the run then completes with zero files rather than failing outright.
pub async fn list_input_files(dir: &Path) -> Vec<PathBuf> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "input directory not readable");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    files
}

/// Loads and parses one raw paper record.
pub async fn load_record(path: &Path) -> Result<RawRecord, PipelineError> {
    let raw = fs::read_to_string(path).await?;
    serde_json::from_str(&raw).map_err(|err| PipelineError::InvalidRecord(err.to_string()))
}

/// Whether `output_path` already holds a processed record with a summary.
///
/// Any read or parse failure counts as "not processed" so the file is
/// simply processed again.
pub async fn has_summary(output_path: &Path) -> bool {
    let raw = match fs::read_to_string(output_path).await {
        Ok(raw) => raw,
        Err(_) => return false,
    };
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => value.get("summary").is_some(),
        Err(err) => {
            debug!(path = %output_path.display(), error = %err, "existing output unparseable");
            false
        }
    }
}

/// Writes the processed record combining passthrough metadata with the
/// generated summary.
pub async fn save_processed(
    output_path: &Path,
    record: &RawRecord,
    summary: Summary,
) -> Result<(), PipelineError> {
    let processed = ProcessedRecord::from_parts(record, summary);
    let serialized = serde_json::to_string_pretty(&processed)
        .map_err(|err| PipelineError::Storage(err.to_string()))?;
    fs::write(output_path, serialized)
        .await
        .map_err(|err| PipelineError::Storage(format!("{}: {err}", output_path.display())))?;
    Ok(())
}
