//! Filesystem-backed summary cache keyed by title fingerprints.
//!
//! One JSON file per paper, named by the MD5 digest of the paper title, so
//! repeated runs reuse previously generated summaries instead of calling
//! the model backend again. Reads and writes are both soft: a malformed or
//! unreadable entry is a miss, a failed write is logged and ignored.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::summary::Summary;

/// Content-addressed store for generated summaries.
#[derive(Clone, Debug)]
pub struct SummaryCache {
    root: Option<PathBuf>,
    bypass: bool,
}

impl SummaryCache {
    /// Creates a cache rooted at `root`. `bypass` forces every lookup to
    /// miss while leaving writes enabled, refreshing entries in place.
    pub fn new(root: Option<PathBuf>, bypass: bool) -> Self {
        Self { root, bypass }
    }

    /// A cache that stores nothing and never hits.
    pub fn disabled() -> Self {
        Self {
            root: None,
            bypass: false,
        }
    }

    /// Deterministic fingerprint of a paper title.
    ///
    /// Identical titles always map to the same key, across runs and
    /// processes. Distinct papers that share a headline therefore share a
    /// cache entry; that collision is an accepted property of title keying.
    pub fn key_for(title: &str) -> String {
        format!("{:x}", md5::compute(title.as_bytes()))
    }

    /// Path of the entry for `key`, or `None` when caching is disabled.
    pub fn entry_path(&self, key: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(format!("{key}.json")))
    }

    /// Returns the cached summary for `key`, or `None` on bypass, absence,
    /// or any read/parse failure.
    pub async fn get(&self, key: &str) -> Option<Summary> {
        if self.bypass {
            return None;
        }
        let path = self.entry_path(key)?;
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cache entry");
                return None;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read cache entry");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "malformed cache entry treated as miss");
                None
            }
        }
    }

    /// Best-effort write of `summary` under `key`. Returns whether the
    /// entry was persisted; failures are logged, never propagated.
    pub async fn put(&self, key: &str, summary: &Summary) -> bool {
        let Some(path) = self.entry_path(key) else {
            return false;
        };
        let serialized = match serde_json::to_string_pretty(summary) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(error = %err, "failed to serialize summary for cache");
                return false;
            }
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = fs::create_dir_all(parent).await {
                warn!(path = %path.display(), error = %err, "failed to create cache directory");
                return false;
            }
        }
        if let Err(err) = fs::write(&path, serialized).await {
            warn!(path = %path.display(), error = %err, "failed to write cache entry");
            return false;
        }
        true
    }

    /// Cache root directory, when caching is enabled.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}
