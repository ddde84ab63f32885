use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Runtime settings for the upload service.
///
/// Loaded from an optional TOML file; any field left out keeps its default.
/// CLI flags are applied on top by the binary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Per-upload workspaces (raw archive plus extracted contents)
    pub upload_root: PathBuf,
    /// Generated spreadsheets, one per upload
    pub result_root: PathBuf,
    /// Prebuilt frontend bundle served on unmatched routes when present
    pub frontend_dist: PathBuf,
    pub processing_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub history_page_size: u64,
    pub history_max_page_size: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from("uploads"),
            result_root: PathBuf::from("results"),
            frontend_dist: PathBuf::from("frontend/dist"),
            processing_timeout_secs: 120,
            max_upload_bytes: 50 * 1024 * 1024,
            history_page_size: 100,
            history_max_page_size: 1000,
        }
    }
}

impl ServiceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse service configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_secs)
    }

    /// Resolve an optional page size against the configured default and cap.
    pub fn history_limit(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.history_page_size)
            .clamp(1, self.history_max_page_size.max(1))
    }

    /// Offsets past `i64::MAX` cannot be bound as SQLite integers; they page
    /// past every record either way.
    pub fn history_offset(&self, requested: Option<u64>) -> u64 {
        requested.unwrap_or(0).min(i64::MAX as u64)
    }

    /// Create the upload and result roots if they do not exist yet.
    pub fn ensure_storage_roots(&self) -> Result<()> {
        for dir in [&self.upload_root, &self.result_root] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }
}
