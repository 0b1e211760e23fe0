//! Template store — one canonical reply template per discovered category,
//! persisted as a single JSON object keyed by category name.
//!
//! Single-process by construction: the classifier reloads the file before
//! every classification and rewrites it wholesale on change. There is no
//! file locking, so concurrent writers from separate processes would race.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::StoreError;

/// Canonical reply for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTemplate {
    pub subject: String,
    pub body: String,
}

/// File-backed mapping from category name to reply template.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
}

impl TemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full mapping. An absent or empty file is an empty store;
    /// an unreadable or corrupt file is a real error.
    pub async fn load(&self) -> Result<HashMap<String, ReplyTemplate>, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Template store absent, starting empty");
                return Ok(HashMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        if raw.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(serde_json::from_slice(&raw)?)
    }

    /// Replace the stored mapping wholesale. The file is flushed to disk
    /// before this returns, so a subsequent `load` always sees the write.
    pub async fn save(&self, templates: &HashMap<String, ReplyTemplate>) -> Result<(), StoreError> {
        let raw = serde_json::to_vec_pretty(templates)?;

        let mut file = tokio::fs::File::create(&self.path).await?;
        file.write_all(&raw).await?;
        file.sync_all().await?;

        Ok(())
    }
}
