use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prescription::PrescriptionInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Path of the locally held copy of the scanned image.
    pub image: String,
    pub prescription_info: PrescriptionInfo,
}

impl HistoryItem {
    pub fn new(image: impl Into<String>, prescription_info: PrescriptionInfo) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            image: image.into(),
            prescription_info,
        }
    }
}

/// Newest-first scan history persisted as one JSON array.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only view. An unreadable history file lists as empty; writers
    /// refuse to touch it instead.
    pub fn list(&self) -> Vec<HistoryItem> {
        self.load().unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<HistoryItem> {
        self.list().into_iter().find(|item| item.id == id)
    }

    pub fn latest(&self) -> Option<HistoryItem> {
        self.list().into_iter().next()
    }

    pub fn prepend(&self, item: HistoryItem) -> anyhow::Result<()> {
        let mut items = self.load()?;
        items.insert(0, item);
        self.write(&items)
    }

    /// Swaps the result stored on item `id`, as done after a language
    /// re-analysis. Returns the updated item, or `None` when `id` is gone.
    pub fn replace(
        &self,
        id: &str,
        prescription_info: PrescriptionInfo,
    ) -> anyhow::Result<Option<HistoryItem>> {
        let mut items = self.load()?;
        let Some(target) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(None);
        };
        target.prescription_info = prescription_info;
        let updated = target.clone();
        self.write(&items)?;
        Ok(Some(updated))
    }

    /// Removes every item and returns what was removed.
    pub fn clear(&self) -> anyhow::Result<Vec<HistoryItem>> {
        let removed = self.list();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(removed)
    }

    fn load(&self) -> anyhow::Result<Vec<HistoryItem>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("failed to read {}", self.path.display())))
            }
        };
        serde_json::from_str(&raw)
            .with_context(|| format!("history file {} is not readable", self.path.display()))
    }

    fn write(&self, items: &[HistoryItem]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(items)?)?;
        Ok(())
    }
}
