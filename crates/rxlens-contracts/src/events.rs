use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::language::Language;

/// Lifecycle entries recorded by the scan journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    ScanStarted {
        language: Language,
        image_mime: String,
        image_bytes: u64,
    },
    ScanCompleted {
        language: Language,
        degraded: bool,
        history_id: Option<String>,
    },
    ScanFailed {
        kind: String,
        message: String,
    },
    ScanDiscarded {
        seq: u64,
    },
    HistoryCleared {
        removed: usize,
    },
}

/// Append-only writer for `events.jsonl`.
///
/// - every line carries `type`, `session_id` and `ts`
/// - one compact JSON object per line
#[derive(Debug, Clone)]
pub struct ScanJournal {
    inner: Arc<ScanJournalInner>,
}

#[derive(Debug)]
struct ScanJournalInner {
    path: PathBuf,
    session_id: String,
    lock: Mutex<()>,
}

impl ScanJournal {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ScanJournalInner {
                path: path.into(),
                session_id: session_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Stamps `event` with this session and the current time and appends it
    /// as one line. Returns the stamped entry.
    ///
    /// A lock poisoned by a panicking writer is reclaimed.
    pub fn record(&self, event: &ScanEvent) -> anyhow::Result<Value> {
        let Value::Object(mut entry) = serde_json::to_value(event)? else {
            anyhow::bail!("scan event did not serialize to an object");
        };
        entry.insert("session_id".into(), self.inner.session_id.clone().into());
        entry.insert("ts".into(), now_utc_iso().into());
        let entry = Value::Object(entry);
        let line = serde_json::to_string(&entry)?;

        let _guard = self
            .inner
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(dir) = self.inner.path.parent().filter(|dir| !dir.exists()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut journal = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)
            .with_context(|| format!("failed to open scan journal {}", self.inner.path.display()))?;
        writeln!(journal, "{line}")?;
        Ok(entry)
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
