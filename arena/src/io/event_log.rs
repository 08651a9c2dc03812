//! Append-only structured event records for each match.
//!
//! Events are product artifacts written as JSONL, one timestamped record per
//! line, unaffected by `RUST_LOG`. Recording is fire-and-forget from the
//! controller's perspective: a sink failure must never abort a match, so
//! write errors are swallowed with a warning.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Append-only sink for structured event records.
pub trait EventSink {
    /// Record one event. Infallible from the caller's perspective.
    fn record(&mut self, tag: &str, data: Value);
}

#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    timestamp: DateTime<Utc>,
    event: &'a str,
    data: &'a Value,
}

/// JSONL event log, one file per match under the configured log directory.
#[derive(Debug)]
pub struct JsonlEventLog {
    path: PathBuf,
    file: File,
}

impl JsonlEventLog {
    /// Create `<dir>/<timestamp>.jsonl`, creating the directory if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
        let stamp = Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let path = dir.join(format!("{stamp}.jsonl"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open event log {}", path.display()))?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonlEventLog {
    fn record(&mut self, tag: &str, data: Value) {
        let record = EventRecord {
            timestamp: Utc::now(),
            event: tag,
            data: &data,
        };
        match serde_json::to_string(&record) {
            Ok(line) => {
                if let Err(err) = writeln!(self.file, "{line}") {
                    warn!(tag, err = %err, "failed to append event record");
                }
            }
            Err(err) => warn!(tag, err = %err, "failed to serialize event record"),
        }
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn record(&mut self, _tag: &str, _data: Value) {}
}
