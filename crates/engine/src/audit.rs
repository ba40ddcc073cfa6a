//! Audit sink - fire-and-forget operation trail
//!
//! One human-readable event per completed or rejected operation, emitted
//! strictly after commit/rollback and never while locks are held. A sink
//! failure is logged and never rolls back a committed financial
//! operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub at: DateTime<Utc>,
    /// Operation name: deposit, withdraw, transfer, open_account, close_account
    pub operation: String,
    /// "ok", "duplicate", or a stable rejection code
    pub outcome: String,
    /// Human-readable action line
    pub detail: String,
}

impl AuditEvent {
    pub fn new(operation: &str, outcome: &str, detail: String) -> Self {
        Self {
            at: Utc::now(),
            operation: operation.to_string(),
            outcome: outcome.to_string(),
            detail,
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.operation, self.outcome, self.detail)
    }
}

/// Receives audit events. Implementations must not block for long and
/// must swallow their own failures.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Sink that logs events through `tracing`.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        tracing::info!(target: "vaultx::audit", "{}", event);
    }
}

/// Sink that appends events to date-partitioned JSONL files
/// (`<dir>/2026-08-27.jsonl`), one JSON object per line.
pub struct JsonlAuditSink {
    base_path: PathBuf,
    current_writer: Mutex<Option<DatedWriter>>,
}

struct DatedWriter {
    date: String,
    writer: BufWriter<File>,
}

impl JsonlAuditSink {
    pub fn new<P: AsRef<Path>>(base_path: P) -> std::io::Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            current_writer: Mutex::new(None),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, date: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", date))
    }

    fn append(&self, event: &AuditEvent) -> std::io::Result<()> {
        let date = event.at.format("%Y-%m-%d").to_string();
        let json = serde_json::to_string(event)?;

        let mut guard = self.current_writer.lock().expect("audit writer poisoned");

        let needs_new_file = guard.as_ref().map_or(true, |w| w.date != date);
        if needs_new_file {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.file_path(&date))?;
            *guard = Some(DatedWriter {
                date,
                writer: BufWriter::new(file),
            });
        }

        if let Some(ref mut w) = *guard {
            writeln!(w.writer, "{}", json)?;
            w.writer.flush()?;
        }
        Ok(())
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Err(err) = self.append(event) {
            // Never escalated: the financial operation already committed.
            tracing::warn!(target: "vaultx::audit", "audit append failed: {}", err);
        }
    }
}
