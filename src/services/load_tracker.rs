//! Batch tracking for asynchronous snapshot ingestion.
//!
//! A batch is one multi-file selection. The tracker stores per-file
//! progress logs and the final report so the frontend can show a busy
//! indicator and stream progress while the load runs.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A single log entry with timestamp and message.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Batch status enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Running,
    Completed,
    Failed,
}

/// Batch metadata and logs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Batch {
    pub batch_id: String,
    pub status: BatchStatus,
    pub logs: Vec<LogEntry>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Final per-file report (loaded / skipped / failed breakdown)
    pub report: Option<serde_json::Value>,
}

/// In-memory batch tracker.
#[derive(Clone)]
pub struct BatchTracker {
    batches: Arc<RwLock<HashMap<String, Batch>>>,
}

impl BatchTracker {
    /// Create a new batch tracker.
    pub fn new() -> Self {
        Self {
            batches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new batch and return its ID.
    pub fn create_batch(&self) -> String {
        let batch_id = Uuid::new_v4().to_string();
        let batch = Batch {
            batch_id: batch_id.clone(),
            status: BatchStatus::Running,
            logs: vec![],
            created_at: chrono::Utc::now(),
            completed_at: None,
            report: None,
        };
        self.batches.write().insert(batch_id.clone(), batch);
        batch_id
    }

    /// Add a log entry to a batch.
    pub fn log(&self, batch_id: &str, level: LogLevel, message: impl Into<String>) {
        let mut batches = self.batches.write();
        if let Some(batch) = batches.get_mut(batch_id) {
            batch.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level,
                message: message.into(),
            });
        }
    }

    /// Mark a batch as completed with its report.
    pub fn complete_batch(&self, batch_id: &str, report: Option<serde_json::Value>) {
        let mut batches = self.batches.write();
        if let Some(batch) = batches.get_mut(batch_id) {
            batch.status = BatchStatus::Completed;
            batch.completed_at = Some(chrono::Utc::now());
            batch.report = report;
        }
    }

    /// Mark a batch as failed.
    pub fn fail_batch(&self, batch_id: &str, error_message: impl Into<String>) {
        let mut batches = self.batches.write();
        if let Some(batch) = batches.get_mut(batch_id) {
            batch.status = BatchStatus::Failed;
            batch.completed_at = Some(chrono::Utc::now());
            batch.logs.push(LogEntry {
                timestamp: chrono::Utc::now(),
                level: LogLevel::Error,
                message: error_message.into(),
            });
        }
    }

    /// Get a batch by ID.
    pub fn get_batch(&self, batch_id: &str) -> Option<Batch> {
        self.batches.read().get(batch_id).cloned()
    }

    /// Get all logs for a batch.
    pub fn get_logs(&self, batch_id: &str) -> Vec<LogEntry> {
        self.batches
            .read()
            .get(batch_id)
            .map(|batch| batch.logs.clone())
            .unwrap_or_default()
    }
}

impl Default for BatchTracker {
    fn default() -> Self {
        Self::new()
    }
}
