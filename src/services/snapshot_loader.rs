//! Async snapshot batch ingestion.
//!
//! Parses each file of a multi-file selection in the background, emitting
//! progress logs, and applies the whole batch to the session in a single
//! step so no partial-batch state is ever visible. Best-effort semantics:
//! a malformed file fails that file only and is surfaced in the report,
//! never aborting its siblings.

use crate::error::SessionError;
use crate::models;
use crate::services::load_tracker::{BatchTracker, LogLevel};
use crate::session::{BatchReport, FileOutcome, Session};
use parking_lot::RwLock;
use std::sync::Arc;

/// One file of a batch as received from the frontend.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    pub name: String,
    pub content: String,
}

/// Process a snapshot batch asynchronously: parse every file, then merge
/// the results into the session at once.
///
/// Designed to be spawned as a background task; progress goes to the batch
/// tracker so users can follow along via SSE.
pub async fn process_batch_async(
    batch_id: String,
    tracker: BatchTracker,
    session: Arc<RwLock<Session>>,
    files: Vec<SnapshotFile>,
) -> Result<BatchReport, String> {
    tracker.log(
        &batch_id,
        LogLevel::Info,
        format!("Starting batch of {} file(s)...", files.len()),
    );

    let mut parsed = Vec::new();
    let mut failed: Vec<FileOutcome> = Vec::new();

    for file in files {
        let name = file.name.clone();
        tracker.log(&batch_id, LogLevel::Info, format!("Parsing {}...", name));

        let outcome =
            tokio::task::spawn_blocking(move || models::parse_snapshot_json_str(&file.content))
                .await;

        match outcome {
            Ok(Ok(snapshot)) => {
                tracker.log(
                    &batch_id,
                    LogLevel::Success,
                    format!(
                        "Parsed {} for {}: {} pings ({} after merge), {} centroids",
                        name,
                        snapshot.date,
                        snapshot.raw_pings.len(),
                        snapshot.merged.len(),
                        snapshot.centroids.len()
                    ),
                );
                parsed.push((name, snapshot));
            }
            Ok(Err(e)) => {
                let err = SessionError::MalformedSnapshot {
                    file: name.clone(),
                    reason: e.to_string(),
                };
                tracker.log(&batch_id, LogLevel::Error, err.to_string());
                failed.push(FileOutcome {
                    file: name,
                    detail: e.to_string(),
                });
            }
            Err(e) => {
                tracker.log(
                    &batch_id,
                    LogLevel::Error,
                    format!("Parse task panic for {}: {}", name, e),
                );
                failed.push(FileOutcome {
                    file: name,
                    detail: format!("parse task panic: {}", e),
                });
            }
        }
    }

    // One session update for the whole batch, after every file has been
    // parsed; dependent views never see an intermediate state.
    let mut report = {
        let mut session = session.write();
        session.apply_batch(parsed)
    };
    report.failed = failed;

    for outcome in &report.skipped {
        tracker.log(
            &batch_id,
            LogLevel::Warning,
            format!("Skipped {}: {}", outcome.file, outcome.detail),
        );
    }

    tracker.log(
        &batch_id,
        LogLevel::Success,
        format!(
            "Batch complete: {} loaded, {} skipped, {} failed",
            report.loaded.len(),
            report.skipped.len(),
            report.failed.len()
        ),
    );
    tracker.complete_batch(&batch_id, serde_json::to_value(&report).ok());

    Ok(report)
}
