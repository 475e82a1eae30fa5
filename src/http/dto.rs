//! Data Transfer Objects for the HTTP API.
//!
//! These DTOs are used for request/response serialization in the REST API.
//! Core payload types (rows, series, markers) are re-exported from the api
//! module since they already derive Serialize/Deserialize.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Re-export payload types that are already serializable
pub use crate::api::{CentroidMarker, CentroidProfile, Series, SeriesPoint, TableRow};
pub use crate::services::load_tracker::LogEntry;
pub use crate::session::{BatchReport, FileOutcome, SessionSummary};

/// One snapshot file of an upload batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFileDto {
    /// Original file name, used in progress logs and the batch report
    pub name: String,
    /// Snapshot JSON document
    pub content: serde_json::Value,
}

/// Request body for starting a snapshot batch load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBatchRequest {
    pub files: Vec<SnapshotFileDto>,
}

/// Response for batch creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBatchResponse {
    /// Batch ID for tracking the async processing
    pub batch_id: String,
    /// Message about the operation
    pub message: String,
}

/// Batch status response for async processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatusResponse {
    /// Batch ID
    pub batch_id: String,
    /// Batch status
    pub status: String,
    /// Log entries
    pub logs: Vec<LogEntry>,
    /// Per-file report if completed
    pub report: Option<serde_json::Value>,
}

/// Request body for the tolerance slider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToleranceRequest {
    /// Raw slider units; divided by the configured scale before use
    pub raw_units: f64,
}

/// Response after a tolerance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToleranceResponse {
    /// The scaled fraction now in effect
    pub tolerance: f64,
}

/// Request body for replacing the active date set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveDatesRequest {
    pub active: Vec<NaiveDate>,
}

/// Request body for the ordered pivot dimension list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotRequest {
    pub dimensions: Vec<String>,
}

/// Response after a pivot change; unknown names are dropped, not fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PivotResponse {
    pub applied: Vec<String>,
    pub dropped: Vec<String>,
}

/// Request body for the series split option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRequest {
    /// A dimension field name, or "none"
    pub field: String,
}

/// One column of the multi-key sort spec, outermost slot first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortKeyDto {
    /// Index into each row's `group_sort_keys`
    pub slot: usize,
    pub dir: String,
}

/// Full table payload: fresh rows, grouping fields, and the flat sort spec
/// that reproduces per-level descending aggregate order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableResponse {
    pub rows: Vec<TableRow>,
    pub group_by: Vec<String>,
    pub sort: Vec<SortKeyDto>,
}

/// Request body for selecting a pivot group by its key path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub path: Vec<String>,
}

/// Response after a group selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub label: String,
    pub selected_rows: usize,
}

/// Composed series payload for the chart collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub series: BTreeMap<String, Series>,
    pub locked_keys: Vec<String>,
}

/// Locked-baseline status after a lock/clear action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockResponse {
    pub locked_keys: Vec<String>,
}

/// Map marker payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkersResponse {
    pub markers: Vec<CentroidMarker>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Number of loaded snapshot dates
    pub loaded_dates: usize,
}
