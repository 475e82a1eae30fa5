//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! session and service layer for the actual work. The session lock is
//! never held across an await point; every recompute runs synchronously
//! under it.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::sse::{Event, Sse},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;

use super::dto::{
    ActiveDatesRequest, BatchStatusResponse, CentroidProfile, CreateBatchRequest,
    CreateBatchResponse, HealthResponse, LockResponse, MarkersResponse, PivotRequest,
    PivotResponse, SelectionRequest, SelectionResponse, SeriesResponse, SessionSummary,
    SortKeyDto, SplitRequest, TableResponse, ToleranceRequest, ToleranceResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{Dimension, SplitField};
use crate::services::load_tracker::BatchStatus;
use crate::services::snapshot_loader::{self, SnapshotFile};
use crate::services::{export, pivot};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let loaded_dates = state.session.read().loaded_dates().len();

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        loaded_dates,
    }))
}

// =============================================================================
// Snapshot Batches
// =============================================================================

/// POST /v1/snapshots
///
/// Start loading a batch of snapshot files asynchronously. Returns a batch
/// ID for tracking progress; the session is updated once, after every file
/// in the batch has been parsed.
pub async fn create_batch(
    State(state): State<AppState>,
    Json(request): Json<CreateBatchRequest>,
) -> Result<(StatusCode, Json<CreateBatchResponse>), AppError> {
    if request.files.is_empty() {
        return Err(AppError::BadRequest(
            "Batch must contain at least one file".to_string(),
        ));
    }

    let mut files = Vec::with_capacity(request.files.len());
    for file in request.files {
        let content = serde_json::to_string(&file.content)
            .map_err(|e| AppError::BadRequest(format!("Invalid snapshot JSON: {}", e)))?;
        files.push(SnapshotFile {
            name: file.name,
            content,
        });
    }

    let batch_id = state.load_tracker.create_batch();
    let response_batch_id = batch_id.clone();

    let tracker = state.load_tracker.clone();
    let session = state.session.clone();

    tokio::spawn(async move {
        let _ = snapshot_loader::process_batch_async(batch_id, tracker, session, files).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateBatchResponse {
            batch_id: response_batch_id.clone(),
            message: format!(
                "Snapshot load started. Track progress at /v1/batches/{}/logs",
                response_batch_id
            ),
        }),
    ))
}

/// GET /v1/batches/{batch_id}
///
/// Get the current status, logs and final report of a load batch.
pub async fn get_batch_status(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> HandlerResult<BatchStatusResponse> {
    let batch = state
        .load_tracker
        .get_batch(&batch_id)
        .ok_or_else(|| AppError::NotFound(format!("Batch {} not found", batch_id)))?;

    Ok(Json(BatchStatusResponse {
        batch_id: batch.batch_id,
        status: format!("{:?}", batch.status).to_lowercase(),
        logs: batch.logs,
        report: batch.report,
    }))
}

/// GET /v1/batches/{batch_id}/logs
///
/// Stream batch progress logs via Server-Sent Events (SSE).
pub async fn stream_batch_logs(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.load_tracker.get_batch(&batch_id).is_none() {
        return Err(AppError::NotFound(format!("Batch {} not found", batch_id)));
    }

    let tracker = state.load_tracker.clone();
    let stream = async_stream::stream! {
        let mut last_log_count = 0;
        loop {
            let logs = tracker.get_logs(&batch_id);
            for log in logs.iter().skip(last_log_count) {
                let event_data = serde_json::to_string(log).unwrap_or_default();
                yield Ok(Event::default().data(event_data));
            }
            last_log_count = logs.len();

            if let Some(batch) = tracker.get_batch(&batch_id) {
                if batch.status != BatchStatus::Running {
                    let final_event = serde_json::json!({
                        "status": batch.status,
                        "report": batch.report,
                    });
                    yield Ok(Event::default()
                        .event("complete")
                        .data(serde_json::to_string(&final_event).unwrap_or_default()));
                    break;
                }
            } else {
                break;
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}

// =============================================================================
// Session Configuration
// =============================================================================

/// GET /v1/session
///
/// Get the current session configuration summary.
pub async fn get_session(State(state): State<AppState>) -> HandlerResult<SessionSummary> {
    Ok(Json(state.session.read().summary()))
}

/// PUT /v1/session/tolerance
///
/// Change the station tolerance. Accepts raw slider units; scaling to the
/// classifier fraction happens here, and every loaded date is reclassified
/// before the response returns.
pub async fn set_tolerance(
    State(state): State<AppState>,
    Json(request): Json<ToleranceRequest>,
) -> HandlerResult<ToleranceResponse> {
    if !request.raw_units.is_finite() || request.raw_units < 0.0 {
        return Err(AppError::BadRequest(
            "Tolerance must be a non-negative number".to_string(),
        ));
    }

    let fraction = state.config.scale_tolerance(request.raw_units);
    state.session.write().set_tolerance(fraction);

    Ok(Json(ToleranceResponse {
        tolerance: fraction,
    }))
}

/// PUT /v1/session/active-dates
///
/// Replace the active date set. Dates never loaded are ignored.
pub async fn set_active_dates(
    State(state): State<AppState>,
    Json(request): Json<ActiveDatesRequest>,
) -> HandlerResult<SessionSummary> {
    let mut session = state.session.write();
    session.set_active_dates(request.active);
    Ok(Json(session.summary()))
}

/// POST /v1/session/active-dates/{date}/toggle
///
/// Toggle one loaded date in or out of the active set.
pub async fn toggle_date(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> HandlerResult<SessionSummary> {
    let mut session = state.session.write();
    session
        .toggle_date(date)
        .ok_or_else(|| AppError::NotFound(format!("Date {} is not loaded", date)))?;
    Ok(Json(session.summary()))
}

/// POST /v1/session/active-dates/invert
///
/// Activate every inactive loaded date and vice versa.
pub async fn invert_active_dates(State(state): State<AppState>) -> HandlerResult<SessionSummary> {
    let mut session = state.session.write();
    session.invert_active_dates();
    Ok(Json(session.summary()))
}

/// PUT /v1/session/pivot
///
/// Replace the ordered pivot dimension list. Unknown field names are
/// dropped and reported back, never failing the request.
pub async fn set_pivot(
    State(state): State<AppState>,
    Json(request): Json<PivotRequest>,
) -> HandlerResult<PivotResponse> {
    let mut parsed: Vec<Dimension> = Vec::new();
    let mut dropped: Vec<String> = Vec::new();
    for name in request.dimensions {
        match Dimension::parse(&name) {
            Ok(dim) => parsed.push(dim),
            Err(_) => dropped.push(name),
        }
    }

    let mut session = state.session.write();
    session.set_pivot_dimensions(parsed);
    let applied = session
        .pivot_dimensions()
        .iter()
        .map(|d| d.field_name().to_string())
        .collect();

    Ok(Json(PivotResponse { applied, dropped }))
}

/// PUT /v1/session/split
///
/// Change the series split option ("none" or a dimension field name).
/// Takes effect on the next series composition.
pub async fn set_split(
    State(state): State<AppState>,
    Json(request): Json<SplitRequest>,
) -> HandlerResult<SessionSummary> {
    let split = SplitField::parse(&request.field)?;
    let mut session = state.session.write();
    session.set_split_field(split);
    Ok(Json(session.summary()))
}

// =============================================================================
// Derived Views
// =============================================================================

/// GET /v1/table
///
/// Get the full table payload: fresh rows with injected aggregate sort
/// keys, the grouping field list, and the flat multi-key sort spec that
/// reproduces per-level descending aggregate order.
pub async fn get_table(State(state): State<AppState>) -> HandlerResult<TableResponse> {
    let view = state.session.read().table_view();

    let sort = pivot::sort_spec(view.dimensions.len())
        .into_iter()
        .map(|slot| SortKeyDto {
            slot,
            dir: "desc".to_string(),
        })
        .collect();

    Ok(Json(TableResponse {
        rows: view.rows,
        group_by: view
            .dimensions
            .iter()
            .map(|d| d.field_name().to_string())
            .collect(),
        sort,
    }))
}

/// POST /v1/selection
///
/// Select the pivot group at the given key path (a group click). The
/// group's subtree rows become the series and export input.
pub async fn select_group(
    State(state): State<AppState>,
    Json(request): Json<SelectionRequest>,
) -> HandlerResult<SelectionResponse> {
    let mut session = state.session.write();
    let selected_rows = session.select_group(&request.path).ok_or_else(|| {
        AppError::NotFound(format!("No group at path {:?}", request.path))
    })?;

    let label = session
        .selection()
        .map(|s| s.default_key.clone())
        .unwrap_or_default();

    Ok(Json(SelectionResponse {
        label,
        selected_rows,
    }))
}

/// GET /v1/series
///
/// Compose the series for the current selection, with any locked baseline
/// overriding live values key by key.
pub async fn get_series(State(state): State<AppState>) -> HandlerResult<SeriesResponse> {
    let mut session = state.session.write();
    let series = session.compose_selected_series()?;
    Ok(Json(SeriesResponse {
        series,
        locked_keys: session.locked_keys(),
    }))
}

/// POST /v1/series/lock
///
/// Freeze the current composed series as the comparison baseline.
pub async fn lock_series(State(state): State<AppState>) -> HandlerResult<LockResponse> {
    let mut session = state.session.write();
    if !session.lock_current_series() {
        return Err(AppError::Session(crate::error::SessionError::EmptySelection));
    }
    Ok(Json(LockResponse {
        locked_keys: session.locked_keys(),
    }))
}

/// DELETE /v1/series/lock
///
/// Remove the locked baseline; composition returns to live values.
pub async fn clear_locked_series(State(state): State<AppState>) -> HandlerResult<LockResponse> {
    let mut session = state.session.write();
    session.clear_locked_series();
    Ok(Json(LockResponse {
        locked_keys: session.locked_keys(),
    }))
}

/// GET /v1/map/markers
///
/// Get one marker per unique centroid over the active dates, with the
/// classification-derived color.
pub async fn get_markers(State(state): State<AppState>) -> HandlerResult<MarkersResponse> {
    Ok(Json(MarkersResponse {
        markers: state.session.read().map_markers(),
    }))
}

/// GET /v1/centroids/{name}
///
/// Get the detail profile for one centroid by dynamic name: hour
/// histogram, amperage split, totals and coordinates.
pub async fn get_centroid_profile(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> HandlerResult<CentroidProfile> {
    let profile = state
        .session
        .read()
        .centroid_profile(&name)
        .ok_or_else(|| AppError::NotFound(format!("Centroid '{}' not found", name)))?;
    Ok(Json(profile))
}

/// GET /v1/export.csv
///
/// Export the current selection as CSV: one row per unique centroid with
/// summed leakage, coordinates, and a Google Maps link.
pub async fn export_csv(State(state): State<AppState>) -> Result<Response, AppError> {
    let rows = state.session.read().export_selection_rows()?;
    let csv_text = export::write_csv(&rows)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"selection_export.csv\"",
            ),
        ],
        csv_text,
    )
        .into_response())
}
