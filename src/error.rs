//! Error types for session operations.
//!
//! No variant here is fatal to the session: a malformed file fails that
//! file's load, a missing-data centroid falls back to its static label,
//! and the dashboard stays interactive after every failure.

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Error type for session operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// Snapshot file could not be parsed or is missing required fields.
    /// Rejects that file only; sibling files in the same batch proceed.
    #[error("malformed snapshot '{file}': {reason}")]
    MalformedSnapshot { file: String, reason: String },

    /// Centroid has no nearest-station data. The centroid keeps its static
    /// name and non-station type; callers log this as a data-quality
    /// warning rather than failing.
    #[error("centroid '{centroid}' has no nearest-station distances")]
    MissingProximityData { centroid: String },

    /// Pivot or split references a field that is not a row dimension.
    /// The offending dimension is dropped; the rest still apply.
    #[error("unknown grouping dimension '{0}'")]
    UnknownDimension(String),

    /// Export or series composition was invoked with no selected rows.
    #[error("no rows selected; click a group first")]
    EmptySelection,
}
