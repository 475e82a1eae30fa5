//! HTTP server module.
//!
//! Axum-based REST API exposing the analysis session to the dashboard
//! frontend: table rows with multi-key sort specs for the table
//! collaborator, composed series for the chart collaborator, and markers
//! for the map collaborator.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiError, AppError};
pub use router::create_router;
pub use state::AppState;
