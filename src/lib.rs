//! # Swaplens
//!
//! Analytics engine for battery-swap telemetry.
//!
//! This crate ingests daily JSON snapshots of swap-station telemetry
//! ("pings" of SOC loss observed at geolocated centroids), merges duplicate
//! observations, classifies centroids as stations or incidental stops
//! against a user-adjustable distance tolerance, and serves pivot-table,
//! time-series, map-marker and CSV views of the aggregated data over a REST
//! API for the dashboard frontend.
//!
//! ## Features
//!
//! - **Snapshot Loading**: Parse daily snapshot documents from JSON format
//! - **Record Merging**: Collapse sub-measurements of one swap event while
//!   summing SOC loss
//! - **Tolerance Classification**: Dynamic station / non-station labeling
//!   from nearest-station distances
//! - **Pivot Aggregation**: Arbitrary-depth grouping with per-level
//!   sortable aggregate keys
//! - **Series Composition**: Date-aligned, zero-filled trend series with a
//!   lockable baseline
//! - **HTTP API**: RESTful endpoints for frontend integration
//!
//! ## Architecture
//!
//! - [`api`]: Core data model and Data Transfer Objects (DTOs)
//! - [`models`]: Snapshot document parsing and validation
//! - [`services`]: Aggregation, classification and export logic
//! - [`session`]: The in-memory analysis session and its state transitions
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod api;
pub mod config;
pub mod error;

pub mod models;

pub mod services;
pub mod session;

#[cfg(feature = "http-server")]
pub mod http;
