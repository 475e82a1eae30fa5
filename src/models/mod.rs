//! Input document models and parsing.

pub mod snapshot;

pub use snapshot::{calculate_checksum, parse_snapshot_json_str};
