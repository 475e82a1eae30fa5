//! Snapshot document parsing.
//!
//! A snapshot is one calendar date's payload: the date, the centroid set,
//! and the raw ping set. Parsing injects the snapshot date into every ping,
//! runs the record merger, and computes a content checksum so the session
//! can skip byte-identical reloads.

use crate::api::{Amperage, Centroid, RawPing, Snapshot};
use crate::services::merger;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[derive(serde::Deserialize)]
struct SnapshotInput {
    pub date: NaiveDate,
    pub centroids: Vec<CentroidInput>,
    pub pings: Vec<PingInput>,
}

#[derive(serde::Deserialize)]
struct CentroidInput {
    pub id: String,
    pub name: String,
    pub latitude: qtty::Degrees,
    pub longitude: qtty::Degrees,
    #[serde(default)]
    pub closest_stations: Vec<(String, f64)>,
}

#[derive(serde::Deserialize)]
struct PingInput {
    pub bms_id: String,
    pub country: String,
    pub centroid_id: String,
    pub hour: u8,
    pub amperage: Amperage,
    pub soc_lost: f64,
    #[serde(default)]
    pub last_mapped: String,
    #[serde(default = "unknown_sentinel")]
    pub last_swap_time: String,
    #[serde(default)]
    pub last_swap_state: String,
}

fn unknown_sentinel() -> String {
    "Unknown".to_string()
}

fn validate_input_snapshot(snapshot_json: &str) -> Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(snapshot_json).context("Invalid snapshot JSON")?;
    let obj = value
        .as_object()
        .context("Snapshot document must be a JSON object")?;
    for field in ["date", "centroids", "pings"] {
        if !obj.contains_key(field) {
            anyhow::bail!("Missing required '{}' field", field);
        }
    }
    Ok(())
}

/// Calculate SHA-256 checksum of snapshot JSON content.
///
/// # Arguments
/// * `content` - JSON string content of the snapshot
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Parse one snapshot document from a JSON string.
///
/// Deserializes the document with Serde, validates the required top-level
/// fields, injects the snapshot date into each ping, merges duplicate
/// pings, and stamps the content checksum. Classification is left to the
/// session; a freshly parsed snapshot carries no classifications yet.
pub fn parse_snapshot_json_str(snapshot_json: &str) -> Result<Snapshot> {
    validate_input_snapshot(snapshot_json)?;

    let input: SnapshotInput = serde_json::from_str(snapshot_json)
        .context("Failed to deserialize snapshot JSON using Serde")?;

    let date = input.date;
    let raw_pings: Vec<RawPing> = input
        .pings
        .into_iter()
        .map(|p| {
            anyhow::ensure!(p.hour < 24, "ping hour {} out of range 0-23", p.hour);
            anyhow::ensure!(
                p.soc_lost >= 0.0,
                "ping soc_lost {} must be non-negative",
                p.soc_lost
            );
            Ok(RawPing {
                bms_id: p.bms_id,
                country: p.country,
                centroid_id: p.centroid_id,
                hour: p.hour,
                amperage: p.amperage,
                soc_lost: p.soc_lost,
                last_mapped: p.last_mapped,
                last_swap_time: p.last_swap_time,
                last_swap_state: p.last_swap_state,
                date,
            })
        })
        .collect::<Result<_>>()?;

    let centroids: HashMap<String, Centroid> = input
        .centroids
        .into_iter()
        .map(|c| {
            (
                c.id.clone(),
                Centroid {
                    id: c.id,
                    name: c.name,
                    latitude: c.latitude,
                    longitude: c.longitude,
                    closest_stations: c.closest_stations,
                },
            )
        })
        .collect();

    let merged = merger::merge(raw_pings.iter().map(Into::into));

    Ok(Snapshot {
        date,
        checksum: calculate_checksum(snapshot_json),
        centroids,
        raw_pings,
        merged,
        classifications: HashMap::new(),
    })
}
