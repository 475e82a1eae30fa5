//! Core data model and DTOs for the swap-telemetry engine.
//!
//! Everything that crosses a component boundary lives here: the parsed
//! snapshot contents, the merged ping records, the flattened table rows
//! handed to the table collaborator, and the chart/map payload types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Amperage reading: a raw numeric draw in amps, or a pre-bucketed label
/// when the exporter already collapsed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amperage {
    Amps(f64),
    Label(String),
}

/// Low-draw amperage bucket label.
pub const AMPERAGE_LOW_BUCKET: &str = "<18A";
/// High-draw amperage bucket label.
pub const AMPERAGE_HIGH_BUCKET: &str = ">=18A";

impl Amperage {
    /// Collapse the reading into the two-bucket split used by the charts.
    pub fn bucket(&self) -> &'static str {
        match self {
            Amperage::Amps(a) if *a < 18.0 => AMPERAGE_LOW_BUCKET,
            Amperage::Amps(_) => AMPERAGE_HIGH_BUCKET,
            Amperage::Label(l) if l == AMPERAGE_LOW_BUCKET => AMPERAGE_LOW_BUCKET,
            Amperage::Label(_) => AMPERAGE_HIGH_BUCKET,
        }
    }
}

/// One telemetry observation as parsed from a snapshot, with the owning
/// snapshot's date injected at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPing {
    pub bms_id: String,
    pub country: String,
    pub centroid_id: String,
    /// Local snapshot hour, 0-23.
    pub hour: u8,
    pub amperage: Amperage,
    /// Non-negative SOC loss quantity.
    pub soc_lost: f64,
    pub last_mapped: String,
    /// Timestamp, or the sentinel "Unknown".
    pub last_swap_time: String,
    pub last_swap_state: String,
    pub date: NaiveDate,
}

/// A ping after merging: sub-measurements of one underlying swap event
/// collapsed into a single record. The `hour` and `amperage` dimensions are
/// consumed by the merge; `soc_lost` is the sum over the group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedPing {
    pub bms_id: String,
    pub country: String,
    pub centroid_id: String,
    pub last_mapped: String,
    pub last_swap_time: String,
    pub last_swap_state: String,
    pub date: NaiveDate,
    pub soc_lost: f64,
}

impl From<&RawPing> for MergedPing {
    fn from(ping: &RawPing) -> Self {
        Self {
            bms_id: ping.bms_id.clone(),
            country: ping.country.clone(),
            centroid_id: ping.centroid_id.clone(),
            last_mapped: ping.last_mapped.clone(),
            last_swap_time: ping.last_swap_time.clone(),
            last_swap_state: ping.last_swap_state.clone(),
            date: ping.date,
            soc_lost: ping.soc_lost,
        }
    }
}

/// A geolocated cluster point: a physical station or an inferred stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Centroid {
    /// Unique within one snapshot; not stable across snapshot dates.
    pub id: String,
    /// Static label from the clustering step.
    pub name: String,
    pub latitude: qtty::Degrees,
    pub longitude: qtty::Degrees,
    /// `(station_name, distance)` pairs, ascending by distance.
    pub closest_stations: Vec<(String, f64)>,
}

/// Station / non-station type assigned by the tolerance classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CentroidKind {
    #[serde(rename = "station")]
    Station,
    #[serde(rename = "non-station")]
    NonStation,
}

impl CentroidKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CentroidKind::Station => "station",
            CentroidKind::NonStation => "non-station",
        }
    }
}

/// Derived display name and type for one centroid at the current tolerance.
/// Pure function of the nearest-station distance; recomputed on every
/// tolerance change or snapshot load, never stored in the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub dynamic_name: String,
    pub kind: CentroidKind,
}

/// One calendar date's payload. Never removed once loaded; only toggled in
/// and out of the active date selection.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub date: NaiveDate,
    /// SHA-256 of the source document, used to skip byte-identical reloads.
    pub checksum: String,
    pub centroids: HashMap<String, Centroid>,
    /// Pre-merge pings, retained for the hour/amperage profile charts.
    pub raw_pings: Vec<RawPing>,
    /// Post-merge pings; the table and series pipelines read these.
    pub merged: Vec<MergedPing>,
    /// Current classification per centroid id, overwritten whole on each
    /// reclassification.
    pub classifications: HashMap<String, Classification>,
}

/// Grouping dimensions available to the pivot and the series split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Bms,
    Country,
    CentroidId,
    CentroidName,
    CentroidType,
    LastMapped,
    Date,
}

impl Dimension {
    /// Field name as exposed to the table collaborator.
    pub fn field_name(&self) -> &'static str {
        match self {
            Dimension::Bms => "bms",
            Dimension::Country => "country",
            Dimension::CentroidId => "centroid_id",
            Dimension::CentroidName => "centroid_name",
            Dimension::CentroidType => "centroid_type",
            Dimension::LastMapped => "last_mapped",
            Dimension::Date => "date",
        }
    }

    /// Parse a collaborator-supplied field name.
    pub fn parse(name: &str) -> Result<Self, crate::error::SessionError> {
        match name {
            "bms" => Ok(Dimension::Bms),
            "country" => Ok(Dimension::Country),
            "centroid_id" => Ok(Dimension::CentroidId),
            "centroid_name" => Ok(Dimension::CentroidName),
            "centroid_type" => Ok(Dimension::CentroidType),
            "last_mapped" => Ok(Dimension::LastMapped),
            "date" => Ok(Dimension::Date),
            other => Err(crate::error::SessionError::UnknownDimension(
                other.to_string(),
            )),
        }
    }
}

/// Series split selector: one default-keyed series, or one series per
/// distinct value of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitField {
    #[default]
    None,
    By(Dimension),
}

impl SplitField {
    /// Parse the collaborator value ("none" or a dimension field name).
    pub fn parse(value: &str) -> Result<Self, crate::error::SessionError> {
        if value == "none" {
            Ok(SplitField::None)
        } else {
            Dimension::parse(value).map(SplitField::By)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitField::None => "none",
            SplitField::By(dim) => dim.field_name(),
        }
    }
}

/// One flattened row handed to the table collaborator. A fresh row array is
/// supplied on every state change; the collaborator retains nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    pub bms: String,
    pub country: String,
    pub centroid_id: String,
    /// Dynamic (classification-derived) name.
    pub centroid_name: String,
    pub centroid_type: CentroidKind,
    pub last_mapped: String,
    pub date: NaiveDate,
    pub soc_lost: f64,
    /// Per-depth aggregate sort keys, slot k-1 for the depth-k ancestor
    /// group. Sized to the active pivot depth; unused slots hold the
    /// encoded-zero sentinel.
    pub group_sort_keys: Vec<String>,
}

impl TableRow {
    /// Value of one grouping dimension, as the string the table groups on.
    pub fn dimension_value(&self, dim: Dimension) -> String {
        match dim {
            Dimension::Bms => self.bms.clone(),
            Dimension::Country => self.country.clone(),
            Dimension::CentroidId => self.centroid_id.clone(),
            Dimension::CentroidName => self.centroid_name.clone(),
            Dimension::CentroidType => self.centroid_type.as_str().to_string(),
            Dimension::LastMapped => self.last_mapped.clone(),
            Dimension::Date => self.date.to_string(),
        }
    }
}

/// One point of a trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: NaiveDate,
    pub y: f64,
}

/// A date-ascending trend series for one split key.
pub type Series = Vec<SeriesPoint>;

/// Map marker for one centroid; color is classification-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidMarker {
    pub id: String,
    pub name: String,
    pub latitude: qtty::Degrees,
    pub longitude: qtty::Degrees,
    pub color: String,
}

/// Amperage-bucket split of SOC loss for one centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmperageSplit {
    /// Total for draws under 18 A.
    pub low: f64,
    /// Total for draws at or above 18 A.
    pub high: f64,
}

/// Per-centroid detail payload behind the hour and amperage charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidProfile {
    pub name: String,
    pub kind: CentroidKind,
    pub latitude: qtty::Degrees,
    pub longitude: qtty::Degrees,
    pub google_maps_link: String,
    pub total_soc_lost: f64,
    /// SOC loss per local hour, exactly 24 buckets.
    pub hourly: Vec<f64>,
    pub amperage: AmperageSplit,
}
