//! Map marker derivation.
//!
//! The map collaborator renders the markers as-is; the core only supplies
//! classification-derived color and the external maps link used by the
//! detail panel and the CSV export.

use crate::api::{Centroid, CentroidKind, CentroidMarker, Classification};

/// Marker color for a centroid classification.
pub fn marker_color(kind: CentroidKind) -> &'static str {
    match kind {
        CentroidKind::Station => "green",
        CentroidKind::NonStation => "red",
    }
}

/// Google Maps link for a coordinate pair.
pub fn google_maps_link(latitude: qtty::Degrees, longitude: qtty::Degrees) -> String {
    format!(
        "https://www.google.com/maps?q={},{}",
        latitude.value(),
        longitude.value()
    )
}

/// Build the marker for one classified centroid.
pub fn marker(centroid: &Centroid, classification: &Classification) -> CentroidMarker {
    CentroidMarker {
        id: centroid.id.clone(),
        name: classification.dynamic_name.clone(),
        latitude: centroid.latitude,
        longitude: centroid.longitude,
        color: marker_color(classification.kind).to_string(),
    }
}
