//! Tolerance classifier.
//!
//! A centroid whose nearest pre-computed station lies strictly closer than
//! the global tolerance is displayed as that station; everything else keeps
//! its static cluster name. Classification is a pure function of the
//! nearest-station distance and the tolerance, recomputed on every
//! tolerance change (all dates) or snapshot load (that date only).

use crate::api::{Centroid, CentroidKind, Classification, Snapshot};
use crate::error::{SessionError, SessionResult};
use std::collections::HashMap;
use tracing::warn;

/// Classify one centroid against the scaled tolerance fraction.
///
/// Strict less-than: a centroid at exactly the tolerance distance stays a
/// non-station. `closest_stations` is pre-sorted ascending, so only the
/// first entry is consulted.
///
/// # Errors
/// `MissingProximityData` when the centroid has no nearest-station entries.
pub fn classify(centroid: &Centroid, tolerance: f64) -> SessionResult<Classification> {
    let (station_name, distance) =
        centroid
            .closest_stations
            .first()
            .ok_or_else(|| SessionError::MissingProximityData {
                centroid: centroid.name.clone(),
            })?;

    if *distance < tolerance {
        Ok(Classification {
            dynamic_name: station_name.clone(),
            kind: CentroidKind::Station,
        })
    } else {
        Ok(Classification {
            dynamic_name: centroid.name.clone(),
            kind: CentroidKind::NonStation,
        })
    }
}

/// Classify, falling back to the static name on missing proximity data.
///
/// The fallback is logged as a data-quality warning, not an error; the
/// centroid stays usable with its static label and non-station type.
pub fn classify_or_fallback(centroid: &Centroid, tolerance: f64) -> Classification {
    match classify(centroid, tolerance) {
        Ok(classification) => classification,
        Err(err) => {
            warn!(centroid = %centroid.name, %err, "falling back to static centroid label");
            Classification {
                dynamic_name: centroid.name.clone(),
                kind: CentroidKind::NonStation,
            }
        }
    }
}

/// Reclassify every centroid of one snapshot in place.
///
/// Scoped trigger: loading a new date reclassifies that date only, keeping
/// recompute cost bounded as more dates accumulate. The classification map
/// is overwritten whole, never patched.
pub fn reclassify_snapshot(snapshot: &mut Snapshot, tolerance: f64) {
    let classifications: HashMap<String, Classification> = snapshot
        .centroids
        .values()
        .map(|c| (c.id.clone(), classify_or_fallback(c, tolerance)))
        .collect();
    snapshot.classifications = classifications;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_centroid(closest: Vec<(String, f64)>) -> Centroid {
        Centroid {
            id: "c1".to_string(),
            name: "Cluster 1".to_string(),
            latitude: qtty::Degrees::new(6.45),
            longitude: qtty::Degrees::new(3.39),
            closest_stations: closest,
        }
    }

    #[test]
    fn test_within_tolerance_becomes_station() {
        let centroid = create_test_centroid(vec![("StationA".to_string(), 0.00002)]);
        let classification = classify(&centroid, 0.00005).unwrap();
        assert_eq!(classification.kind, CentroidKind::Station);
        assert_eq!(classification.dynamic_name, "StationA");
    }

    #[test]
    fn test_outside_tolerance_keeps_static_name() {
        let centroid = create_test_centroid(vec![("StationA".to_string(), 0.00002)]);
        let classification = classify(&centroid, 0.00001).unwrap();
        assert_eq!(classification.kind, CentroidKind::NonStation);
        assert_eq!(classification.dynamic_name, "Cluster 1");
    }

    #[test]
    fn test_boundary_distance_is_non_station() {
        // Strict less-than only: d == tolerance does not qualify.
        let centroid = create_test_centroid(vec![("StationA".to_string(), 0.00005)]);
        let classification = classify(&centroid, 0.00005).unwrap();
        assert_eq!(classification.kind, CentroidKind::NonStation);
    }

    #[test]
    fn test_only_nearest_station_consulted() {
        let centroid = create_test_centroid(vec![
            ("Near".to_string(), 0.00001),
            ("Far".to_string(), 0.5),
        ]);
        let classification = classify(&centroid, 0.00005).unwrap();
        assert_eq!(classification.dynamic_name, "Near");
    }

    #[test]
    fn test_missing_proximity_data_errors() {
        let centroid = create_test_centroid(vec![]);
        let err = classify(&centroid, 0.00005).unwrap_err();
        assert!(matches!(err, SessionError::MissingProximityData { .. }));
    }

    #[test]
    fn test_fallback_keeps_static_label() {
        let centroid = create_test_centroid(vec![]);
        let classification = classify_or_fallback(&centroid, 0.00005);
        assert_eq!(classification.kind, CentroidKind::NonStation);
        assert_eq!(classification.dynamic_name, "Cluster 1");
    }

    #[test]
    fn test_monotonic_in_tolerance() {
        let centroid = create_test_centroid(vec![("StationA".to_string(), 0.0003)]);
        let mut was_station = false;
        for step in 0..20 {
            let tolerance = step as f64 * 0.0001;
            let kind = classify(&centroid, tolerance).unwrap().kind;
            if was_station {
                // Raising tolerance never converts a station back.
                assert_eq!(kind, CentroidKind::Station);
            }
            was_station = kind == CentroidKind::Station;
        }
        assert!(was_station);
    }

    #[test]
    fn test_reclassify_snapshot_covers_all_centroids() {
        let mut snapshot = crate::api::Snapshot {
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            checksum: String::new(),
            centroids: [
                (
                    "c1".to_string(),
                    create_test_centroid(vec![("StationA".to_string(), 0.00002)]),
                ),
                ("c2".to_string(), {
                    let mut c = create_test_centroid(vec![("StationB".to_string(), 0.4)]);
                    c.id = "c2".to_string();
                    c.name = "Cluster 2".to_string();
                    c
                }),
            ]
            .into_iter()
            .collect(),
            raw_pings: vec![],
            merged: vec![],
            classifications: HashMap::new(),
        };

        reclassify_snapshot(&mut snapshot, 0.00005);
        assert_eq!(snapshot.classifications.len(), 2);
        assert_eq!(
            snapshot.classifications["c1"].kind,
            CentroidKind::Station
        );
        assert_eq!(
            snapshot.classifications["c2"].kind,
            CentroidKind::NonStation
        );
    }
}
