//! Integration tests for snapshot document parsing.

use swaplens::api::Amperage;
use swaplens::models::{calculate_checksum, parse_snapshot_json_str};

fn minimal_doc(date: &str, pings_json: &str) -> String {
    format!(
        r#"{{
            "date": "{}",
            "centroids": [
                {{ "id": "c1", "name": "Cluster 1", "latitude": 6.45, "longitude": 3.39,
                   "closest_stations": [["StationA", 0.00002]] }}
            ],
            "pings": [{}]
        }}"#,
        date, pings_json
    )
}

fn ping_json(bms: &str, hour: u8, amperage: &str, soc_lost: f64) -> String {
    format!(
        r#"{{ "bms_id": "{}", "country": "NG", "centroid_id": "c1", "hour": {},
             "amperage": {}, "soc_lost": {}, "last_mapped": "m1",
             "last_swap_time": "2024-05-01T09:00:00", "last_swap_state": "done" }}"#,
        bms, hour, amperage, soc_lost
    )
}

#[test]
fn test_merge_scenario_from_two_sub_measurements() {
    // Two pings sharing every field except hour/amperage collapse into one
    // record with soc_lost = 8.
    let doc = minimal_doc(
        "2024-05-01",
        &[ping_json("b1", 1, "12.0", 5.0), ping_json("b1", 2, "20.0", 3.0)].join(","),
    );
    let snapshot = parse_snapshot_json_str(&doc).unwrap();

    assert_eq!(snapshot.raw_pings.len(), 2);
    assert_eq!(snapshot.merged.len(), 1);
    assert_eq!(snapshot.merged[0].soc_lost, 8.0);
}

#[test]
fn test_merge_conserves_total_within_snapshot() {
    let pings: Vec<String> = (0..12)
        .map(|i| ping_json(if i % 2 == 0 { "b1" } else { "b2" }, i, "10.0", i as f64))
        .collect();
    let doc = minimal_doc("2024-05-01", &pings.join(","));
    let snapshot = parse_snapshot_json_str(&doc).unwrap();

    let raw_total: f64 = snapshot.raw_pings.iter().map(|p| p.soc_lost).sum();
    let merged_total: f64 = snapshot.merged.iter().map(|p| p.soc_lost).sum();
    assert!((raw_total - merged_total).abs() < 1e-9);
}

#[test]
fn test_zero_loss_ping_survives_parse_and_merge() {
    let doc = minimal_doc("2024-05-01", &ping_json("b1", 4, "10.0", 0.0));
    let snapshot = parse_snapshot_json_str(&doc).unwrap();
    assert_eq!(snapshot.merged.len(), 1);
    assert_eq!(snapshot.merged[0].soc_lost, 0.0);
}

#[test]
fn test_amperage_accepts_numeric_and_label() {
    let doc = minimal_doc(
        "2024-05-01",
        &[
            ping_json("b1", 1, "16.5", 1.0),
            ping_json("b2", 1, "\"<18A\"", 2.0),
        ]
        .join(","),
    );
    let snapshot = parse_snapshot_json_str(&doc).unwrap();

    let b1 = snapshot.raw_pings.iter().find(|p| p.bms_id == "b1").unwrap();
    assert_eq!(b1.amperage, Amperage::Amps(16.5));
    let b2 = snapshot.raw_pings.iter().find(|p| p.bms_id == "b2").unwrap();
    assert_eq!(b2.amperage, Amperage::Label("<18A".to_string()));
}

#[test]
fn test_centroid_without_proximity_data_parses() {
    // Classification handles the missing data later; parsing accepts it.
    let doc = r#"{
        "date": "2024-05-01",
        "centroids": [
            { "id": "c1", "name": "Cluster 1", "latitude": 1.0, "longitude": 2.0 }
        ],
        "pings": []
    }"#;
    let snapshot = parse_snapshot_json_str(doc).unwrap();
    assert!(snapshot.centroids["c1"].closest_stations.is_empty());
}

#[test]
fn test_empty_centroids_and_pings_accepted() {
    let doc = r#"{ "date": "2024-05-01", "centroids": [], "pings": [] }"#;
    let snapshot = parse_snapshot_json_str(doc).unwrap();
    assert!(snapshot.centroids.is_empty());
    assert!(snapshot.merged.is_empty());
}

#[test]
fn test_missing_top_level_field_rejected() {
    for doc in [
        r#"{ "centroids": [], "pings": [] }"#,
        r#"{ "date": "2024-05-01", "pings": [] }"#,
        r#"{ "date": "2024-05-01", "centroids": [] }"#,
    ] {
        assert!(parse_snapshot_json_str(doc).is_err());
    }
}

#[test]
fn test_invalid_date_rejected() {
    let doc = minimal_doc("not-a-date", "");
    assert!(parse_snapshot_json_str(&doc).is_err());
}

#[test]
fn test_negative_soc_lost_rejected() {
    let doc = minimal_doc("2024-05-01", &ping_json("b1", 1, "10.0", -2.0));
    assert!(parse_snapshot_json_str(&doc).is_err());
}

#[test]
fn test_non_object_document_rejected() {
    assert!(parse_snapshot_json_str("[1, 2, 3]").is_err());
    assert!(parse_snapshot_json_str("\"just a string\"").is_err());
}

#[test]
fn test_checksum_distinguishes_content() {
    let a = minimal_doc("2024-05-01", &ping_json("b1", 1, "10.0", 5.0));
    let b = minimal_doc("2024-05-01", &ping_json("b1", 1, "10.0", 6.0));

    let snap_a = parse_snapshot_json_str(&a).unwrap();
    let snap_b = parse_snapshot_json_str(&b).unwrap();
    assert_ne!(snap_a.checksum, snap_b.checksum);
    assert_eq!(snap_a.checksum, calculate_checksum(&a));
}
