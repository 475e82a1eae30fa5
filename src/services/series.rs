//! Series composer.
//!
//! Turns a selected row subset into named, date-aligned trend series for
//! the chart collaborator. Every series is zero-filled across the active
//! dates so the chart never interpolates over missing data, and a locked
//! snapshot of a previous selection can override live recomputation key
//! by key.

use crate::api::{Series, SeriesPoint, SplitField, TableRow};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Compose one series per split key from the selected rows.
///
/// With `SplitField::None` all rows collapse onto `default_key` (the
/// clicked group's label). Each series gets one zero-valued point per
/// active date before accumulation, then rows add their `soc_lost` onto
/// their own date; a row whose date is outside the active set still
/// contributes its own point. Points come out ascending by date.
pub fn compose(
    rows: &[TableRow],
    split: SplitField,
    active_dates: &BTreeSet<NaiveDate>,
    default_key: &str,
) -> BTreeMap<String, Series> {
    let mut accumulated: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();

    for row in rows {
        let key = match split {
            SplitField::None => default_key.to_string(),
            SplitField::By(dim) => row.dimension_value(dim),
        };
        let points = accumulated.entry(key).or_insert_with(|| {
            active_dates.iter().map(|&date| (date, 0.0)).collect()
        });
        *points.entry(row.date).or_insert(0.0) += row.soc_lost;
    }

    accumulated
        .into_iter()
        .map(|(key, points)| {
            (
                key,
                points
                    .into_iter()
                    .map(|(x, y)| SeriesPoint { x, y })
                    .collect(),
            )
        })
        .collect()
}

/// Overlay a locked series snapshot onto freshly computed series.
///
/// Locked entries take precedence by exact key match; live entries fill in
/// keys not present in the lock. A locked key with no live counterpart is
/// still included, keeping the frozen baseline visible while exploring
/// other groups.
pub fn apply_locked(
    computed: &mut BTreeMap<String, Series>,
    locked: &BTreeMap<String, Series>,
) {
    for (key, series) in locked {
        computed.insert(key.clone(), series.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CentroidKind, Dimension};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn create_test_row(country: &str, day: u32, soc_lost: f64) -> TableRow {
        TableRow {
            bms: "b1".to_string(),
            country: country.to_string(),
            centroid_id: "c1".to_string(),
            centroid_name: "Centroid 1".to_string(),
            centroid_type: CentroidKind::Station,
            last_mapped: "m1".to_string(),
            date: date(day),
            soc_lost,
            group_sort_keys: Vec::new(),
        }
    }

    #[test]
    fn test_default_key_collapses_all_rows() {
        let rows = vec![
            create_test_row("NG", 1, 5.0),
            create_test_row("KE", 1, 3.0),
        ];
        let active: BTreeSet<NaiveDate> = [date(1), date(2)].into_iter().collect();

        let series = compose(&rows, SplitField::None, &active, "NG station");
        assert_eq!(series.len(), 1);
        let points = &series["NG station"];
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], SeriesPoint { x: date(1), y: 8.0 });
        assert_eq!(points[1], SeriesPoint { x: date(2), y: 0.0 });
    }

    #[test]
    fn test_split_produces_one_series_per_value() {
        let rows = vec![
            create_test_row("NG", 1, 5.0),
            create_test_row("NG", 2, 2.0),
            create_test_row("KE", 1, 3.0),
        ];
        let active: BTreeSet<NaiveDate> = [date(1), date(2)].into_iter().collect();

        let series = compose(&rows, SplitField::By(Dimension::Country), &active, "unused");
        assert_eq!(series.len(), 2);
        assert_eq!(series["NG"][0].y, 5.0);
        assert_eq!(series["NG"][1].y, 2.0);
        assert_eq!(series["KE"][0].y, 3.0);
        assert_eq!(series["KE"][1].y, 0.0);
    }

    #[test]
    fn test_zero_fill_spans_every_active_date() {
        let rows = vec![create_test_row("NG", 2, 4.0)];
        let active: BTreeSet<NaiveDate> = [date(1), date(2), date(3)].into_iter().collect();

        let series = compose(&rows, SplitField::None, &active, "g");
        let points = &series["g"];
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].y, 0.0);
        assert_eq!(points[1].y, 4.0);
        assert_eq!(points[2].y, 0.0);
    }

    #[test]
    fn test_points_ascend_by_date() {
        let rows = vec![
            create_test_row("NG", 3, 1.0),
            create_test_row("NG", 1, 2.0),
            create_test_row("NG", 2, 3.0),
        ];
        let active: BTreeSet<NaiveDate> = [date(1), date(2), date(3)].into_iter().collect();

        let series = compose(&rows, SplitField::None, &active, "g");
        let xs: Vec<NaiveDate> = series["g"].iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![date(1), date(2), date(3)]);
    }

    #[test]
    fn test_row_outside_active_dates_still_contributes() {
        let rows = vec![create_test_row("NG", 9, 4.0)];
        let active: BTreeSet<NaiveDate> = [date(1)].into_iter().collect();

        let series = compose(&rows, SplitField::None, &active, "g");
        let points = &series["g"];
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], SeriesPoint { x: date(9), y: 4.0 });
    }

    #[test]
    fn test_empty_rows_empty_mapping() {
        let active: BTreeSet<NaiveDate> = [date(1)].into_iter().collect();
        let series = compose(&[], SplitField::None, &active, "g");
        assert!(series.is_empty());
    }

    #[test]
    fn test_apply_locked_overrides_by_key() {
        let active: BTreeSet<NaiveDate> = [date(1)].into_iter().collect();
        let mut live = compose(
            &[create_test_row("NG", 1, 5.0), create_test_row("KE", 1, 3.0)],
            SplitField::By(Dimension::Country),
            &active,
            "g",
        );

        let locked: BTreeMap<String, Series> = [(
            "NG".to_string(),
            vec![SeriesPoint { x: date(1), y: 99.0 }],
        )]
        .into_iter()
        .collect();

        apply_locked(&mut live, &locked);
        assert_eq!(live["NG"][0].y, 99.0);
        // Live entry for a non-locked key is untouched.
        assert_eq!(live["KE"][0].y, 3.0);
    }

    #[test]
    fn test_apply_locked_keeps_baseline_without_live_match() {
        let mut live: BTreeMap<String, Series> = BTreeMap::new();
        let locked: BTreeMap<String, Series> = [(
            "old group".to_string(),
            vec![SeriesPoint { x: date(1), y: 7.0 }],
        )]
        .into_iter()
        .collect();

        apply_locked(&mut live, &locked);
        assert_eq!(live.len(), 1);
        assert_eq!(live["old group"][0].y, 7.0);
    }
}
