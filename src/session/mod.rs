//! The in-memory analysis session.
//!
//! One `Session` owns every loaded snapshot, the active date selection,
//! the tolerance, the pivot/split configuration, and the current/locked
//! series. All derived structures (classifications, pivot tree, series)
//! are recomputed whole on each triggering action, never incrementally
//! patched. There is no ambient global state; the HTTP layer shares one
//! instance behind a lock.

use crate::api::{
    CentroidKind, CentroidMarker, CentroidProfile, Dimension, RawPing, Series, Snapshot,
    SplitField, TableRow,
};
use crate::error::{SessionError, SessionResult};
use crate::services::{classifier, distributions, export::ExportRow, map_view, pivot, series};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};

/// Outcome for one file of a load batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file: String,
    pub detail: String,
}

/// Per-file breakdown of one load batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub loaded: Vec<FileOutcome>,
    pub skipped: Vec<FileOutcome>,
    pub failed: Vec<FileOutcome>,
}

/// Rows captured by the last group click, plus the group's own key used as
/// the default series label.
#[derive(Debug, Clone)]
pub struct Selection {
    pub default_key: String,
    pub rows: Vec<TableRow>,
}

/// Fresh table payload for the table collaborator: rows with injected sort
/// keys, the grouping fields, and the grouping tree for selection lookups.
#[derive(Debug, Clone)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    pub dimensions: Vec<Dimension>,
    pub tree: pivot::PivotTree,
}

/// Serializable snapshot of the session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub loaded_dates: Vec<NaiveDate>,
    pub active_dates: Vec<NaiveDate>,
    pub tolerance: f64,
    pub pivot_dimensions: Vec<String>,
    pub split_field: String,
    pub locked_keys: Vec<String>,
    pub selection_rows: usize,
}

/// Process-wide analysis state. See the module docs for ownership rules.
#[derive(Debug, Default)]
pub struct Session {
    snapshots: BTreeMap<NaiveDate, Snapshot>,
    active_dates: BTreeSet<NaiveDate>,
    tolerance: f64,
    pivot_dimensions: Vec<Dimension>,
    split_field: SplitField,
    selection: Option<Selection>,
    current_series: Option<BTreeMap<String, Series>>,
    locked_series: Option<BTreeMap<String, Series>>,
}

impl Session {
    /// Create a session with the given initial tolerance fraction.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Default::default()
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn loaded_dates(&self) -> Vec<NaiveDate> {
        self.snapshots.keys().copied().collect()
    }

    pub fn active_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.active_dates
    }

    pub fn pivot_dimensions(&self) -> &[Dimension] {
        &self.pivot_dimensions
    }

    pub fn split_field(&self) -> SplitField {
        self.split_field
    }

    pub fn snapshot(&self, date: NaiveDate) -> Option<&Snapshot> {
        self.snapshots.get(&date)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn locked_keys(&self) -> Vec<String> {
        self.locked_series
            .as_ref()
            .map(|locked| locked.keys().cloned().collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Apply one parsed batch in a single step.
    ///
    /// Called once per batch, after every file has been parsed, so no
    /// partial-batch state is ever observable. A file whose checksum
    /// matches an already loaded snapshot is skipped; a changed file for
    /// an already loaded date replaces that date. Newly loaded dates are
    /// classified immediately (scoped trigger) and start inactive until
    /// the user toggles them in.
    pub fn apply_batch(&mut self, files: Vec<(String, Snapshot)>) -> BatchReport {
        let mut report = BatchReport::default();

        for (file, mut snapshot) in files {
            if self
                .snapshots
                .values()
                .any(|existing| existing.checksum == snapshot.checksum)
            {
                report.skipped.push(FileOutcome {
                    file,
                    detail: "identical content already loaded".to_string(),
                });
                continue;
            }

            classifier::reclassify_snapshot(&mut snapshot, self.tolerance);
            let date = snapshot.date;
            let replaced = self.snapshots.insert(date, snapshot).is_some();
            info!(%date, replaced, "snapshot loaded");
            report.loaded.push(FileOutcome {
                file,
                detail: if replaced {
                    format!("{} (replaced previous load)", date)
                } else {
                    date.to_string()
                },
            });
        }

        report
    }

    /// Change the global tolerance fraction and reclassify every loaded
    /// date. The clicked selection and its live series are invalidated;
    /// a locked baseline survives.
    pub fn set_tolerance(&mut self, fraction: f64) {
        self.tolerance = fraction;
        for snapshot in self.snapshots.values_mut() {
            classifier::reclassify_snapshot(snapshot, fraction);
        }
        self.clear_selection();
    }

    /// Drop the clicked selection and the live series derived from it.
    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.current_series = None;
    }

    /// Replace the active date set; dates never loaded are ignored.
    pub fn set_active_dates(&mut self, dates: impl IntoIterator<Item = NaiveDate>) {
        self.active_dates = dates
            .into_iter()
            .filter(|date| self.snapshots.contains_key(date))
            .collect();
    }

    /// Toggle one date in or out of the active set. Returns the new state,
    /// or `None` when the date was never loaded.
    pub fn toggle_date(&mut self, date: NaiveDate) -> Option<bool> {
        if !self.snapshots.contains_key(&date) {
            return None;
        }
        if self.active_dates.remove(&date) {
            Some(false)
        } else {
            self.active_dates.insert(date);
            Some(true)
        }
    }

    /// Activate every inactive loaded date and vice versa.
    pub fn invert_active_dates(&mut self) {
        self.active_dates = self
            .snapshots
            .keys()
            .copied()
            .filter(|date| !self.active_dates.contains(date))
            .collect();
    }

    /// Replace the ordered pivot dimension list. Duplicates keep their
    /// first position; the list is clamped to the supported depth.
    pub fn set_pivot_dimensions(&mut self, dimensions: Vec<Dimension>) {
        let mut deduped: Vec<Dimension> = Vec::new();
        for dim in dimensions {
            if !deduped.contains(&dim) {
                deduped.push(dim);
            }
        }
        deduped.truncate(pivot::MAX_PIVOT_DEPTH);
        self.pivot_dimensions = deduped;
    }

    /// Change the series split; takes effect on the next composition.
    pub fn set_split_field(&mut self, split: SplitField) {
        self.split_field = split;
    }

    /// Select the pivot group at `path`; its subtree rows become the series
    /// and export input. Returns the selected row count, or `None` when no
    /// group matches the path in the current table view.
    pub fn select_group(&mut self, path: &[String]) -> Option<usize> {
        let view = self.table_view();
        let node = view.tree.find(path)?;
        let rows: Vec<TableRow> = view
            .tree
            .rows(node)
            .into_iter()
            .map(|i| view.rows[i].clone())
            .collect();
        let count = rows.len();
        self.selection = Some(Selection {
            default_key: view.tree.node(node).key.clone(),
            rows,
        });
        Some(count)
    }

    /// Freeze the current composed series as the comparison baseline.
    /// Returns false when nothing has been composed yet.
    pub fn lock_current_series(&mut self) -> bool {
        match &self.current_series {
            Some(current) => {
                self.locked_series = Some(current.clone());
                true
            }
            None => false,
        }
    }

    /// Remove the locked baseline; composition returns to live values.
    pub fn clear_locked_series(&mut self) {
        self.locked_series = None;
    }

    // ------------------------------------------------------------------
    // Derived reads
    // ------------------------------------------------------------------

    fn build_rows(&self) -> Vec<TableRow> {
        let mut rows = Vec::new();
        for (_, snapshot) in self
            .snapshots
            .iter()
            .filter(|(date, _)| self.active_dates.contains(*date))
        {
            for ping in &snapshot.merged {
                let (centroid_name, centroid_type) =
                    match snapshot.classifications.get(&ping.centroid_id) {
                        Some(classification) => (
                            classification.dynamic_name.clone(),
                            classification.kind,
                        ),
                        None => {
                            warn!(
                                centroid_id = %ping.centroid_id,
                                date = %snapshot.date,
                                "ping references a centroid absent from its snapshot"
                            );
                            (ping.centroid_id.clone(), CentroidKind::NonStation)
                        }
                    };
                rows.push(TableRow {
                    bms: ping.bms_id.clone(),
                    country: ping.country.clone(),
                    centroid_id: ping.centroid_id.clone(),
                    centroid_name,
                    centroid_type,
                    last_mapped: ping.last_mapped.clone(),
                    date: ping.date,
                    soc_lost: ping.soc_lost,
                    group_sort_keys: Vec::new(),
                });
            }
        }
        rows
    }

    /// Rebuild the full table payload: rows for the active dates joined
    /// with their date's classifications, grouped by the current pivot
    /// dimensions, with aggregate sort keys injected.
    pub fn table_view(&self) -> TableView {
        let mut rows = self.build_rows();
        let dimensions = self.pivot_dimensions.clone();
        let tree = pivot::PivotTree::build(&mut rows, &dimensions);
        TableView {
            rows,
            dimensions,
            tree,
        }
    }

    /// Compose the series for the current selection, with any locked
    /// baseline overriding live values key by key. Stores the result as
    /// the current series (the lock candidate).
    pub fn compose_selected_series(&mut self) -> SessionResult<BTreeMap<String, Series>> {
        let selection = self
            .selection
            .as_ref()
            .ok_or(SessionError::EmptySelection)?;
        if selection.rows.is_empty() {
            return Err(SessionError::EmptySelection);
        }

        let mut composed = series::compose(
            &selection.rows,
            self.split_field,
            &self.active_dates,
            &selection.default_key,
        );
        if let Some(locked) = &self.locked_series {
            series::apply_locked(&mut composed, locked);
        }
        self.current_series = Some(composed.clone());
        Ok(composed)
    }

    /// One marker per unique centroid (by dynamic name) over the active
    /// dates, earliest occurrence wins, classification-derived color.
    pub fn map_markers(&self) -> Vec<CentroidMarker> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut markers = Vec::new();

        for (_, snapshot) in self
            .snapshots
            .iter()
            .filter(|(date, _)| self.active_dates.contains(*date))
        {
            let mut centroids: Vec<_> = snapshot.centroids.values().collect();
            centroids.sort_by(|a, b| a.id.cmp(&b.id));
            for centroid in centroids {
                if let Some(classification) = snapshot.classifications.get(&centroid.id) {
                    if seen.insert(classification.dynamic_name.clone()) {
                        markers.push(map_view::marker(centroid, classification));
                    }
                }
            }
        }
        markers
    }

    /// Detail profile for one centroid, identified by dynamic name, over
    /// the active dates: hour histogram, amperage split, and totals from
    /// the pre-merge pings.
    pub fn centroid_profile(&self, name: &str) -> Option<CentroidProfile> {
        let mut anchor: Option<(&crate::api::Centroid, CentroidKind)> = None;
        let mut matching: Vec<&RawPing> = Vec::new();

        for (_, snapshot) in self
            .snapshots
            .iter()
            .filter(|(date, _)| self.active_dates.contains(*date))
        {
            let ids: BTreeSet<String> = snapshot
                .classifications
                .iter()
                .filter(|(_, c)| c.dynamic_name == name)
                .map(|(id, _)| id.clone())
                .collect();
            if ids.is_empty() {
                continue;
            }
            if anchor.is_none() {
                if let Some(first) = ids.iter().next() {
                    if let Some(centroid) = snapshot.centroids.get(first) {
                        let kind = snapshot.classifications[first].kind;
                        anchor = Some((centroid, kind));
                    }
                }
            }
            matching.extend(
                snapshot
                    .raw_pings
                    .iter()
                    .filter(|ping| ids.contains(&ping.centroid_id)),
            );
        }

        let (centroid, kind) = anchor?;
        let total_soc_lost: f64 = matching.iter().map(|p| p.soc_lost).sum();
        Some(CentroidProfile {
            name: name.to_string(),
            kind,
            latitude: centroid.latitude,
            longitude: centroid.longitude,
            google_maps_link: map_view::google_maps_link(centroid.latitude, centroid.longitude),
            total_soc_lost,
            hourly: distributions::hourly_histogram(matching.iter().copied()),
            amperage: distributions::amperage_split(matching.iter().copied()),
        })
    }

    /// Export rows for the current selection: one per unique centroid (by
    /// dynamic name), with summed leakage and coordinates resolved through
    /// the owning snapshot.
    pub fn export_selection_rows(&self) -> SessionResult<Vec<ExportRow>> {
        let selection = self
            .selection
            .as_ref()
            .ok_or(SessionError::EmptySelection)?;
        if selection.rows.is_empty() {
            return Err(SessionError::EmptySelection);
        }

        let mut order: Vec<String> = Vec::new();
        let mut totals: HashMap<String, f64> = HashMap::new();
        let mut coords: HashMap<String, (qtty::Degrees, qtty::Degrees)> = HashMap::new();

        for row in &selection.rows {
            let entry = totals.entry(row.centroid_name.clone()).or_insert_with(|| {
                order.push(row.centroid_name.clone());
                0.0
            });
            *entry += row.soc_lost;

            if !coords.contains_key(&row.centroid_name) {
                if let Some(centroid) = self
                    .snapshots
                    .get(&row.date)
                    .and_then(|snapshot| snapshot.centroids.get(&row.centroid_id))
                {
                    coords.insert(
                        row.centroid_name.clone(),
                        (centroid.latitude, centroid.longitude),
                    );
                }
            }
        }

        Ok(order
            .into_iter()
            .map(|name| {
                let total = totals[&name];
                let (latitude, longitude) = coords
                    .get(&name)
                    .copied()
                    .unwrap_or((qtty::Degrees::new(0.0), qtty::Degrees::new(0.0)));
                ExportRow::new(name, total, latitude, longitude)
            })
            .collect())
    }

    /// Configuration summary for the frontend.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            loaded_dates: self.loaded_dates(),
            active_dates: self.active_dates.iter().copied().collect(),
            tolerance: self.tolerance,
            pivot_dimensions: self
                .pivot_dimensions
                .iter()
                .map(|d| d.field_name().to_string())
                .collect(),
            split_field: self.split_field.as_str().to_string(),
            locked_keys: self.locked_keys(),
            selection_rows: self
                .selection
                .as_ref()
                .map(|s| s.rows.len())
                .unwrap_or(0),
        }
    }
}
