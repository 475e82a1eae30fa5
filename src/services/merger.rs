//! Record merger.
//!
//! Within one snapshot, pings sharing every field except `hour`,
//! `amperage` and `soc_lost` are sub-measurements of the same underlying
//! swap event and are collapsed into one record with `soc_lost` summed.
//! The hour/amperage dimensions are consumed by the `RawPing → MergedPing`
//! conversion, so merging an already-merged set is the identity (each
//! group has exactly one member).

use crate::api::MergedPing;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Group identity: every field except the summed metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MergeKey {
    bms_id: String,
    country: String,
    centroid_id: String,
    last_mapped: String,
    last_swap_time: String,
    last_swap_state: String,
    date: NaiveDate,
}

impl From<&MergedPing> for MergeKey {
    fn from(ping: &MergedPing) -> Self {
        Self {
            bms_id: ping.bms_id.clone(),
            country: ping.country.clone(),
            centroid_id: ping.centroid_id.clone(),
            last_mapped: ping.last_mapped.clone(),
            last_swap_time: ping.last_swap_time.clone(),
            last_swap_state: ping.last_swap_state.clone(),
            date: ping.date,
        }
    }
}

/// Merge ping records by group identity, summing `soc_lost`.
///
/// Accepts anything convertible to merged records (raw pings convert via
/// `MergedPing::from`, dropping the consumed hour/amperage dimensions).
/// Output order is unspecified; the table re-sorts downstream. A record
/// with `soc_lost = 0` still participates in grouping and is kept, so a
/// visited-but-lossless event stays distinguishable from no visit.
pub fn merge<I>(pings: I) -> Vec<MergedPing>
where
    I: IntoIterator<Item = MergedPing>,
{
    let mut groups: HashMap<MergeKey, MergedPing> = HashMap::new();

    for ping in pings {
        let key = MergeKey::from(&ping);
        match groups.get_mut(&key) {
            Some(existing) => existing.soc_lost += ping.soc_lost,
            None => {
                groups.insert(key, ping);
            }
        }
    }

    groups.into_values().collect()
}
