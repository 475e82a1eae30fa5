//! Per-centroid distribution summaries.
//!
//! The detail panel charts read pre-merge pings: the hour and amperage
//! dimensions are consumed by the record merger, so these profiles keep
//! their resolution by going back to the raw observations.

use crate::api::{AmperageSplit, RawPing, AMPERAGE_LOW_BUCKET};

/// SOC loss per local hour, exactly 24 buckets.
pub fn hourly_histogram<'a, I>(pings: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a RawPing>,
{
    let mut buckets = vec![0.0; 24];
    for ping in pings {
        buckets[ping.hour as usize] += ping.soc_lost;
    }
    buckets
}

/// SOC loss split into the low/high amperage buckets.
pub fn amperage_split<'a, I>(pings: I) -> AmperageSplit
where
    I: IntoIterator<Item = &'a RawPing>,
{
    let mut split = AmperageSplit {
        low: 0.0,
        high: 0.0,
    };
    for ping in pings {
        if ping.amperage.bucket() == AMPERAGE_LOW_BUCKET {
            split.low += ping.soc_lost;
        } else {
            split.high += ping.soc_lost;
        }
    }
    split
}
