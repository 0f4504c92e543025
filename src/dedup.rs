use std::collections::HashSet;

use crate::record::Record;

/// Collapse records sharing a phone number, keeping the first in crawl order.
///
/// The phone is the most reliable handle the listings expose, so it doubles as
/// identity. Two distinct businesses publishing the same number are merged, and
/// the `N/A` phone is a key like any other: at most one phone-less record survives.
pub fn dedupe(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.phone_number.clone()))
        .collect()
}
