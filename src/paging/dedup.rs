//! Title-based deduplication of raw records.
//!
//! Feeds overlap: adjacent pages repeat articles and syndicated stories show
//! up under several outlets. There is no id that is stable across backends,
//! so the title is the natural key. Deduplication runs on raw records, before
//! mapping, because mapping collapses every missing title into the same
//! placeholder.

use std::collections::HashSet;

use crate::models::RawRecord;

/// Drop records whose title was already seen, keeping the first occurrence.
///
/// Order of the surviving records is preserved. Records without a title
/// share one key, so only the first of them is kept.
pub fn dedupe(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen: HashSet<Option<String>> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.title.clone()))
        .collect()
}
