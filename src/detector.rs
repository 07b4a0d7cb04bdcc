// src/detector.rs
//
// Change detection for one source: fetch, derive keys, and partition into
// new vs already-announced. Items keep the adapter's order; the detector
// never re-sorts (ordering policy is the adapter's, documented there).

use std::collections::HashSet;

use metrics::counter;

use crate::identity;
use crate::sources::Source;
use crate::store::SeenStore;
use crate::types::{Category, DedupKey, RawItem};

#[derive(Debug, Clone)]
pub struct Detection {
    pub item: RawItem,
    pub key: DedupKey,
}

/// What one source contributed to the cycle.
#[derive(Debug)]
pub struct DetectReport {
    pub source: &'static str,
    pub category: Category,
    pub fetched: usize,
    pub duplicates: usize,
    pub detections: Vec<Detection>,
    /// Set when the source reported itself unavailable this cycle.
    pub failure: Option<String>,
}

impl DetectReport {
    pub fn failed(source: &'static str, category: Category, reason: String) -> Self {
        Self {
            source,
            category,
            fetched: 0,
            duplicates: 0,
            detections: Vec::new(),
            failure: Some(reason),
        }
    }
}

/// Run one source against the store. `SourceUnavailable` yields an empty
/// report with the failure recorded; it never propagates.
pub async fn detect(source: &dyn Source, store: &SeenStore) -> DetectReport {
    let items = match source.fetch().await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(
                source = source.name(),
                error = %e,
                "source unavailable; assuming zero items this cycle"
            );
            counter!("source_fetch_errors_total").increment(1);
            return DetectReport::failed(source.name(), source.category(), e.to_string());
        }
    };

    let fetched = items.len();
    let mut duplicates = 0usize;
    let mut in_batch: HashSet<DedupKey> = HashSet::new();
    let mut detections = Vec::new();

    for item in items {
        let key = identity::derive(&item);
        if store.has(&key) || !in_batch.insert(key.clone()) {
            duplicates += 1;
            counter!("seen_duplicates_total").increment(1);
            continue;
        }
        detections.push(Detection { item, key });
    }

    DetectReport {
        source: source.name(),
        category: source.category(),
        fetched,
        duplicates,
        detections,
        failure: None,
    }
}
