// src/pipeline.rs
//
// One full poll-detect-format-deliver-commit pass across the registered
// sources. Sources are polled concurrently (spawned tasks, results taken
// back in registration order); delivery is serialized through the
// dispatcher so the channel sees messages in order.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::{counter, gauge};

use crate::detector::{self, DetectReport};
use crate::dispatch::{Dispatcher, Outcome};
use crate::format;
use crate::sources::Source;
use crate::store::SeenStore;
use crate::types::{Category, CycleResult, Notification, RawItem};

/// Below this many records across the guarded categories the store is
/// considered freshly initialized and the backfill guard kicks in.
const FIRST_RUN_THRESHOLD: usize = 5;

/// Categories whose history would flood the channel on a first deployment.
const BACKFILL_GUARDED: [Category; 3] =
    [Category::Blog, Category::Release, Category::MergedPr];

fn backfill_max_age(category: Category) -> Option<ChronoDuration> {
    match category {
        Category::Blog | Category::Release => Some(ChronoDuration::days(30)),
        Category::MergedPr => Some(ChronoDuration::days(7)),
        _ => None,
    }
}

/// Retention horizons for pruning seen records. Each horizon comfortably
/// exceeds the adapter's pagination lookback, so a pruned record can no
/// longer reappear in a live fetch window. The document category keeps one
/// live hash per document and is never pruned.
pub fn default_retention() -> Vec<(Category, ChronoDuration)> {
    vec![
        (Category::Blog, ChronoDuration::days(180)),
        (Category::Release, ChronoDuration::days(365)),
        (Category::MergedPr, ChronoDuration::days(90)),
        (Category::Changelog, ChronoDuration::days(180)),
        (Category::Status, ChronoDuration::days(180)),
        (Category::Social, ChronoDuration::days(60)),
    ]
}

pub struct Pipeline {
    sources: Vec<Arc<dyn Source>>,
    store: Arc<SeenStore>,
    dispatcher: Dispatcher,
    retention: Vec<(Category, ChronoDuration)>,
}

impl Pipeline {
    pub fn new(
        sources: Vec<Arc<dyn Source>>,
        store: Arc<SeenStore>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            sources,
            store,
            dispatcher,
            retention: default_retention(),
        }
    }

    pub fn with_retention(mut self, retention: Vec<(Category, ChronoDuration)>) -> Self {
        self.retention = retention;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    fn is_first_run(&self) -> bool {
        let tracked: usize = BACKFILL_GUARDED
            .iter()
            .map(|c| self.store.count(*c))
            .sum();
        tracked < FIRST_RUN_THRESHOLD
    }

    fn suppress_as_backfill(&self, item: &RawItem, now: DateTime<Utc>) -> bool {
        let Some(max_age) = backfill_max_age(item.category) else {
            return false;
        };
        item.published_at
            .is_some_and(|ts| now.signed_duration_since(ts) > max_age)
    }

    pub async fn run_cycle(&self) -> CycleResult {
        counter!("cycle_runs_total").increment(1);
        let mut result = CycleResult::default();
        let first_run = self.is_first_run();
        let now = Utc::now();

        // poll all sources concurrently; a hung source costs its own
        // timeout, not the other sources' progress
        let mut handles = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let source = Arc::clone(source);
            let store = Arc::clone(&self.store);
            handles.push(tokio::spawn(async move {
                detector::detect(source.as_ref(), &store).await
            }));
        }

        for (source, handle) in self.sources.iter().zip(handles) {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(source = source.name(), error = %e, "detect task panicked");
                    DetectReport::failed(source.name(), source.category(), e.to_string())
                }
            };
            self.deliver_report(source.as_ref(), report, first_run, now, &mut result)
                .await;
        }

        self.prune(now);
        gauge!("cycle_last_run_ts").set(now.timestamp() as f64);
        result
    }

    async fn deliver_report(
        &self,
        source: &dyn Source,
        report: DetectReport,
        first_run: bool,
        now: DateTime<Utc>,
        result: &mut CycleResult,
    ) {
        let counts = result.counts_mut(report.category);
        counts.fetched += report.fetched;
        result.duplicates += report.duplicates;
        if let Some(reason) = report.failure {
            result
                .source_failures
                .push(format!("{}: {reason}", report.source));
            return;
        }

        let mut detections = report.detections;
        if source.newest_first() {
            // post oldest first so the channel reads chronologically
            detections.reverse();
        }

        for detection in detections {
            let category = detection.item.category;
            result.counts_mut(category).new += 1;
            counter!("items_new_total").increment(1);

            if first_run && self.suppress_as_backfill(&detection.item, now) {
                // commit without delivering: same terminal state as a
                // delivered item, so it is never re-offered
                if let Err(e) = self.store.commit(&detection.key, now) {
                    tracing::error!(key = %detection.key, error = %e, "backfill commit failed");
                }
                result.suppressed_backfill += 1;
                counter!("backfill_suppressed_total").increment(1);
                continue;
            }

            let notification = Notification {
                category,
                text: format::render(&detection.item),
                key: detection.key.clone(),
            };
            match self.dispatcher.deliver_one(&notification).await {
                Outcome::Delivered { .. } => {
                    // committed only now, after the send was confirmed; a
                    // crash in between re-offers the item next cycle
                    if let Err(e) = self.store.commit(&detection.key, now) {
                        tracing::error!(
                            key = %detection.key,
                            error = %e,
                            "seen commit failed; item may be re-announced"
                        );
                    }
                    result.counts_mut(category).delivered += 1;
                    counter!("items_delivered_total").increment(1);
                }
                Outcome::Failed { error } => {
                    tracing::warn!(
                        key = %detection.key,
                        error = %error,
                        "delivery failed; item stays uncommitted for the next cycle"
                    );
                    result.counts_mut(category).failed += 1;
                }
            }
        }
    }

    fn prune(&self, now: DateTime<Utc>) {
        for (category, horizon) in &self.retention {
            match self.store.prune(*category, now - *horizon) {
                Ok(removed) if removed > 0 => {
                    tracing::debug!(category = %category, removed, "pruned seen records");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(category = %category, error = %e, "prune failed");
                }
            }
        }
    }
}
