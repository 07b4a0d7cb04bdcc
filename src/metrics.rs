// src/metrics.rs
use anyhow::Context;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and register series so they
    /// show up on /metrics before their first increment.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe();
        Ok(Self { handle })
    }
}

pub fn describe() {
    describe_counter!("cycle_runs_total", "Full poll-detect-deliver cycles run.");
    describe_counter!(
        "cycle_skipped_total",
        "Ticks skipped because a cycle was still running."
    );
    describe_counter!("items_fetched_total", "Items parsed out of source responses.");
    describe_counter!("items_new_total", "Items not previously announced.");
    describe_counter!(
        "items_delivered_total",
        "Notifications delivered to the channel."
    );
    describe_counter!(
        "delivery_failures_total",
        "Notifications that failed delivery."
    );
    describe_counter!(
        "seen_duplicates_total",
        "Items skipped as already announced."
    );
    describe_counter!("source_fetch_errors_total", "Source fetch/parse failures.");
    describe_counter!(
        "store_corruptions_total",
        "Seen store load corruptions recovered from."
    );
    describe_counter!(
        "backfill_suppressed_total",
        "Old items swallowed on first run."
    );
    describe_gauge!("cycle_last_run_ts", "Unix timestamp of the last completed cycle.");
}
