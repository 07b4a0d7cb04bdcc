// src/scheduler.rs
//
// Fixed-interval drive of the pipeline. One cycle runs at a time: the
// ticker skips missed ticks and the guard refuses a second concurrent
// cycle outright, so overlap stays impossible even if cycles are ever
// triggered from more than one place.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use metrics::counter;
use tokio::time::MissedTickBehavior;

use crate::pipeline::Pipeline;
use crate::types::CycleResult;

/// Explicit idle/running state for cycle overlap prevention.
#[derive(Debug, Default)]
pub struct CycleGuard {
    running: AtomicBool,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the running slot. Returns false when a cycle is already
    /// in flight; the caller must then skip, not wait.
    pub fn try_begin(&self) -> bool {
        !self.running.swap(true, Ordering::SeqCst)
    }

    pub fn finish(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub type LastCycle = Arc<RwLock<Option<CycleResult>>>;

async fn run_guarded(pipeline: &Pipeline, guard: &CycleGuard, last_cycle: &LastCycle) {
    if !guard.try_begin() {
        tracing::warn!("previous cycle still running; skipping this tick");
        counter!("cycle_skipped_total").increment(1);
        return;
    }
    let result = pipeline.run_cycle().await;
    tracing::info!(
        delivered = result.delivered_total(),
        failed = result.failed_total(),
        duplicates = result.duplicates,
        source_failures = result.source_failures.len(),
        "cycle completed"
    );
    *last_cycle.write().expect("last cycle lock poisoned") = Some(result);
    guard.finish();
}

/// Run until ctrl-c: one immediate cycle (after the optional one-time
/// announcement), then one cycle per interval. Shutdown waits for the
/// in-flight cycle, so a delivery is never interrupted between send and
/// commit.
pub async fn run(
    pipeline: Arc<Pipeline>,
    interval: Duration,
    announcement: Option<String>,
    last_cycle: LastCycle,
) -> anyhow::Result<()> {
    let guard = CycleGuard::new();

    if let Some(text) = announcement {
        if let Err(e) = pipeline.dispatcher().announce(&text).await {
            tracing::warn!(error = %e, "startup announcement failed; continuing");
        }
    }

    run_guarded(&pipeline, &guard, &last_cycle).await;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // the first tick completes immediately and we already ran a cycle
    ticker.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_guarded(&pipeline, &guard, &last_cycle).await;
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received; stopping scheduler");
                break;
            }
        }
    }
    Ok(())
}
