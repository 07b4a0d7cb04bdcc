// src/api.rs
//
// Observability surface only: liveness, the last cycle's counters, and the
// Prometheus exposition. Nothing here mutates pipeline state.

use axum::{extract::State, routing::get, Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::scheduler::LastCycle;

#[derive(Clone)]
pub struct ApiState {
    pub last_cycle: LastCycle,
    pub metrics: PrometheusHandle,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(status))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn status(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let last = state
        .last_cycle
        .read()
        .expect("last cycle lock poisoned")
        .clone();
    Json(serde_json::json!({ "last_cycle": last }))
}

async fn metrics(State(state): State<ApiState>) -> String {
    state.metrics.render()
}
