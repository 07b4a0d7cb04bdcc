//! newswatch binary entrypoint.
//! Wires config, the seen store, the source registry, the Telegram
//! transport, and the observability server, then hands control to the
//! scheduler loop.

use std::sync::{Arc, RwLock};

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newswatch::api::{self, ApiState};
use newswatch::config::AppConfig;
use newswatch::dispatch::Dispatcher;
use newswatch::metrics::Metrics;
use newswatch::pipeline::Pipeline;
use newswatch::scheduler;
use newswatch::sources;
use newswatch::store::SeenStore;
use newswatch::telegram::TelegramClient;
use newswatch::{format, Source};

const USER_AGENT: &str = concat!("newswatch/", env!("CARGO_PKG_VERSION"));

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newswatch=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env()?;
    let metrics = Metrics::init()?;

    let http = reqwest::Client::builder()
        .timeout(cfg.http_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("building http client")?;

    let store = Arc::new(SeenStore::open(&cfg.store_path)?);
    let source_set: Vec<Arc<dyn Source>> = sources::build(&cfg, &http);
    anyhow::ensure!(
        !source_set.is_empty(),
        "no sources registered; check MONITOR_* flags and source URLs"
    );
    let source_names: Vec<&'static str> = source_set.iter().map(|s| s.name()).collect();
    tracing::info!(sources = ?source_names, "source registry built");

    let transport = Arc::new(TelegramClient::new(http.clone(), &cfg.bot_token));
    let dispatcher = Dispatcher::new(transport, cfg.channel_id.clone())
        .with_min_gap(cfg.min_send_gap)
        .with_max_attempts(cfg.max_send_attempts);
    let pipeline = Arc::new(Pipeline::new(source_set, store, dispatcher));

    let last_cycle = Arc::new(RwLock::new(None));
    let api_state = ApiState {
        last_cycle: last_cycle.clone(),
        metrics: metrics.handle.clone(),
    };
    let listener = tokio::net::TcpListener::bind(&cfg.api_bind)
        .await
        .with_context(|| format!("binding observability server to {}", cfg.api_bind))?;
    tracing::info!(bind = %cfg.api_bind, "observability server listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, api::router(api_state)).await {
            tracing::error!(error = %e, "observability server stopped");
        }
    });

    let announcement = cfg
        .announce_startup
        .then(|| format::render_startup(&source_names));

    scheduler::run(pipeline, cfg.check_interval, announcement, last_cycle).await
}
