// tests/pipeline_cycle.rs
//
// Full poll-detect-format-deliver-commit cycles over mock sources and a
// mock transport, backed by a real on-disk seen store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use newswatch::dispatch::Dispatcher;
use newswatch::error::{SendError, SourceError};
use newswatch::pipeline::Pipeline;
use newswatch::sources::Source;
use newswatch::store::SeenStore;
use newswatch::telegram::{MessageId, Transport};
use newswatch::types::{Category, Payload, RawItem};

struct FixedSource {
    name: &'static str,
    category: Category,
    newest_first: bool,
    items: Vec<RawItem>,
}

#[async_trait]
impl Source for FixedSource {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        Ok(self.items.clone())
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn category(&self) -> Category {
        self.category
    }
    fn newest_first(&self) -> bool {
        self.newest_first
    }
}

struct BrokenSource;

#[async_trait]
impl Source for BrokenSource {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        Err(SourceError::unavailable("dns failure"))
    }
    fn name(&self) -> &'static str {
        "broken"
    }
    fn category(&self) -> Category {
        Category::Status
    }
}

struct ToggleTransport {
    failing: AtomicBool,
    sent: Mutex<Vec<String>>,
}

impl ToggleTransport {
    fn new(failing: bool) -> Arc<Self> {
        Arc::new(Self {
            failing: AtomicBool::new(failing),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ToggleTransport {
    async fn send(&self, _chat_id: &str, text: &str) -> Result<MessageId, SendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SendError::Network("unreachable".into()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(text.to_string());
        Ok(sent.len() as MessageId)
    }
}

fn item(category: Category, id: &str, title: &str) -> RawItem {
    RawItem {
        category,
        natural_id: Some(id.to_string()),
        title: title.to_string(),
        summary: None,
        url: format!("https://x.test/{id}"),
        published_at: None,
        payload: Payload::None,
    }
}

fn fast_dispatcher(transport: Arc<ToggleTransport>) -> Dispatcher {
    Dispatcher::new(transport, "@channel")
        .with_min_gap(Duration::ZERO)
        .with_max_attempts(1)
}

#[tokio::test]
async fn second_cycle_over_unchanged_sources_delivers_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SeenStore::open(dir.path().join("seen.json")).unwrap());
    let transport = ToggleTransport::new(false);
    let source: Arc<dyn Source> = Arc::new(FixedSource {
        name: "blog",
        category: Category::Blog,
        newest_first: false,
        items: vec![item(Category::Blog, "a", "A"), item(Category::Blog, "b", "B")],
    });
    let pipeline = Pipeline::new(
        vec![source],
        store,
        fast_dispatcher(transport.clone()),
    );

    let first = pipeline.run_cycle().await;
    assert_eq!(first.delivered_total(), 2);

    let second = pipeline.run_cycle().await;
    assert_eq!(second.delivered_total(), 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(transport.sent().len(), 2, "no repeat announcements");
}

#[tokio::test]
async fn failed_delivery_is_reoffered_until_it_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SeenStore::open(dir.path().join("seen.json")).unwrap());
    let transport = ToggleTransport::new(true);
    let source: Arc<dyn Source> = Arc::new(FixedSource {
        name: "blog",
        category: Category::Blog,
        newest_first: false,
        items: vec![item(Category::Blog, "a", "A")],
    });
    let pipeline = Pipeline::new(
        vec![source],
        store,
        fast_dispatcher(transport.clone()),
    );

    let first = pipeline.run_cycle().await;
    assert_eq!(first.delivered_total(), 0);
    assert_eq!(first.failed_total(), 1);
    assert!(transport.sent().is_empty());

    // transport recovers; the item was never committed, so it comes back
    transport.set_failing(false);
    let second = pipeline.run_cycle().await;
    assert_eq!(second.delivered_total(), 1);
    assert_eq!(transport.sent().len(), 1);

    // and a third cycle stays quiet
    let third = pipeline.run_cycle().await;
    assert_eq!(third.delivered_total(), 0);
}

#[tokio::test]
async fn one_broken_source_does_not_block_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SeenStore::open(dir.path().join("seen.json")).unwrap());
    let transport = ToggleTransport::new(false);
    let sources: Vec<Arc<dyn Source>> = vec![
        Arc::new(BrokenSource),
        Arc::new(FixedSource {
            name: "blog",
            category: Category::Blog,
            newest_first: false,
            items: vec![item(Category::Blog, "a", "A")],
        }),
    ];
    let pipeline = Pipeline::new(sources, store, fast_dispatcher(transport.clone()));

    let result = pipeline.run_cycle().await;
    assert_eq!(result.source_failures.len(), 1);
    assert!(result.source_failures[0].starts_with("broken:"));
    assert_eq!(result.delivered_total(), 1, "healthy source still delivers");
}

#[tokio::test]
async fn adapter_order_reaches_the_channel() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SeenStore::open(dir.path().join("seen.json")).unwrap());
    let transport = ToggleTransport::new(false);
    let source: Arc<dyn Source> = Arc::new(FixedSource {
        name: "releases",
        category: Category::Release,
        newest_first: false,
        items: vec![
            item(Category::Release, "r:1", "Alpha"),
            item(Category::Release, "r:2", "Beta"),
            item(Category::Release, "r:3", "Gamma"),
        ],
    });
    let pipeline = Pipeline::new(vec![source], store, fast_dispatcher(transport.clone()));

    pipeline.run_cycle().await;
    let sent = transport.sent();
    let positions: Vec<usize> = ["Alpha", "Beta", "Gamma"]
        .iter()
        .map(|t| sent.iter().position(|m| m.contains(*t)).unwrap())
        .collect();
    assert!(positions[0] < positions[1] && positions[1] < positions[2]);
}

#[tokio::test]
async fn newest_first_sources_post_chronologically() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SeenStore::open(dir.path().join("seen.json")).unwrap());
    let transport = ToggleTransport::new(false);
    let source: Arc<dyn Source> = Arc::new(FixedSource {
        name: "blog",
        category: Category::Blog,
        newest_first: true,
        items: vec![
            item(Category::Blog, "newest", "Newest"),
            item(Category::Blog, "oldest", "Oldest"),
        ],
    });
    let pipeline = Pipeline::new(vec![source], store, fast_dispatcher(transport.clone()));

    pipeline.run_cycle().await;
    let sent = transport.sent();
    assert!(sent[0].contains("Oldest"), "oldest posts first");
    assert!(sent[1].contains("Newest"));
}

#[tokio::test]
async fn first_run_swallows_history_but_remembers_it() {
    use chrono::{Duration as ChronoDuration, Utc};

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SeenStore::open(dir.path().join("seen.json")).unwrap());
    let transport = ToggleTransport::new(false);

    let mut stale = item(Category::Blog, "ancient", "Ancient");
    stale.published_at = Some(Utc::now() - ChronoDuration::days(90));
    let mut fresh = item(Category::Blog, "fresh", "Fresh");
    fresh.published_at = Some(Utc::now() - ChronoDuration::days(1));

    let source: Arc<dyn Source> = Arc::new(FixedSource {
        name: "blog",
        category: Category::Blog,
        newest_first: false,
        items: vec![stale, fresh],
    });
    let pipeline = Pipeline::new(vec![source], store, fast_dispatcher(transport.clone()));

    // empty store means first run: the 90-day-old post is committed
    // silently, the recent one is announced
    let result = pipeline.run_cycle().await;
    assert_eq!(result.suppressed_backfill, 1);
    assert_eq!(result.delivered_total(), 1);
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Fresh"));

    // suppressed history never resurfaces
    let second = pipeline.run_cycle().await;
    assert_eq!(second.delivered_total(), 0);
    assert_eq!(second.duplicates, 2);
}

#[tokio::test]
async fn horizon_shorter_than_the_lookback_reannounces() {
    use chrono::Duration as ChronoDuration;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SeenStore::open(dir.path().join("seen.json")).unwrap());
    let transport = ToggleTransport::new(false);
    let source: Arc<dyn Source> = Arc::new(FixedSource {
        name: "blog",
        category: Category::Blog,
        newest_first: false,
        items: vec![item(Category::Blog, "a", "A")],
    });
    // a zero retention horizon is strictly shorter than any live fetch
    // window, so the record expires while the source still serves the item
    let pipeline = Pipeline::new(vec![source], store, fast_dispatcher(transport.clone()))
        .with_retention(vec![(Category::Blog, ChronoDuration::zero())]);

    let first = pipeline.run_cycle().await;
    assert_eq!(first.delivered_total(), 1);

    // still remembered within the same instant's horizon
    let second = pipeline.run_cycle().await;
    assert_eq!(second.duplicates, 1);
    assert_eq!(second.delivered_total(), 0);

    // the prune at the end of the second cycle dropped the record, so the
    // item comes back as new: the accepted failure mode of a horizon that
    // does not cover the source's lookback
    let third = pipeline.run_cycle().await;
    assert_eq!(third.delivered_total(), 1);
    assert_eq!(transport.sent().len(), 2);
}

#[tokio::test]
async fn cycle_result_counts_add_up() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SeenStore::open(dir.path().join("seen.json")).unwrap());
    let transport = ToggleTransport::new(false);
    let source: Arc<dyn Source> = Arc::new(FixedSource {
        name: "blog",
        category: Category::Blog,
        newest_first: false,
        items: vec![item(Category::Blog, "a", "A"), item(Category::Blog, "b", "B")],
    });
    let pipeline = Pipeline::new(vec![source], store, fast_dispatcher(transport));

    let result = pipeline.run_cycle().await;
    let counts = result.counts.get("blog").unwrap();
    assert_eq!(counts.fetched, 2);
    assert_eq!(counts.new, 2);
    assert_eq!(counts.delivered, 2);
    assert_eq!(counts.failed, 0);
}
