// tests/detector_isolation.rs
//
// Change detection against mock sources: idempotence, adapter-order
// preservation, and isolation of one source's failure from its siblings.

use async_trait::async_trait;
use chrono::Utc;
use newswatch::detector;
use newswatch::error::SourceError;
use newswatch::sources::Source;
use newswatch::store::SeenStore;
use newswatch::types::{Category, Payload, RawItem};

struct FixedSource {
    category: Category,
    items: Vec<RawItem>,
}

#[async_trait]
impl Source for FixedSource {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        Ok(self.items.clone())
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
    fn category(&self) -> Category {
        self.category
    }
}

struct BrokenSource;

#[async_trait]
impl Source for BrokenSource {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        Err(SourceError::unavailable("connection refused"))
    }
    fn name(&self) -> &'static str {
        "broken"
    }
    fn category(&self) -> Category {
        Category::Status
    }
}

fn item(id: &str, title: &str) -> RawItem {
    RawItem {
        category: Category::Blog,
        natural_id: Some(id.to_string()),
        title: title.to_string(),
        summary: None,
        url: format!("https://b.test/{id}"),
        published_at: None,
        payload: Payload::None,
    }
}

fn temp_store(dir: &tempfile::TempDir) -> SeenStore {
    SeenStore::open(dir.path().join("seen.json")).unwrap()
}

#[tokio::test]
async fn unseen_items_come_back_in_adapter_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let source = FixedSource {
        category: Category::Blog,
        items: vec![item("a", "A"), item("b", "B"), item("c", "C")],
    };

    let report = detector::detect(&source, &store).await;
    assert_eq!(report.fetched, 3);
    assert!(report.failure.is_none());
    let ids: Vec<&str> = report
        .detections
        .iter()
        .map(|d| d.key.identity.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"], "detector must not re-sort");
}

#[tokio::test]
async fn committed_items_are_not_redetected() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let source = FixedSource {
        category: Category::Blog,
        items: vec![item("a", "A"), item("b", "B")],
    };

    let first = detector::detect(&source, &store).await;
    for d in &first.detections {
        store.commit(&d.key, Utc::now()).unwrap();
    }

    // same source response next cycle: nothing new
    let second = detector::detect(&source, &store).await;
    assert_eq!(second.fetched, 2);
    assert_eq!(second.duplicates, 2);
    assert!(second.detections.is_empty());
}

#[tokio::test]
async fn uncommitted_items_are_reoffered() {
    // delivery failed last cycle, so nothing was committed; the detector
    // must offer the same items again
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let source = FixedSource {
        category: Category::Blog,
        items: vec![item("a", "A")],
    };

    let first = detector::detect(&source, &store).await;
    assert_eq!(first.detections.len(), 1);
    let second = detector::detect(&source, &store).await;
    assert_eq!(second.detections.len(), 1);
    assert_eq!(second.detections[0].key, first.detections[0].key);
}

#[tokio::test]
async fn repeated_keys_within_one_fetch_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);
    let source = FixedSource {
        category: Category::Blog,
        items: vec![item("a", "A"), item("a", "A again")],
    };

    let report = detector::detect(&source, &store).await;
    assert_eq!(report.detections.len(), 1);
    assert_eq!(report.duplicates, 1);
}

#[tokio::test]
async fn a_broken_source_reports_failure_without_items() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir);

    let broken = detector::detect(&BrokenSource, &store).await;
    assert!(broken.failure.is_some());
    assert!(broken.detections.is_empty());
    assert_eq!(broken.fetched, 0);

    // siblings are unaffected: the good source still detects everything
    let good = FixedSource {
        category: Category::Blog,
        items: vec![item("a", "A")],
    };
    let report = detector::detect(&good, &store).await;
    assert_eq!(report.detections.len(), 1);
}
