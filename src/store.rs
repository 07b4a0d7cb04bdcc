// src/store.rs
//
// SeenStore: the durable set of already-announced (category, identity)
// pairs. One JSON file, fully reloaded at startup, written through on every
// commit. Writes go to a temp file and are renamed into place so a crash
// mid-write never leaves a torn store behind.
//
// Commit discipline: a key is committed only after its notification was
// delivered (or deliberately suppressed). A crash between detection and
// delivery leaves the item uncommitted, so the next cycle re-offers it:
// at-least-once, never at-most-once.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use metrics::counter;

use crate::error::StoreError;
use crate::types::{Category, DedupKey};

type CategoryMap = BTreeMap<String, DateTime<Utc>>;
type StoreData = BTreeMap<String, CategoryMap>;

#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl SeenStore {
    /// Open (or create) the store at `path`. A missing file starts empty.
    /// Corrupted contents are operator-visible but non-fatal: the affected
    /// category starts empty, which risks re-announcement rather than
    /// silent loss.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(raw) => Self::parse(&path, &raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    fn parse(path: &Path, raw: &str) -> StoreData {
        let outer: BTreeMap<String, serde_json::Value> = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "seen store unreadable; starting all categories empty"
                );
                counter!("store_corruptions_total").increment(1);
                return StoreData::new();
            }
        };

        let mut data = StoreData::new();
        for (category, value) in outer {
            match serde_json::from_value::<CategoryMap>(value) {
                Ok(map) => {
                    data.insert(category, map);
                }
                Err(e) => {
                    tracing::error!(
                        path = %path.display(),
                        %category,
                        error = %e,
                        "seen store category unreadable; starting it empty"
                    );
                    counter!("store_corruptions_total").increment(1);
                }
            }
        }
        data
    }

    pub fn has(&self, key: &DedupKey) -> bool {
        let data = self.data.lock().expect("seen store mutex poisoned");
        data.get(key.category.as_str())
            .is_some_and(|m| m.contains_key(&key.identity))
    }

    /// Record `key` as announced. Idempotent: a second commit of the same
    /// key keeps the original first-seen timestamp and skips the disk write.
    pub fn commit(&self, key: &DedupKey, first_seen: DateTime<Utc>) -> Result<(), StoreError> {
        let mut data = self.data.lock().expect("seen store mutex poisoned");
        let map = data.entry(key.category.as_str().to_string()).or_default();
        if map.contains_key(&key.identity) {
            return Ok(());
        }
        map.insert(key.identity.clone(), first_seen);
        self.persist(&data)
    }

    /// Drop records first seen before `before`. The caller picks `before`
    /// from the per-category retention horizon, which must exceed the
    /// source's pagination lookback or pruned items get re-announced.
    pub fn prune(&self, category: Category, before: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut data = self.data.lock().expect("seen store mutex poisoned");
        let Some(map) = data.get_mut(category.as_str()) else {
            return Ok(0);
        };
        let len_before = map.len();
        map.retain(|_, first_seen| *first_seen >= before);
        let removed = len_before - map.len();
        if removed > 0 {
            self.persist(&data)?;
        }
        Ok(removed)
    }

    pub fn count(&self, category: Category) -> usize {
        let data = self.data.lock().expect("seen store mutex poisoned");
        data.get(category.as_str()).map_or(0, |m| m.len())
    }

    fn persist(&self, data: &StoreData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
