// src/types.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed set of origins the watcher knows about. The string form is the
/// namespace under which seen identifiers are persisted, so it must stay
/// stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Blog,
    Release,
    MergedPr,
    Changelog,
    Document,
    Status,
    Social,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Blog,
        Category::Release,
        Category::MergedPr,
        Category::Changelog,
        Category::Document,
        Category::Status,
        Category::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Blog => "blog",
            Category::Release => "release",
            Category::MergedPr => "merged_pr",
            Category::Changelog => "changelog",
            Category::Document => "document",
            Category::Status => "status",
            Category::Social => "social",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity class of a status-feed entry, derived from its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Incident,
    Resolved,
    Maintenance,
    Degraded,
    Update,
}

/// Source-specific fields carried alongside the common item shape.
/// A closed set: adapters are fixed, so the payload variants are too.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    None,
    Release {
        repo: String,
        tag: String,
        prerelease: bool,
    },
    MergedPr {
        repo: String,
        number: u64,
        author: String,
    },
    Status {
        kind: StatusKind,
    },
    Page {
        hash: String,
    },
    Social {
        author: String,
    },
}

/// One fetched item, as produced by a source adapter. Immutable once built;
/// discarded after formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    pub category: Category,
    /// Identity the source itself provides (GUID, release id, PR number).
    /// Absent for unstructured pages; identity is then hashed from content.
    pub natural_id: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub payload: Payload,
}

/// Persistent deduplication key: (category, identity). The same real-world
/// item must map to the same key on every poll and across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub category: Category,
    pub identity: String,
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.identity)
    }
}

/// Rendered message ready for delivery. Ephemeral; never persisted.
#[derive(Debug, Clone)]
pub struct Notification {
    pub category: Category,
    pub text: String,
    pub key: DedupKey,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleCounts {
    pub fetched: usize,
    pub new: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Per-cycle observability snapshot: counts per category plus which sources
/// reported themselves unavailable. Logged and exposed on `/status`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleResult {
    pub counts: BTreeMap<String, CycleCounts>,
    pub source_failures: Vec<String>,
    /// Items already announced in a previous cycle and skipped this time.
    pub duplicates: usize,
    /// Old items swallowed by the first-run backfill guard.
    pub suppressed_backfill: usize,
}

impl CycleResult {
    pub fn counts_mut(&mut self, category: Category) -> &mut CycleCounts {
        self.counts.entry(category.as_str().to_string()).or_default()
    }

    pub fn delivered_total(&self) -> usize {
        self.counts.values().map(|c| c.delivered).sum()
    }

    pub fn failed_total(&self) -> usize {
        self.counts.values().map(|c| c.failed).sum()
    }
}
