// src/sources/status.rs
//
// Dual-feed incident adapter: the status page publishes the same event
// stream as both RSS and Atom. Both encodings are fetched, merged, and
// de-duplicated by the incident link they share. One feed failing is fine;
// the source is unavailable only when both are.

use std::collections::HashSet;

use async_trait::async_trait;
use metrics::counter;
use quick_xml::de::from_str;

use crate::error::SourceError;
use crate::sources::{feed, fetch_text, Source};
use crate::text::{clean_text, non_empty, scrub_entities, truncate_chars};
use crate::types::{Category, Payload, RawItem, StatusKind};

const MAX_ITEMS: usize = 5;
const CONTENT_CAP: usize = 400;

pub struct StatusSource {
    client: reqwest::Client,
    rss_url: Option<String>,
    atom_url: Option<String>,
}

impl StatusSource {
    pub fn new(
        client: reqwest::Client,
        rss_url: Option<String>,
        atom_url: Option<String>,
    ) -> Self {
        Self {
            client,
            rss_url,
            atom_url,
        }
    }

    /// Classify an entry from its title keywords; drives the emoji only.
    pub fn classify(title: &str) -> StatusKind {
        let t = title.to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| t.contains(w));
        if any(&["incident", "outage", "down", "error"]) {
            StatusKind::Incident
        } else if any(&["resolved", "fixed", "restored"]) {
            StatusKind::Resolved
        } else if any(&["maintenance", "scheduled", "upgrade"]) {
            StatusKind::Maintenance
        } else if any(&["degraded", "performance", "slow"]) {
            StatusKind::Degraded
        } else {
            StatusKind::Update
        }
    }

    pub fn parse_rss(xml: &str) -> Result<Vec<RawItem>, SourceError> {
        let xml = scrub_entities(xml);
        let rss: feed::Rss = from_str(&xml)
            .map_err(|e| SourceError::unavailable(format!("status rss parse: {e}")))?;

        Ok(rss
            .channel
            .items
            .into_iter()
            .map(|it| {
                let title = clean_text(it.title.as_deref().unwrap_or("Status update"));
                let url = it.link.clone().unwrap_or_default();
                RawItem {
                    category: Category::Status,
                    natural_id: it
                        .guid
                        .and_then(|g| g.value)
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .or_else(|| it.link.clone()),
                    payload: Payload::Status {
                        kind: Self::classify(&title),
                    },
                    title,
                    summary: non_empty(truncate_chars(
                        &clean_text(it.description.as_deref().unwrap_or_default()),
                        CONTENT_CAP,
                    )),
                    url,
                    published_at: it.pub_date.as_deref().and_then(feed::parse_feed_date),
                }
            })
            .collect())
    }

    pub fn parse_atom(xml: &str) -> Result<Vec<RawItem>, SourceError> {
        let xml = scrub_entities(xml);
        let atom: feed::AtomFeed = from_str(&xml)
            .map_err(|e| SourceError::unavailable(format!("status atom parse: {e}")))?;

        Ok(atom
            .entries
            .into_iter()
            .map(|entry| {
                let title = clean_text(
                    entry
                        .title
                        .as_ref()
                        .and_then(|t| t.value.as_deref())
                        .unwrap_or("Status update"),
                );
                let url = entry.first_link().unwrap_or_default().to_string();
                let body = entry
                    .content
                    .as_ref()
                    .and_then(|t| t.value.as_deref())
                    .or_else(|| entry.summary.as_ref().and_then(|t| t.value.as_deref()))
                    .unwrap_or_default();
                let published = entry
                    .published
                    .as_deref()
                    .or(entry.updated.as_deref())
                    .and_then(feed::parse_feed_date);
                RawItem {
                    category: Category::Status,
                    natural_id: entry
                        .id
                        .clone()
                        .filter(|v| !v.trim().is_empty())
                        .or_else(|| entry.first_link().map(str::to_string)),
                    payload: Payload::Status {
                        kind: Self::classify(&title),
                    },
                    title,
                    summary: non_empty(truncate_chars(&clean_text(body), CONTENT_CAP)),
                    url,
                    published_at: published,
                }
            })
            .collect())
    }

    /// Merge the two encodings, primary first. Entries are keyed by the
    /// incident link (shared by both feeds), falling back to the natural id.
    pub fn merge(primary: Vec<RawItem>, alternate: Vec<RawItem>) -> Vec<RawItem> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        for item in primary.into_iter().chain(alternate) {
            let merge_key = if item.url.is_empty() {
                item.natural_id.clone().unwrap_or_else(|| item.title.clone())
            } else {
                item.url.clone()
            };
            if seen.insert(merge_key) {
                out.push(item);
            }
        }
        out.truncate(MAX_ITEMS);
        out
    }
}

#[async_trait]
impl Source for StatusSource {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let rss = match &self.rss_url {
            Some(url) => fetch_text(&self.client, url)
                .await
                .and_then(|b| Self::parse_rss(&b)),
            None => Err(SourceError::unavailable("rss feed not configured")),
        };
        let atom = match &self.atom_url {
            Some(url) => fetch_text(&self.client, url)
                .await
                .and_then(|b| Self::parse_atom(&b)),
            None => Err(SourceError::unavailable("atom feed not configured")),
        };

        match (rss, atom) {
            (Err(r), Err(a)) => Err(SourceError::unavailable(format!(
                "both status feeds failed: {r}; {a}"
            ))),
            (rss, atom) => {
                if let Err(e) = &rss {
                    tracing::warn!(error = %e, "status rss feed failed; using atom only");
                }
                if let Err(e) = &atom {
                    tracing::warn!(error = %e, "status atom feed failed; using rss only");
                }
                let merged =
                    Self::merge(rss.unwrap_or_default(), atom.unwrap_or_default());
                counter!("items_fetched_total").increment(merged.len() as u64);
                Ok(merged)
            }
        }
    }

    fn name(&self) -> &'static str {
        "status"
    }

    fn category(&self) -> Category {
        Category::Status
    }
}
