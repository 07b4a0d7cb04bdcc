// src/sources/document.rs
//
// Hash-of-page adapter for a static reference document. The "item" is the
// whole page: a RawItem is synthesized only when the page's content hash
// differs from the last hash this adapter observed, so there is at most one
// pending item per poll. The hash is embedded in the identity, which lets
// the seen store suppress a re-announcement after a process restart.

use std::sync::Mutex;

use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::SourceError;
use crate::identity::digest;
use crate::sources::{fetch_text, Source};
use crate::text::{clean_text, truncate_chars};
use crate::types::{Category, Payload, RawItem};

const SUMMARY_CAP: usize = 300;
const DEFAULT_TITLE: &str = "Reference document";

pub struct DocumentSource {
    client: reqwest::Client,
    url: String,
    last_hash: Mutex<Option<String>>,
}

impl DocumentSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            last_hash: Mutex::new(None),
        }
    }

    fn page_text(html: &str) -> String {
        static RE_NOISE: OnceCell<Regex> = OnceCell::new();
        let re = RE_NOISE.get_or_init(|| {
            Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").unwrap()
        });
        clean_text(&re.replace_all(html, " "))
    }

    fn page_title(html: &str) -> Option<String> {
        static RE_H1: OnceCell<Regex> = OnceCell::new();
        let re = RE_H1.get_or_init(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").unwrap());
        re.captures(html)
            .map(|c| clean_text(&c[1]))
            .filter(|t| !t.is_empty())
    }

    /// Compare the page against the last observed hash. Returns the single
    /// synthesized item when the content changed, `None` when it did not.
    pub fn observe(&self, html: &str) -> Option<RawItem> {
        let text = Self::page_text(html);
        let hash = digest(&text.to_lowercase());

        let mut last = self.last_hash.lock().expect("document hash mutex poisoned");
        if last.as_deref() == Some(hash.as_str()) {
            return None;
        }
        *last = Some(hash.clone());
        drop(last);

        counter!("items_fetched_total").increment(1);
        Some(RawItem {
            category: Category::Document,
            natural_id: Some(format!("document:{hash}")),
            title: Self::page_title(html).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            summary: Some(truncate_chars(&text, SUMMARY_CAP)),
            url: self.url.clone(),
            published_at: None,
            payload: Payload::Page { hash },
        })
    }
}

#[async_trait]
impl Source for DocumentSource {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let body = fetch_text(&self.client, &self.url).await?;
        Ok(self.observe(&body).into_iter().collect())
    }

    fn name(&self) -> &'static str {
        "document"
    }

    fn category(&self) -> Category {
        Category::Document
    }
}
