// src/sources/changelog.rs
//
// Documentation changelog adapter. The page has no feed and no stable entry
// ids, so entries are pulled out of headings and identified by content hash
// downstream (natural_id stays None; the identity layer hashes title + URL).

use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::SourceError;
use crate::sources::{fetch_text, Source};
use crate::text::{clean_text, truncate_chars};
use crate::types::{Category, Payload, RawItem};

const MAX_ENTRIES: usize = 5;
const MIN_ENTRY_LEN: usize = 10;
const TITLE_CAP: usize = 100;
const CONTENT_CAP: usize = 500;

pub struct ChangelogSource {
    client: reqwest::Client,
    url: String,
}

impl ChangelogSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Pull headed entries out of the page, page order (newest first).
    /// Navigation chrome and stub headings are dropped.
    pub fn extract_entries(html: &str) -> Vec<String> {
        static RE_HEADING: OnceCell<Regex> = OnceCell::new();
        let re = RE_HEADING.get_or_init(|| Regex::new(r"(?is)<h[23][^>]*>(.*?)</h[23]>").unwrap());

        re.captures_iter(html)
            .map(|c| clean_text(&c[1]))
            .filter(|text| {
                text.len() >= MIN_ENTRY_LEN
                    && !text.to_lowercase().contains("table of contents")
                    && !text.to_lowercase().contains("navigation")
            })
            .collect()
    }

    pub fn items_from_page(&self, html: &str) -> Vec<RawItem> {
        let mut entries = Self::extract_entries(html);
        entries.truncate(MAX_ENTRIES);
        counter!("items_fetched_total").increment(entries.len() as u64);
        entries
            .into_iter()
            .map(|entry| RawItem {
                category: Category::Changelog,
                natural_id: None,
                title: truncate_chars(&entry, TITLE_CAP),
                summary: Some(truncate_chars(&entry, CONTENT_CAP)),
                url: self.url.clone(),
                published_at: None,
                payload: Payload::None,
            })
            .collect()
    }
}

#[async_trait]
impl Source for ChangelogSource {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let body = fetch_text(&self.client, &self.url).await?;
        Ok(self.items_from_page(&body))
    }

    fn name(&self) -> &'static str {
        "changelog"
    }

    fn category(&self) -> Category {
        Category::Changelog
    }
}
