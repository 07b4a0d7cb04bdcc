// src/sources/social.rs
//
// Best-effort social timeline adapter. Mirrors are tried in order and the
// first one that yields posts wins; when every mirror fails the source
// returns empty rather than unavailable, so this origin degrades silently
// without showing up as a cycle failure.

use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::SourceError;
use crate::sources::{fetch_text, Source};
use crate::text::{clean_text, truncate_chars};
use crate::types::{Category, Payload, RawItem};

const MAX_POSTS: usize = 10;
const TITLE_CAP: usize = 280;

pub struct SocialSource {
    client: reqwest::Client,
    handle: String,
    mirrors: Vec<String>,
}

impl SocialSource {
    pub fn new(client: reqwest::Client, handle: impl Into<String>, mirrors: Vec<String>) -> Self {
        Self {
            client,
            handle: handle.into(),
            mirrors,
        }
    }

    /// Scrape post ids and contents out of a mirror timeline page.
    pub fn parse_timeline(handle: &str, html: &str) -> Vec<RawItem> {
        static RE_STATUS: OnceCell<Regex> = OnceCell::new();
        let re_status =
            RE_STATUS.get_or_init(|| Regex::new(r#"href="[^"]*/status/(\d+)"#).unwrap());
        static RE_CONTENT: OnceCell<Regex> = OnceCell::new();
        let re_content = RE_CONTENT.get_or_init(|| {
            Regex::new(r#"(?is)<div[^>]*class="[^"]*tweet-content[^"]*"[^>]*>(.*?)</div>"#)
                .unwrap()
        });

        let mut ids: Vec<String> = Vec::new();
        for cap in re_status.captures_iter(html) {
            let id = cap[1].to_string();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        let contents: Vec<String> = re_content
            .captures_iter(html)
            .map(|c| clean_text(&c[1]))
            .collect();

        ids.into_iter()
            .take(MAX_POSTS)
            .enumerate()
            .map(|(i, id)| {
                let text = contents.get(i).cloned().unwrap_or_default();
                RawItem {
                    category: Category::Social,
                    natural_id: Some(format!("social:{id}")),
                    title: if text.is_empty() {
                        "New post".to_string()
                    } else {
                        truncate_chars(&text, TITLE_CAP)
                    },
                    summary: None,
                    url: format!("https://twitter.com/{handle}/status/{id}"),
                    published_at: None,
                    payload: Payload::Social {
                        author: format!("@{handle}"),
                    },
                }
            })
            .collect()
    }
}

#[async_trait]
impl Source for SocialSource {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        for mirror in &self.mirrors {
            let url = format!("{}/{}", mirror.trim_end_matches('/'), self.handle);
            match fetch_text(&self.client, &url).await {
                Ok(body) => {
                    let items = Self::parse_timeline(&self.handle, &body);
                    if !items.is_empty() {
                        counter!("items_fetched_total").increment(items.len() as u64);
                        return Ok(items);
                    }
                    tracing::debug!(%mirror, "mirror returned no posts; trying next");
                }
                Err(e) => {
                    tracing::debug!(%mirror, error = %e, "mirror failed; trying next");
                }
            }
        }
        tracing::info!(handle = %self.handle, "all mirrors failed; social source degrades to empty");
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "social"
    }

    fn category(&self) -> Category {
        Category::Social
    }
}
