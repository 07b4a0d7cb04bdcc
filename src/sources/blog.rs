// src/sources/blog.rs
use async_trait::async_trait;
use metrics::counter;
use quick_xml::de::from_str;

use crate::error::SourceError;
use crate::sources::{feed, fetch_text, Source};
use crate::text::{clean_text, non_empty, scrub_entities, truncate_chars};
use crate::types::{Category, Payload, RawItem};

const MAX_POSTS: usize = 5;
const SUMMARY_CAP: usize = 300;

/// Blog RSS adapter. Natural identity is the entry GUID, falling back to
/// the entry link. Feed order (newest first) is preserved.
pub struct BlogSource {
    client: reqwest::Client,
    url: String,
}

impl BlogSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn parse_feed(xml: &str) -> Result<Vec<RawItem>, SourceError> {
        let xml = scrub_entities(xml);
        let rss: feed::Rss = from_str(&xml)
            .map_err(|e| SourceError::unavailable(format!("blog feed parse: {e}")))?;

        let mut out = Vec::new();
        for it in rss.channel.items.into_iter().take(MAX_POSTS) {
            let title = clean_text(it.title.as_deref().unwrap_or_default());
            let url = it.link.clone().unwrap_or_default();
            if title.is_empty() && url.is_empty() {
                continue;
            }
            let natural_id = it
                .guid
                .and_then(|g| g.value)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .or_else(|| it.link.clone());

            out.push(RawItem {
                category: Category::Blog,
                natural_id,
                title,
                summary: non_empty(truncate_chars(
                    &clean_text(it.description.as_deref().unwrap_or_default()),
                    SUMMARY_CAP,
                )),
                url,
                published_at: it.pub_date.as_deref().and_then(feed::parse_feed_date),
                payload: Payload::None,
            });
        }
        counter!("items_fetched_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl Source for BlogSource {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let body = fetch_text(&self.client, &self.url).await?;
        Self::parse_feed(&body)
    }

    fn name(&self) -> &'static str {
        "blog"
    }

    fn category(&self) -> Category {
        Category::Blog
    }
}
