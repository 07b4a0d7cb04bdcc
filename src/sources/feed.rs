// src/sources/feed.rs
//
// Minimal RSS and Atom models, deserialized with quick-xml. Only the fields
// the adapters read are modeled; everything else is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

#[derive(Debug, Deserialize)]
pub struct Rss {
    pub channel: RssChannel,
}

#[derive(Debug, Deserialize)]
pub struct RssChannel {
    #[serde(rename = "item", default)]
    pub items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
pub struct RssItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<RssGuid>,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RssGuid {
    #[serde(rename = "$text")]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AtomFeed {
    #[serde(rename = "entry", default)]
    pub entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AtomEntry {
    pub id: Option<String>,
    pub title: Option<TextNode>,
    #[serde(rename = "link", default)]
    pub links: Vec<AtomLink>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub summary: Option<TextNode>,
    pub content: Option<TextNode>,
}

#[derive(Debug, Deserialize)]
pub struct AtomLink {
    #[serde(rename = "@href")]
    pub href: Option<String>,
}

/// Element that may carry attributes (e.g. `type="html"`) around its text.
#[derive(Debug, Deserialize)]
pub struct TextNode {
    #[serde(rename = "$text")]
    pub value: Option<String>,
}

impl AtomEntry {
    pub fn first_link(&self) -> Option<&str> {
        self.links.iter().find_map(|l| l.href.as_deref())
    }
}

/// Parse the date formats feeds actually use: RFC 2822 (RSS pubDate) and
/// RFC 3339 (Atom published/updated, GitHub API timestamps).
pub fn parse_feed_date(ts: &str) -> Option<DateTime<Utc>> {
    let t = ts.trim();
    let parsed = OffsetDateTime::parse(t, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(t, &Rfc3339))
        .ok()?;
    DateTime::from_timestamp(parsed.to_offset(UtcOffset::UTC).unix_timestamp(), 0)
}
