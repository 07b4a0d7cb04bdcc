// src/sources/mod.rs
pub mod blog;
pub mod changelog;
pub mod document;
pub mod feed;
pub mod github;
pub mod social;
pub mod status;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::SourceError;
use crate::types::{Category, RawItem};

/// One pollable origin. Implementations perform network I/O but never touch
/// shared state; every failure mode surfaces as `SourceError::Unavailable`,
/// which callers treat as "zero items this cycle".
#[async_trait]
pub trait Source: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError>;

    fn name(&self) -> &'static str;

    fn category(&self) -> Category;

    /// Whether `fetch` returns items newest-first. The pipeline reverses
    /// such batches before delivery so the channel reads chronologically.
    fn newest_first(&self) -> bool {
        true
    }
}

/// GET `url` and return the body, mapping any non-200 or transport problem
/// to `SourceError::Unavailable`.
pub(crate) async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, SourceError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(SourceError::unavailable)?;
    let resp = resp.error_for_status().map_err(SourceError::unavailable)?;
    resp.text().await.map_err(SourceError::unavailable)
}

/// Build the registered source set from config. Sources whose flag is off
/// or whose URL is missing are skipped with a log line, never an error.
pub fn build(cfg: &AppConfig, http: &reqwest::Client) -> Vec<Arc<dyn Source>> {
    let mut sources: Vec<Arc<dyn Source>> = Vec::new();

    if cfg.enable.blog {
        match &cfg.blog_rss_url {
            Some(url) => sources.push(Arc::new(blog::BlogSource::new(http.clone(), url))),
            None => tracing::warn!("blog source enabled but BLOG_RSS_URL is not set; skipping"),
        }
    }

    if (cfg.enable.releases || cfg.enable.merged_prs) && cfg.repos.is_empty() {
        tracing::warn!("github sources enabled but no repositories tracked; skipping");
    } else {
        let gh = Arc::new(github::GithubClient::new(
            http.clone(),
            cfg.github_token.clone(),
        ));
        if cfg.enable.releases {
            sources.push(Arc::new(github::GithubReleases::new(
                gh.clone(),
                cfg.repos.clone(),
            )));
        }
        if cfg.enable.merged_prs {
            sources.push(Arc::new(github::GithubMergedPrs::new(
                gh.clone(),
                cfg.repos.clone(),
            )));
        }
    }

    if cfg.enable.changelog {
        match &cfg.changelog_url {
            Some(url) => {
                sources.push(Arc::new(changelog::ChangelogSource::new(http.clone(), url)))
            }
            None => tracing::warn!("changelog source enabled but CHANGELOG_URL is not set; skipping"),
        }
    }

    if cfg.enable.document {
        match &cfg.document_url {
            Some(url) => sources.push(Arc::new(document::DocumentSource::new(http.clone(), url))),
            None => tracing::warn!("document source enabled but DOCUMENT_URL is not set; skipping"),
        }
    }

    if cfg.enable.status {
        if cfg.status_rss_url.is_none() && cfg.status_atom_url.is_none() {
            tracing::warn!("status source enabled but no status feed URL is set; skipping");
        } else {
            sources.push(Arc::new(status::StatusSource::new(
                http.clone(),
                cfg.status_rss_url.clone(),
                cfg.status_atom_url.clone(),
            )));
        }
    }

    if cfg.enable.social {
        match &cfg.social_handle {
            Some(handle) => sources.push(Arc::new(social::SocialSource::new(
                http.clone(),
                handle,
                cfg.social_mirrors.clone(),
            ))),
            None => tracing::warn!("social source enabled but SOCIAL_HANDLE is not set; skipping"),
        }
    }

    sources
}
