// src/sources/github.rs
//
// Paginated-API adapters over the GitHub REST API: releases and merged pull
// requests per tracked repository. One repository failing never blocks the
// others; the source as a whole is unavailable only when every repository
// fails. An optional bearer token raises the rate-limit ceiling; without it
// the same requests run against the anonymous quota.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use crate::error::SourceError;
use crate::sources::{feed, Source};
use crate::text::{clean_text, truncate_chars};
use crate::types::{Category, Payload, RawItem};

const RELEASES_PER_REPO: usize = 5;
const PRS_PER_REPO: usize = 3;
const BODY_CAP: usize = 400;

pub struct GithubClient {
    http: reqwest::Client,
    token: Option<String>,
    api_base: String,
}

impl GithubClient {
    pub fn new(http: reqwest::Client, token: Option<String>) -> Self {
        Self {
            http,
            token,
            api_base: "https://api.github.com".to_string(),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    async fn get(&self, path_and_query: &str) -> Result<String, SourceError> {
        let url = format!("{}{}", self.api_base, path_and_query);
        let mut req = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(SourceError::unavailable)?;
        let resp = resp.error_for_status().map_err(SourceError::unavailable)?;
        resp.text().await.map_err(SourceError::unavailable)
    }
}

#[derive(Debug, Deserialize)]
struct ApiRelease {
    id: u64,
    tag_name: Option<String>,
    name: Option<String>,
    body: Option<String>,
    html_url: Option<String>,
    published_at: Option<String>,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

#[derive(Debug, Deserialize)]
struct ApiPull {
    number: u64,
    title: Option<String>,
    body: Option<String>,
    html_url: Option<String>,
    merged_at: Option<String>,
    user: Option<ApiUser>,
    base: Option<ApiBase>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiBase {
    #[serde(rename = "ref")]
    branch: Option<String>,
}

/// Strip blank lines and cap length; release and PR bodies are markdown
/// walls of text otherwise.
fn clean_body(body: &str) -> Option<String> {
    let joined = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let cleaned = truncate_chars(&clean_text(&joined), BODY_CAP);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn merge_repo_results(
    repos: &[String],
    results: Vec<Result<Vec<RawItem>, SourceError>>,
    what: &str,
) -> Result<Vec<RawItem>, SourceError> {
    let mut all = Vec::new();
    let mut failures = 0usize;
    for (repo, result) in repos.iter().zip(results) {
        match result {
            Ok(mut items) => all.append(&mut items),
            Err(e) => {
                failures += 1;
                tracing::warn!(
                    repo = %repo,
                    error = %e,
                    "github {what} fetch failed; other repositories continue"
                );
            }
        }
    }
    if !repos.is_empty() && failures == repos.len() {
        return Err(SourceError::unavailable(format!(
            "all {} tracked repositories failed",
            repos.len()
        )));
    }
    // newest first across repositories; items without a date sort last
    all.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    Ok(all)
}

/// Release announcements per tracked repository. Drafts are skipped;
/// pre-releases are carried with a flag. Returned newest-first.
pub struct GithubReleases {
    gh: Arc<GithubClient>,
    repos: Vec<String>,
}

impl GithubReleases {
    pub fn new(gh: Arc<GithubClient>, repos: Vec<String>) -> Self {
        Self { gh, repos }
    }

    pub fn parse_releases(repo: &str, body: &str) -> Result<Vec<RawItem>, SourceError> {
        let releases: Vec<ApiRelease> = serde_json::from_str(body)
            .map_err(|e| SourceError::unavailable(format!("releases parse for {repo}: {e}")))?;

        let mut out = Vec::new();
        for r in releases {
            if r.draft {
                continue;
            }
            let tag = r
                .tag_name
                .clone()
                .or_else(|| r.name.clone())
                .unwrap_or_else(|| "unknown".to_string());
            let title = r
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| tag.clone());
            out.push(RawItem {
                category: Category::Release,
                natural_id: Some(format!("{repo}:release:{}", r.id)),
                title,
                summary: r.body.as_deref().and_then(clean_body),
                url: r
                    .html_url
                    .unwrap_or_else(|| format!("https://github.com/{repo}/releases")),
                published_at: r.published_at.as_deref().and_then(feed::parse_feed_date),
                payload: Payload::Release {
                    repo: repo.to_string(),
                    tag,
                    prerelease: r.prerelease,
                },
            });
        }
        counter!("items_fetched_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl Source for GithubReleases {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let mut results = Vec::with_capacity(self.repos.len());
        for repo in &self.repos {
            let result = self
                .gh
                .get(&format!("/repos/{repo}/releases?per_page={RELEASES_PER_REPO}"))
                .await
                .and_then(|body| Self::parse_releases(repo, &body));
            results.push(result);
        }
        merge_repo_results(&self.repos, results, "releases")
    }

    fn name(&self) -> &'static str {
        "github-releases"
    }

    fn category(&self) -> Category {
        Category::Release
    }
}

/// Merged pull requests targeting main/master, capped per repository.
/// Returned newest-first by merge time.
pub struct GithubMergedPrs {
    gh: Arc<GithubClient>,
    repos: Vec<String>,
}

impl GithubMergedPrs {
    pub fn new(gh: Arc<GithubClient>, repos: Vec<String>) -> Self {
        Self { gh, repos }
    }

    pub fn parse_merged_prs(repo: &str, body: &str) -> Result<Vec<RawItem>, SourceError> {
        let pulls: Vec<ApiPull> = serde_json::from_str(body)
            .map_err(|e| SourceError::unavailable(format!("pulls parse for {repo}: {e}")))?;

        let mut out = Vec::new();
        for pr in pulls {
            let Some(merged_at) = pr.merged_at.as_deref() else {
                continue;
            };
            let branch = pr
                .base
                .as_ref()
                .and_then(|b| b.branch.as_deref())
                .unwrap_or_default();
            if branch != "main" && branch != "master" {
                continue;
            }
            out.push(RawItem {
                category: Category::MergedPr,
                natural_id: Some(format!("{repo}:pr:{}", pr.number)),
                title: clean_text(pr.title.as_deref().unwrap_or("Untitled PR")),
                summary: pr.body.as_deref().and_then(clean_body),
                url: pr
                    .html_url
                    .unwrap_or_else(|| format!("https://github.com/{repo}/pull/{}", pr.number)),
                published_at: feed::parse_feed_date(merged_at),
                payload: Payload::MergedPr {
                    repo: repo.to_string(),
                    number: pr.number,
                    author: pr
                        .user
                        .and_then(|u| u.login)
                        .unwrap_or_else(|| "unknown".to_string()),
                },
            });
            if out.len() >= PRS_PER_REPO {
                break;
            }
        }
        counter!("items_fetched_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl Source for GithubMergedPrs {
    async fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let mut results = Vec::with_capacity(self.repos.len());
        for repo in &self.repos {
            // fetch extra closed PRs; only merged ones to main survive the filter
            let result = self
                .gh
                .get(&format!(
                    "/repos/{repo}/pulls?state=closed&sort=updated&direction=desc&per_page={}",
                    PRS_PER_REPO * 2
                ))
                .await
                .and_then(|body| Self::parse_merged_prs(repo, &body));
            results.push(result);
        }
        merge_repo_results(&self.repos, results, "merged PRs")
    }

    fn name(&self) -> &'static str {
        "github-merged-prs"
    }

    fn category(&self) -> Category {
        Category::MergedPr
    }
}
