// src/config.rs
//
// Environment-driven configuration. `.env` is loaded by the binary before
// this runs; everything here reads plain env vars so deployment stays a
// matter of exporting variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

const DEFAULT_INTERVAL_MINUTES: u64 = 5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SEND_GAP_SECS: u64 = 2;
const DEFAULT_SEND_ATTEMPTS: u32 = 3;
const DEFAULT_STORE_PATH: &str = "state/seen.json";
const DEFAULT_API_BIND: &str = "127.0.0.1:8080";

const DEFAULT_SOCIAL_MIRRORS: [&str; 3] = [
    "https://nitter.net",
    "https://nitter.privacydev.net",
    "https://nitter.poast.org",
];

#[derive(Debug, Clone)]
pub struct SourceToggles {
    pub blog: bool,
    pub releases: bool,
    pub merged_prs: bool,
    pub changelog: bool,
    pub document: bool,
    pub status: bool,
    pub social: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub channel_id: String,
    pub check_interval: Duration,
    pub github_token: Option<String>,
    pub repos: Vec<String>,
    pub blog_rss_url: Option<String>,
    pub changelog_url: Option<String>,
    pub document_url: Option<String>,
    pub status_rss_url: Option<String>,
    pub status_atom_url: Option<String>,
    pub social_handle: Option<String>,
    pub social_mirrors: Vec<String>,
    pub enable: SourceToggles,
    pub store_path: PathBuf,
    pub http_timeout: Duration,
    pub min_send_gap: Duration,
    pub max_send_attempts: u32,
    pub announce_startup: bool,
    pub api_bind: String,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    match env_opt(key) {
        Some(v) => matches!(
            v.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_list(key: &str) -> Vec<String> {
    env_opt(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Repo list file: `repos = ["owner/name", ...]` in TOML.
fn load_repos_file(path: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct RepoFile {
        repos: Vec<String>,
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading repo list from {path}"))?;
    let parsed: RepoFile =
        toml::from_str(&content).with_context(|| format!("parsing repo list from {path}"))?;
    Ok(parsed
        .repos
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect())
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bot_token = env_opt("TELEGRAM_BOT_TOKEN")
            .ok_or_else(|| anyhow!("TELEGRAM_BOT_TOKEN is required"))?;
        let channel_id = env_opt("TELEGRAM_CHANNEL_ID")
            .ok_or_else(|| anyhow!("TELEGRAM_CHANNEL_ID is required"))?;

        // hours win over minutes when both are set
        let interval_hours = env_u64("CHECK_INTERVAL_HOURS", 0);
        let check_interval = if interval_hours > 0 {
            Duration::from_secs(interval_hours * 3600)
        } else {
            Duration::from_secs(env_u64("CHECK_INTERVAL_MINUTES", DEFAULT_INTERVAL_MINUTES) * 60)
        };

        let mut repos = env_list("WATCH_REPOS");
        if repos.is_empty() {
            if let Some(path) = env_opt("WATCH_REPOS_FILE") {
                repos = load_repos_file(&path)?;
            }
        }

        let mut social_mirrors = env_list("SOCIAL_MIRRORS");
        if social_mirrors.is_empty() {
            social_mirrors = DEFAULT_SOCIAL_MIRRORS
                .iter()
                .map(|s| s.to_string())
                .collect();
        }

        Ok(Self {
            bot_token,
            channel_id,
            check_interval,
            github_token: env_opt("GITHUB_TOKEN"),
            repos,
            blog_rss_url: env_opt("BLOG_RSS_URL"),
            changelog_url: env_opt("CHANGELOG_URL"),
            document_url: env_opt("DOCUMENT_URL"),
            status_rss_url: env_opt("STATUS_RSS_URL"),
            status_atom_url: env_opt("STATUS_ATOM_URL"),
            social_handle: env_opt("SOCIAL_HANDLE"),
            social_mirrors,
            enable: SourceToggles {
                blog: env_flag("MONITOR_BLOG", true),
                releases: env_flag("MONITOR_RELEASES", true),
                merged_prs: env_flag("MONITOR_MERGED_PRS", true),
                changelog: env_flag("MONITOR_CHANGELOG", true),
                document: env_flag("MONITOR_DOCUMENT", true),
                status: env_flag("MONITOR_STATUS", true),
                social: env_flag("MONITOR_SOCIAL", false),
            },
            store_path: PathBuf::from(
                env_opt("STORE_PATH").unwrap_or_else(|| DEFAULT_STORE_PATH.to_string()),
            ),
            http_timeout: Duration::from_secs(env_u64(
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            min_send_gap: Duration::from_secs(env_u64("SEND_GAP_SECS", DEFAULT_SEND_GAP_SECS)),
            max_send_attempts: env_u64("SEND_MAX_ATTEMPTS", DEFAULT_SEND_ATTEMPTS as u64) as u32,
            announce_startup: env_flag("ANNOUNCE_STARTUP", true),
            api_bind: env_opt("API_BIND").unwrap_or_else(|| DEFAULT_API_BIND.to_string()),
        })
    }
}
