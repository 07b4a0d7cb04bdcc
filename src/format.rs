// src/format.rs
//
// Pure rendering of items into Telegram HTML. Total over any well-formed
// RawItem: missing optionals get category defaults, and every interpolated
// field is escaped. Source content is untrusted and must never be able to
// inject markup into the channel.

use std::fmt::Write as _;

use crate::types::{Payload, RawItem, StatusKind};

fn esc(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

fn esc_attr(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).into_owned()
}

fn push_date_and_link(out: &mut String, item: &RawItem, link_label: &str) {
    if let Some(ts) = item.published_at {
        let _ = writeln!(out, "📅 {}", ts.format("%Y-%m-%d %H:%M UTC"));
    }
    if !item.url.is_empty() {
        let _ = write!(
            out,
            "🔗 <a href=\"{}\">{}</a>",
            esc_attr(&item.url),
            esc(link_label)
        );
    }
}

fn status_emoji(kind: StatusKind) -> &'static str {
    match kind {
        StatusKind::Incident => "🔴",
        StatusKind::Resolved => "✅",
        StatusKind::Maintenance => "🔧",
        StatusKind::Degraded => "⚠️",
        StatusKind::Update => "🔵",
    }
}

/// Render one item. The output is valid Telegram HTML regardless of what
/// the source put in the fields.
pub fn render(item: &RawItem) -> String {
    let mut out = String::new();
    let title = if item.title.trim().is_empty() {
        "Untitled"
    } else {
        item.title.trim()
    };

    match &item.payload {
        Payload::Release {
            repo,
            tag,
            prerelease,
        } => {
            let _ = writeln!(out, "🚀 <b>New Release: {}</b>\n", esc(repo));
            let _ = write!(out, "<b>Version {}</b>", esc(tag));
            if *prerelease {
                out.push_str(" (pre-release)");
            }
            out.push_str("\n\n");
            if let Some(body) = &item.summary {
                let _ = write!(out, "{}\n\n", esc(body));
            }
            push_date_and_link(&mut out, item, "View release");
        }
        Payload::MergedPr {
            repo,
            number,
            author,
        } => {
            let _ = writeln!(out, "🔀 <b>Merged PR: {}</b>\n", esc(repo));
            let _ = writeln!(out, "<b>#{}: {}</b>", number, esc(title));
            let _ = write!(out, "by @{}\n\n", esc(author));
            if let Some(body) = &item.summary {
                let _ = write!(out, "{}\n\n", esc(body));
            }
            push_date_and_link(&mut out, item, "View PR");
        }
        Payload::Status { kind } => {
            let _ = write!(
                out,
                "{} <b>System Status: {}</b>\n\n",
                status_emoji(*kind),
                esc(title)
            );
            if let Some(content) = &item.summary {
                let _ = write!(out, "{}\n\n", esc(content));
            }
            push_date_and_link(&mut out, item, "View status page");
        }
        Payload::Page { .. } => {
            out.push_str("📄 <b>Reference Document Updated</b>\n\n");
            let _ = write!(out, "<b>{}</b>\n\n", esc(title));
            out.push_str("The document has been updated with new content.\n\n");
            push_date_and_link(&mut out, item, "Read document");
        }
        Payload::Social { author } => {
            let _ = write!(out, "🐦 <b>New Post from {}</b>\n\n", esc(author));
            let _ = write!(out, "{}\n\n", esc(title));
            push_date_and_link(&mut out, item, "View post");
        }
        Payload::None => match item.category {
            crate::types::Category::Changelog => {
                out.push_str("📋 <b>Documentation Changelog</b>\n\n");
                let _ = write!(out, "<b>{}</b>\n\n", esc(title));
                if let Some(content) = &item.summary {
                    let _ = write!(out, "{}\n\n", esc(content));
                }
                push_date_and_link(&mut out, item, "View changelog");
            }
            _ => {
                out.push_str("📝 <b>New Blog Post</b>\n\n");
                let _ = write!(out, "<b>{}</b>\n\n", esc(title));
                if let Some(summary) = &item.summary {
                    let _ = write!(out, "{}\n\n", esc(summary));
                }
                push_date_and_link(&mut out, item, "Read more");
            }
        },
    }

    out.trim_end().to_string()
}

/// One-time startup announcement listing the registered sources.
pub fn render_startup(source_names: &[&str]) -> String {
    let mut out = String::from("🤖 <b>News Watcher Started</b>\n\nMonitoring:\n");
    for name in source_names {
        let _ = writeln!(out, "• {}", esc(name));
    }
    out.push_str("\nStay tuned for updates.");
    out
}
