//! Demo that renders one sample notification per category to stdout, so the
//! channel formatting can be eyeballed without a bot token.

use chrono::Utc;
use newswatch::format;
use newswatch::types::{Category, Payload, RawItem, StatusKind};

fn main() {
    let samples = [
        RawItem {
            category: Category::Blog,
            natural_id: Some("demo-post".into()),
            title: "Designing the v2 Pipeline".into(),
            summary: Some("A walk through the new ingestion architecture.".into()),
            url: "https://blog.example.test/posts/v2-pipeline".into(),
            published_at: Some(Utc::now()),
            payload: Payload::None,
        },
        RawItem {
            category: Category::Release,
            natural_id: Some("org/core:release:1".into()),
            title: "v0.9.0".into(),
            summary: Some("GPU backend, faster bootstrapping.".into()),
            url: "https://github.com/org/core/releases/tag/v0.9.0".into(),
            published_at: Some(Utc::now()),
            payload: Payload::Release {
                repo: "org/core".into(),
                tag: "v0.9.0".into(),
                prerelease: false,
            },
        },
        RawItem {
            category: Category::MergedPr,
            natural_id: Some("org/core:pr:501".into()),
            title: "Speed up bootstrapping keys".into(),
            summary: None,
            url: "https://github.com/org/core/pull/501".into(),
            published_at: Some(Utc::now()),
            payload: Payload::MergedPr {
                repo: "org/core".into(),
                number: 501,
                author: "alice".into(),
            },
        },
        RawItem {
            category: Category::Status,
            natural_id: Some("incident-42".into()),
            title: "Resolved: API latency restored".into(),
            summary: Some("The upstream provider fixed the routing issue.".into()),
            url: "https://status.example.test/incidents/42".into(),
            published_at: Some(Utc::now()),
            payload: Payload::Status {
                kind: StatusKind::Resolved,
            },
        },
    ];

    for item in &samples {
        println!("--- {} ---", item.category);
        println!("{}\n", format::render(item));
    }
    println!("--- startup ---");
    println!("{}", format::render_startup(&["blog", "github-releases", "status"]));
}
