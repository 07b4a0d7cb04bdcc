// tests/providers_github.rs
use newswatch::sources::github::{GithubMergedPrs, GithubReleases};
use newswatch::types::{Category, Payload};

const RELEASES: &str = include_str!("fixtures/github_releases.json");
const PRS: &str = include_str!("fixtures/github_prs.json");

#[test]
fn releases_skip_drafts_and_flag_prereleases() {
    let items = GithubReleases::parse_releases("org/core", RELEASES).unwrap();
    assert_eq!(items.len(), 2, "draft must be dropped");

    assert_eq!(items[0].category, Category::Release);
    assert_eq!(items[0].natural_id.as_deref(), Some("org/core:release:9003"));
    match &items[0].payload {
        Payload::Release {
            repo,
            tag,
            prerelease,
        } => {
            assert_eq!(repo, "org/core");
            assert_eq!(tag, "v0.9.0-rc.1");
            assert!(prerelease);
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    // empty release name falls back to the tag
    assert_eq!(items[1].title, "v0.8.2");
    // blank lines stripped from the body
    assert_eq!(
        items[1].summary.as_deref(),
        Some("Bug fixes. See the changelog for details.")
    );
}

#[test]
fn merged_prs_filter_unmerged_and_non_main() {
    let items = GithubMergedPrs::parse_merged_prs("org/core", PRS).unwrap();
    let numbers: Vec<u64> = items
        .iter()
        .map(|i| match &i.payload {
            Payload::MergedPr { number, .. } => *number,
            other => panic!("unexpected payload: {other:?}"),
        })
        .collect();
    // 500 never merged, 499 targeted a release branch
    assert_eq!(numbers, vec![501, 498]);

    assert_eq!(items[0].natural_id.as_deref(), Some("org/core:pr:501"));
    match &items[0].payload {
        Payload::MergedPr { author, .. } => assert_eq!(author, "alice"),
        other => panic!("unexpected payload: {other:?}"),
    }
    assert!(items[0].published_at.is_some(), "merge time is the item date");
}

#[test]
fn malformed_json_is_unavailable() {
    assert!(GithubReleases::parse_releases("org/core", "{").is_err());
    assert!(GithubMergedPrs::parse_merged_prs("org/core", "not json").is_err());
}
