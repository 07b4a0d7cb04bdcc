// tests/providers_status.rs
use newswatch::sources::status::StatusSource;
use newswatch::types::{Payload, StatusKind};

const RSS: &str = include_str!("fixtures/status_rss.xml");
const ATOM: &str = include_str!("fixtures/status_atom.xml");

#[test]
fn classifies_from_title_keywords() {
    assert_eq!(
        StatusSource::classify("Investigating elevated error rates"),
        StatusKind::Incident
    );
    assert_eq!(
        StatusSource::classify("Resolved: API latency restored"),
        StatusKind::Resolved
    );
    assert_eq!(
        StatusSource::classify("Scheduled maintenance this weekend"),
        StatusKind::Maintenance
    );
    assert_eq!(
        StatusSource::classify("Degraded performance on EU nodes"),
        StatusKind::Degraded
    );
    assert_eq!(StatusSource::classify("Routine notice"), StatusKind::Update);
}

#[test]
fn merges_both_encodings_without_duplicates() {
    let rss = StatusSource::parse_rss(RSS).unwrap();
    let atom = StatusSource::parse_atom(ATOM).unwrap();
    assert_eq!(rss.len(), 2);
    assert_eq!(atom.len(), 2);

    let merged = StatusSource::merge(rss, atom);
    // incident 42 appears in both feeds and must survive only once
    assert_eq!(merged.len(), 3);
    let urls: Vec<&str> = merged.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://status.example.test/incidents/42",
            "https://status.example.test/incidents/41",
            "https://status.example.test/incidents/43",
        ]
    );
}

#[test]
fn atom_entries_carry_kind_and_summary() {
    let atom = StatusSource::parse_atom(ATOM).unwrap();
    assert_eq!(
        atom[0].natural_id.as_deref(),
        Some("tag:status.example.test,2024:incident/43")
    );
    match atom[0].payload {
        Payload::Status { kind } => assert_eq!(kind, StatusKind::Maintenance),
        ref other => panic!("unexpected payload: {other:?}"),
    }
    assert_eq!(
        atom[0].summary.as_deref(),
        Some("Database upgrade, expect brief interruptions.")
    );
}
