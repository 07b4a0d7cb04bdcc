// src/identity.rs
//
// Dedup key derivation. Pure and deterministic: byte-identical items yield
// byte-identical keys on every poll and across restarts.

use crate::text::normalize_for_hash;
use crate::types::{DedupKey, RawItem};

/// Hex digest of the first 16 bytes of SHA-256. Practical uniqueness for
/// the item cardinality we see, not a cryptographic commitment.
pub fn digest(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let out = hasher.finalize();
    let mut hex = String::with_capacity(32);
    for b in out.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut hex, "{:02x}", b);
    }
    hex
}

/// Derive the persistent dedup key for an item.
///
/// Policy: prefer the source's natural identifier; otherwise hash the
/// normalized (title, URL) pair; only when both are empty fall back to a
/// normalized body prefix.
pub fn derive(item: &RawItem) -> DedupKey {
    let identity = match item.natural_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let title = normalize_for_hash(&item.title);
            let url = item.url.trim().to_lowercase();
            if title.is_empty() && url.is_empty() {
                let body = item.summary.as_deref().unwrap_or_default();
                let prefix: String = normalize_for_hash(body).chars().take(256).collect();
                format!("body:{}", digest(&prefix))
            } else {
                digest(&format!("{title}\n{url}"))
            }
        }
    };
    DedupKey {
        category: item.category,
        identity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Payload};

    fn item(natural: Option<&str>, title: &str, url: &str) -> RawItem {
        RawItem {
            category: Category::Blog,
            natural_id: natural.map(str::to_string),
            title: title.to_string(),
            summary: None,
            url: url.to_string(),
            published_at: None,
            payload: Payload::None,
        }
    }

    #[test]
    fn natural_id_wins_over_hash() {
        let key = derive(&item(Some("guid-1"), "Title", "https://x.test/a"));
        assert_eq!(key.identity, "guid-1");
    }

    #[test]
    fn blank_natural_id_falls_back_to_hash() {
        let a = derive(&item(Some("   "), "Title", "https://x.test/a"));
        let b = derive(&item(None, "Title", "https://x.test/a"));
        assert_eq!(a.identity, b.identity);
    }

    #[test]
    fn hash_is_normalization_stable() {
        let a = derive(&item(None, "  Big   News ", "https://x.test/a"));
        let b = derive(&item(None, "big news", "https://x.test/a"));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_items_get_distinct_keys() {
        let a = derive(&item(None, "Post one", "https://x.test/1"));
        let b = derive(&item(None, "Post two", "https://x.test/2"));
        assert_ne!(a.identity, b.identity);
    }
}
