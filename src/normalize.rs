//! Normalization of raw items into canonical records.
//!
//! Pure, deterministic mapping: strip markup, collapse whitespace, resolve
//! relative links against the source URL, parse timestamps, and attach the
//! content fingerprint. Entries lacking both a title and a link are dropped —
//! they cannot be deduplicated or classified — and that is the only filtering
//! performed here. A malformed entry is skipped individually; it never aborts
//! the rest of the batch.

use crate::dedupe;
use crate::models::{NormalizedRecord, RawItem};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use tracing::{debug, warn};
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Map a batch of raw items into normalized records, dropping entries that
/// cannot be represented.
pub fn normalize(raw_items: Vec<RawItem>) -> Vec<NormalizedRecord> {
    let total = raw_items.len();
    let records: Vec<NormalizedRecord> = raw_items.into_iter().filter_map(normalize_item).collect();
    debug!(input = total, kept = records.len(), "Normalized batch");
    records
}

/// Normalize a single raw item. Returns `None` when the entry has neither a
/// usable title nor a usable link.
pub fn normalize_item(item: RawItem) -> Option<NormalizedRecord> {
    let title = strip_markup(&item.title);
    let summary = strip_markup(&item.summary);
    let link = resolve_link(&item.link, &item.source.url);

    if title.is_empty() && link.is_empty() {
        warn!(source = %item.source.url, "Dropping entry with neither title nor link");
        return None;
    }

    let published = item.published.as_deref().and_then(parse_published);
    let source_label = item.source.label_or_host();
    let content_hash = dedupe::content_hash(&title, &link, &summary);

    Some(NormalizedRecord {
        title,
        summary,
        link,
        published,
        source_label,
        content_hash,
    })
}

/// Re-run canonicalization over records read back from the intermediate
/// store. Idempotent: already-normalized records come out unchanged apart
/// from a recomputed fingerprint.
pub fn renormalize(records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    records
        .into_iter()
        .filter_map(|record| {
            let title = strip_markup(&record.title);
            let summary = strip_markup(&record.summary);
            if title.is_empty() && record.link.is_empty() {
                warn!("Dropping stored entry with neither title nor link");
                return None;
            }
            let content_hash = dedupe::content_hash(&title, &record.link, &summary);
            Some(NormalizedRecord {
                title,
                summary,
                content_hash,
                ..record
            })
        })
        .collect()
}

/// Strip HTML markup and entities, then collapse runs of whitespace.
pub fn strip_markup(text: &str) -> String {
    let fragment = Html::parse_fragment(text);
    let flattened = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    WHITESPACE.replace_all(&flattened, " ").trim().to_string()
}

/// Resolve a possibly-relative link against the source URL. An empty input
/// stays empty; an unresolvable link is passed through untouched.
pub fn resolve_link(link: &str, base: &str) -> String {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if let Ok(absolute) = Url::parse(trimmed) {
        return absolute.to_string();
    }
    if let Ok(base_url) = Url::parse(base) {
        if let Ok(joined) = base_url.join(trimmed) {
            return joined.to_string();
        }
    }
    trimmed.to_string()
}

/// Parse a publication timestamp into UTC. Accepts RFC 3339 and RFC 2822
/// (the two formats feeds actually produce); anything else is left unset.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .or_else(|| DateTime::parse_from_rfc2822(trimmed).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
