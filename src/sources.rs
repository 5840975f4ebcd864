//! Source registry.
//!
//! The registry is a pure function over descriptors: built-in defaults plus
//! caller-supplied extras, with duplicate URLs collapsed. Malformed URLs are
//! kept (and logged) so the fetcher can fail on them in isolation instead of
//! the whole run rejecting them upfront.

use crate::models::SourceDescriptor;
use itertools::Itertools;
use tracing::warn;

/// Built-in tech-news sites scraped on every run.
const DEFAULT_SITES: &[(&str, &str)] = &[
    (
        "https://techcrunch.com/category/artificial-intelligence/feed/",
        "techcrunch",
    ),
    ("https://www.theverge.com", "theverge"),
    ("https://www.wired.com", "wired"),
    ("https://www.technologyreview.com", "technologyreview"),
    ("https://blog.google", "google"),
];

/// The default source list.
pub fn default_sources() -> Vec<SourceDescriptor> {
    DEFAULT_SITES
        .iter()
        .map(|(url, label)| SourceDescriptor::labeled(*url, *label))
        .collect()
}

/// Concatenate the base list with caller-supplied extras, collapsing
/// duplicate URLs (first occurrence wins).
pub fn resolve_sources(
    base: &[SourceDescriptor],
    extra: Vec<SourceDescriptor>,
) -> Vec<SourceDescriptor> {
    let resolved: Vec<SourceDescriptor> = base
        .iter()
        .cloned()
        .chain(extra)
        .unique_by(|source| source.url.clone())
        .collect();

    for source in &resolved {
        if url::Url::parse(&source.url).is_err() {
            warn!(url = %source.url, "Source URL does not parse; it will be kept but is expected to fail at fetch time");
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources_present_and_labeled() {
        let defaults = default_sources();
        assert_eq!(defaults.len(), 5);
        assert!(defaults.iter().all(|s| s.label.is_some()));
        assert!(defaults.iter().any(|s| s.url.contains("techcrunch.com")));
    }

    #[test]
    fn test_resolve_appends_extras_after_defaults() {
        let base = default_sources();
        let extra = vec![SourceDescriptor::new("https://example.com/feed")];
        let resolved = resolve_sources(&base, extra);

        assert_eq!(resolved.len(), base.len() + 1);
        assert_eq!(resolved.last().unwrap().url, "https://example.com/feed");
    }

    #[test]
    fn test_resolve_collapses_duplicate_urls_first_wins() {
        let base = vec![SourceDescriptor::labeled("https://example.com", "first")];
        let extra = vec![
            SourceDescriptor::labeled("https://example.com", "second"),
            SourceDescriptor::new("https://other.example"),
        ];
        let resolved = resolve_sources(&base, extra);

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].label.as_deref(), Some("first"));
        assert_eq!(resolved[1].url, "https://other.example");
    }

    #[test]
    fn test_resolve_keeps_malformed_urls() {
        let extra = vec![SourceDescriptor::new("not://a real url%%")];
        let resolved = resolve_sources(&[], extra);
        assert_eq!(resolved.len(), 1);
    }
}
