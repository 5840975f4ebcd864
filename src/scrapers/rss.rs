//! RSS/Atom feed retrieval.
//!
//! Feeds are the preferred path for every source: plain XML, no article
//! fetching, publication dates included. A source URL is probed at the
//! conventional feed locations first; the page-scrape fallback also calls
//! back into [`discover_feed_urls`] to honor `<link rel="alternate">`
//! autodiscovery tags before giving up on feeds entirely.

use crate::errors::FetchError;
use crate::models::{RawItem, SourceDescriptor};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// Conventional feed paths tried after the URL itself, in order.
const FEED_SUFFIXES: &[&str] = &["/feed", "/rss", "/rss.xml", "/feed.xml"];

static FEED_LINK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<link[^>]+type\s*=\s*["']application/(rss\+xml|atom\+xml)["'][^>]*>"#)
        .expect("Invalid feed link regex")
});

static HREF_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("Invalid href regex"));

/// The URLs probed for a feed: the source URL itself, then the conventional
/// suffixed locations.
pub fn candidate_feed_urls(base: &str) -> Vec<String> {
    let trimmed = base.trim_end_matches('/');
    let mut candidates = vec![base.to_string()];
    for suffix in FEED_SUFFIXES {
        candidates.push(format!("{trimmed}{suffix}"));
    }
    candidates
}

/// Probe the conventional feed locations for a source; the first location
/// that parses with at least one entry wins.
pub async fn fetch_feed_items(
    client: &Client,
    source: &SourceDescriptor,
    max_items: usize,
) -> Result<Vec<RawItem>, FetchError> {
    for candidate in candidate_feed_urls(&source.url) {
        match try_feed(client, source, &candidate, max_items).await {
            Ok(items) if !items.is_empty() => {
                info!(feed = %candidate, count = items.len(), "Using feed");
                return Ok(items);
            }
            Ok(_) => debug!(feed = %candidate, "Feed parsed but has no entries"),
            Err(error) => debug!(feed = %candidate, %error, "Not a usable feed"),
        }
    }
    Err(FetchError::NoContent)
}

/// Fetch one URL and parse it as RSS/Atom, mapping entries to raw items.
/// Entries with neither a title nor a link are not representable and are
/// dropped here rather than handed to the normalizer.
pub async fn try_feed(
    client: &Client,
    source: &SourceDescriptor,
    feed_url: &str,
    max_items: usize,
) -> Result<Vec<RawItem>, FetchError> {
    let response = client.get(feed_url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    let feed = feed_rs::parser::parse(&bytes[..])
        .map_err(|e| FetchError::MalformedFeed(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))
                .unwrap_or_default();
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let summary = entry.summary.map(|t| t.content).unwrap_or_default();
            let published = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.to_rfc3339());

            if title.is_empty() && link.is_empty() {
                return None;
            }
            Some(RawItem {
                source: source.clone(),
                title,
                summary,
                link,
                published,
            })
        })
        .take(max_items)
        .collect();

    Ok(items)
}

/// Extract feed URLs advertised by a page through
/// `<link rel="alternate" type="application/rss+xml">` (or atom) tags,
/// resolved against the page URL.
pub fn discover_feed_urls(html: &str, base: &str) -> Vec<String> {
    let base_url = Url::parse(base).ok();
    let mut feeds = Vec::new();

    for tag in FEED_LINK_TAG.find_iter(html) {
        if let Some(href) = HREF_ATTR
            .captures(tag.as_str())
            .and_then(|caps| caps.get(1))
        {
            let href = href.as_str();
            let resolved = match Url::parse(href) {
                Ok(absolute) => Some(absolute.to_string()),
                Err(_) => base_url
                    .as_ref()
                    .and_then(|b| b.join(href).ok())
                    .map(|u| u.to_string()),
            };
            if let Some(feed_url) = resolved {
                if !feeds.contains(&feed_url) {
                    feeds.push(feed_url);
                }
            }
        }
    }
    feeds
}
