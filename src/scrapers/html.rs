//! HTML fallback scraper for sources without a feed.
//!
//! Harvests article links from a landing page (anchors whose href contains
//! one of the usual article path markers), fetches each article, and
//! extracts the `h1` headline, `time[datetime]` publication stamp, and
//! paragraph text. Failed article fetches are logged and skipped without
//! failing the source.

use crate::errors::FetchError;
use crate::models::{RawItem, SourceDescriptor};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// Path markers that usually identify article links.
const LINK_PATTERNS: &[&str] = &["article", "post", "blog", "news"];

/// Keep only the first part of the body text as the summary.
const SUMMARY_CHAR_LIMIT: usize = 300;

/// Scrape a source through its landing page. `page` is the already-fetched
/// landing page body.
pub(super) async fn scrape_page(
    client: &Client,
    source: &SourceDescriptor,
    page: &str,
    max_items: usize,
) -> Result<Vec<RawItem>, FetchError> {
    let links = extract_article_links(page, &source.url);
    if links.is_empty() {
        return Err(FetchError::NoContent);
    }
    debug!(url = %source.url, candidates = links.len(), "Harvested article links");

    let mut items = Vec::new();
    for link in links.into_iter().take(max_items) {
        match fetch_article(client, source, &link).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => debug!(url = %link, "Article produced no content"),
            Err(error) => warn!(url = %link, %error, "Article fetch failed; skipping"),
        }
    }

    if items.is_empty() {
        return Err(FetchError::NoContent);
    }
    info!(url = %source.url, count = items.len(), "Scraped articles from page");
    Ok(items)
}

/// Collect hrefs that look like article links, resolved to absolute URLs,
/// in page order with duplicates removed.
pub(super) fn extract_article_links(page: &str, base: &str) -> Vec<String> {
    let document = Html::parse_document(page);
    let anchor_selector = Selector::parse("a[href]").unwrap();
    let base_url = Url::parse(base).ok();

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let lowered = href.to_lowercase();
        if !LINK_PATTERNS.iter().any(|p| lowered.contains(p)) {
            continue;
        }
        let resolved = match Url::parse(href) {
            Ok(absolute) => Some(absolute.to_string()),
            Err(_) => base_url.as_ref().and_then(|b| b.join(href).ok()).map(|u| u.to_string()),
        };
        if let Some(link) = resolved {
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }
    links
}

/// Fetch a single article page and extract its fields. Returns `Ok(None)`
/// for pages with no usable headline or body.
async fn fetch_article(
    client: &Client,
    source: &SourceDescriptor,
    url: &str,
) -> Result<Option<RawItem>, FetchError> {
    let body = client.get(url).send().await?.error_for_status()?.text().await?;

    let (title, published, text) = {
        let document = Html::parse_document(&body);
        let headline_selector = Selector::parse("h1").unwrap();
        let time_selector = Selector::parse("time[datetime]").unwrap();
        let paragraph_selector = Selector::parse("p").unwrap();

        let title = document
            .select(&headline_selector)
            .next()
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        let published = document
            .select(&time_selector)
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .map(str::to_string);
        let text = document
            .select(&paragraph_selector)
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n");
        (title, published, text)
    };

    if title.trim().is_empty() && text.trim().is_empty() {
        return Ok(None);
    }

    let summary: String = text.chars().take(SUMMARY_CHAR_LIMIT).collect();
    Ok(Some(RawItem {
        source: source.clone(),
        title,
        summary,
        link: url.to_string(),
        published,
    }))
}
