//! Fetching raw items from news sources.
//!
//! Every source goes through the same hybrid strategy:
//!
//! 1. **Feed probing** ([`rss`]): the URL itself and the conventional feed
//!    locations (`/feed`, `/rss`, `/rss.xml`, `/feed.xml`)
//! 2. **Feed autodiscovery** ([`rss::discover_feed_urls`]): `<link
//!    rel="alternate">` tags on the landing page
//! 3. **Page scraping** ([`html`]): harvest article links from the landing
//!    page and extract headline, date, and body text per article
//!
//! # Failure isolation
//!
//! Sources fetch concurrently under a configured limit, each within its own
//! time budget and with a single jittered retry. A source that times out or
//! errors is recorded and skipped — it never blocks or fails the others.
//! [`merge_outcomes`] turns the per-source results into the batch result,
//! failing only when every source came up empty-handed.

pub mod html;
pub mod rss;

use crate::config::PipelineConfig;
use crate::errors::{FetchError, PipelineError};
use crate::models::{RawItem, SourceDescriptor};
use crate::normalize;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Delay before the single per-source retry; a random jitter is added on top.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// The result of fetching one source.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: SourceDescriptor,
    pub result: Result<Vec<RawItem>, FetchError>,
}

/// Build the shared HTTP client from configuration.
pub fn build_client(config: &PipelineConfig) -> Result<Client, PipelineError> {
    Client::builder()
        .timeout(config.fetch_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PipelineError::Config(format!("cannot build HTTP client: {e}")))
}

/// Fetch all sources concurrently, bounded by the configured limit.
/// Outcomes are returned in source order regardless of completion order so
/// that downstream first-seen-wins deduplication stays deterministic.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn fetch(
    client: &Client,
    sources: Vec<SourceDescriptor>,
    config: &PipelineConfig,
) -> Vec<SourceOutcome> {
    let budget = config.fetch_timeout;
    let max_items = config.max_items_per_source;
    let max_age_days = config.max_age_days;

    let mut outcomes: Vec<(usize, SourceOutcome)> = stream::iter(sources.into_iter().enumerate())
        .map(|(index, source)| {
            let client = client.clone();
            async move {
                let result =
                    fetch_with_retry(&client, &source, budget, max_items, max_age_days).await;
                match &result {
                    Ok(items) => info!(url = %source.url, count = items.len(), "Source fetched"),
                    Err(error) => warn!(url = %source.url, %error, "Source failed; skipping"),
                }
                (index, SourceOutcome { source, result })
            }
        })
        .buffer_unordered(config.fetch_concurrency)
        .collect()
        .await;

    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

/// Flatten per-source outcomes into one batch, in source order. Fails with
/// `SourceUnavailable` only when every attempted source failed; a partial
/// fetch is a success.
pub fn merge_outcomes(outcomes: Vec<SourceOutcome>) -> Result<Vec<RawItem>, PipelineError> {
    let attempted = outcomes.len();
    let mut items = Vec::new();
    let mut failed = 0usize;

    for outcome in outcomes {
        match outcome.result {
            Ok(batch) => items.extend(batch),
            Err(_) => failed += 1,
        }
    }

    if attempted > 0 && failed == attempted {
        return Err(PipelineError::SourceUnavailable { attempted });
    }
    Ok(items)
}

/// One attempt plus a single jittered retry, each within the time budget.
async fn fetch_with_retry(
    client: &Client,
    source: &SourceDescriptor,
    budget: Duration,
    max_items: usize,
    max_age_days: Option<i64>,
) -> Result<Vec<RawItem>, FetchError> {
    match fetch_once(client, source, budget, max_items, max_age_days).await {
        Ok(items) => Ok(items),
        Err(error) => {
            let jitter = Duration::from_millis(rand::rng().random_range(0..=250));
            let delay = RETRY_BASE_DELAY + jitter;
            warn!(url = %source.url, %error, ?delay, "Fetch failed; retrying once");
            tokio::time::sleep(delay).await;
            fetch_once(client, source, budget, max_items, max_age_days).await
        }
    }
}

async fn fetch_once(
    client: &Client,
    source: &SourceDescriptor,
    budget: Duration,
    max_items: usize,
    max_age_days: Option<i64>,
) -> Result<Vec<RawItem>, FetchError> {
    let items = tokio::time::timeout(budget, fetch_source(client, source, max_items))
        .await
        .map_err(|_| FetchError::Timeout { budget })??;
    Ok(filter_by_age(items, max_age_days))
}

/// The hybrid feed-then-page strategy for a single source.
async fn fetch_source(
    client: &Client,
    source: &SourceDescriptor,
    max_items: usize,
) -> Result<Vec<RawItem>, FetchError> {
    match rss::fetch_feed_items(client, source, max_items).await {
        Ok(items) => return Ok(items),
        Err(error) => {
            debug!(url = %source.url, %error, "No feed at conventional locations; trying the page")
        }
    }

    let page = client
        .get(&source.url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    for feed_url in rss::discover_feed_urls(&page, &source.url) {
        match rss::try_feed(client, source, &feed_url, max_items).await {
            Ok(items) if !items.is_empty() => {
                info!(url = %source.url, feed = %feed_url, "Using autodiscovered feed");
                return Ok(items);
            }
            Ok(_) => {}
            Err(error) => debug!(feed = %feed_url, %error, "Autodiscovered feed unusable"),
        }
    }

    html::scrape_page(client, source, &page, max_items).await
}

/// Drop items older than the recency window. Items without a parseable
/// publication date are kept.
fn filter_by_age(items: Vec<RawItem>, max_age_days: Option<i64>) -> Vec<RawItem> {
    let Some(days) = max_age_days else {
        return items;
    };
    let cutoff = Utc::now() - chrono::Duration::days(days);
    let before = items.len();
    let kept: Vec<RawItem> = items
        .into_iter()
        .filter(|item| {
            match item.published.as_deref().and_then(normalize::parse_published) {
                Some(date) => date >= cutoff,
                None => true,
            }
        })
        .collect();
    if kept.len() < before {
        debug!(dropped = before - kept.len(), "Filtered items outside recency window");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source: &SourceDescriptor, title: &str) -> RawItem {
        RawItem {
            source: source.clone(),
            title: title.to_string(),
            summary: String::new(),
            link: format!("https://example.com/{title}"),
            published: None,
        }
    }

    #[test]
    fn test_merge_outcomes_partial_failure_returns_union() {
        let a = SourceDescriptor::new("https://a.example");
        let b = SourceDescriptor::new("https://b.example");
        let c = SourceDescriptor::new("https://c.example");

        let outcomes = vec![
            SourceOutcome {
                source: a.clone(),
                result: Ok(vec![item(&a, "one"), item(&a, "two")]),
            },
            SourceOutcome {
                source: b,
                result: Err(FetchError::Timeout {
                    budget: Duration::from_secs(5),
                }),
            },
            SourceOutcome {
                source: c.clone(),
                result: Ok(vec![item(&c, "three")]),
            },
        ];

        let merged = merge_outcomes(outcomes).unwrap();
        let titles: Vec<&str> = merged.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_merge_outcomes_total_failure_is_source_unavailable() {
        let outcomes = vec![
            SourceOutcome {
                source: SourceDescriptor::new("https://a.example"),
                result: Err(FetchError::NoContent),
            },
            SourceOutcome {
                source: SourceDescriptor::new("https://b.example"),
                result: Err(FetchError::Timeout {
                    budget: Duration::from_secs(5),
                }),
            },
        ];

        assert!(matches!(
            merge_outcomes(outcomes),
            Err(PipelineError::SourceUnavailable { attempted: 2 })
        ));
    }

    #[test]
    fn test_merge_outcomes_no_sources_is_empty_success() {
        assert!(merge_outcomes(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_filter_by_age_drops_old_keeps_undated() {
        let source = SourceDescriptor::new("https://a.example");
        let mut fresh = item(&source, "fresh");
        fresh.published = Some(Utc::now().to_rfc3339());
        let mut stale = item(&source, "stale");
        stale.published = Some((Utc::now() - chrono::Duration::days(30)).to_rfc3339());
        let undated = item(&source, "undated");

        let kept = filter_by_age(vec![fresh, stale, undated], Some(2));
        let titles: Vec<&str> = kept.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["fresh", "undated"]);
    }

    #[test]
    fn test_filter_by_age_disabled_keeps_everything() {
        let source = SourceDescriptor::new("https://a.example");
        let mut stale = item(&source, "stale");
        stale.published = Some((Utc::now() - chrono::Duration::days(365)).to_rfc3339());

        assert_eq!(filter_by_age(vec![stale], None).len(), 1);
    }
}
