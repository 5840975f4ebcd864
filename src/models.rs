//! Data models for news items at each stage of the pipeline.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceDescriptor`]: A feed or site to scrape
//! - [`RawItem`]: Raw scraped item data, as found in a feed or page
//! - [`NormalizedRecord`]: The canonical, source-agnostic representation
//! - [`ClassifiedRecord`]: A normalized record with its assigned [`Category`]
//!
//! Items flow strictly forward: `RawItem` values exist only within one fetch,
//! `NormalizedRecord` values live in the intermediate store between runs, and
//! `ClassifiedRecord` values are immutable once appended to the output store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A feed or site to scrape.
///
/// Descriptors are supplied at pipeline start (built-in defaults plus any
/// caller extras) and carry no identity beyond their URL. A descriptor with
/// a malformed URL is kept in the registry; the fetcher fails on it
/// gracefully instead of rejecting it upfront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Site or feed URL.
    pub url: String,
    /// Optional human-readable source name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SourceDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: None,
        }
    }

    pub fn labeled(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: Some(label.into()),
        }
    }

    /// The explicit label, or the domain name before the TLD as a fallback.
    /// For example: "https://lite.cnn.com/article" -> "cnn".
    pub fn label_or_host(&self) -> String {
        if let Some(label) = &self.label {
            if !label.is_empty() {
                return label.clone();
            }
        }
        if let Ok(parsed) = url::Url::parse(&self.url) {
            if let Some(host) = parsed.host_str() {
                let parts: Vec<&str> = host.split('.').collect();
                if parts.len() >= 2 {
                    return parts[parts.len() - 2].to_string();
                }
                return host.to_string();
            }
        }
        self.url.clone()
    }
}

/// A raw news item as scraped from a feed or article page.
///
/// Exists only within a single fetcher invocation; the normalizer turns it
/// into a [`NormalizedRecord`] or drops it. The `published` field carries the
/// timestamp text exactly as found upstream — parsing into a canonical form
/// happens during normalization.
#[derive(Debug, Clone)]
pub struct RawItem {
    /// The source this item was retrieved from.
    pub source: SourceDescriptor,
    /// Item title, possibly containing markup.
    pub title: String,
    /// Item summary or body excerpt, possibly containing markup.
    pub summary: String,
    /// Item link, possibly relative to the source URL.
    pub link: String,
    /// Publication timestamp text as provided by the source, if any.
    pub published: Option<String>,
}

/// The canonical, source-agnostic representation of one news item.
///
/// Written to the intermediate store as a JSON array; the store is fully
/// overwritten by each scrape so it always reflects only the latest run.
///
/// # Fingerprint
///
/// `content_hash` is a deterministic SHA-256 digest over the canonical title
/// and link (title and summary when the link is absent). Two records with an
/// equal hash are duplicates regardless of which source produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Canonical title with markup stripped and whitespace collapsed.
    pub title: String,
    /// Canonical summary with markup stripped and whitespace collapsed.
    pub summary: String,
    /// Absolute link, resolved against the source URL.
    pub link: String,
    /// Parsed publication time, if the source provided a usable one.
    pub published: Option<DateTime<Utc>>,
    /// Name of the source this record came from.
    pub source_label: String,
    /// Deduplication fingerprint, lowercase hex.
    pub content_hash: String,
}

/// A normalized record plus its assigned category. Immutable once written
/// to the output store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: NormalizedRecord,
    pub category: Category,
}

/// The fixed classification taxonomy.
///
/// Every record is assigned exactly one category; [`Category::Other`] is the
/// total fallback when no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Learning & Skills")]
    LearningSkills,
    #[serde(rename = "Career & Productivity")]
    CareerProductivity,
    #[serde(rename = "Motivation & Mindset")]
    MotivationMindset,
    #[serde(rename = "Tools & Resources")]
    ToolsResources,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::LearningSkills,
        Category::CareerProductivity,
        Category::MotivationMindset,
        Category::ToolsResources,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::LearningSkills => "Learning & Skills",
            Category::CareerProductivity => "Career & Productivity",
            Category::MotivationMindset => "Motivation & Mindset",
            Category::ToolsResources => "Tools & Resources",
            Category::Other => "Other",
        }
    }

    /// Parse a category from its display name. Returns `None` for anything
    /// outside the fixed set.
    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
