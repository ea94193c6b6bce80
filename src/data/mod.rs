//! Core data models for the news aggregation core
//!
//! This module contains the types shared across the aggregator, cache and
//! refresh scheduler: articles as the upstream provider ships them, the fixed
//! category enumeration, and subscriber preference snapshots.

pub mod news;

pub use news::{FetchNews, NewsClient, NewsError, NewsQuery};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A news topic from the provider's fixed enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
}

impl Category {
    /// Every category the provider accepts
    pub const ALL: [Category; 7] = [
        Category::Business,
        Category::Entertainment,
        Category::General,
        Category::Health,
        Category::Science,
        Category::Sports,
        Category::Technology,
    ];

    /// The provider's wire name for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::General => "general",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Technology => "technology",
        }
    }

    /// Parses a provider category name
    ///
    /// # Returns
    /// * `Some(Category)` if the string names a known category
    /// * `None` otherwise
    pub fn from_str(s: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The publisher an article came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    /// Provider-assigned source identifier, used for preference filtering
    #[serde(default)]
    pub id: Option<String>,
    /// Human-readable publisher name
    pub name: String,
}

/// A single article as returned by the upstream provider
///
/// The core treats articles as opaque payloads apart from `source.id`
/// (preference filtering) and `url` (the identity key collaborators use for
/// read/favorite bookkeeping).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: ArticleSource,
    #[serde(default)]
    pub author: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: Option<String>,
}

/// A subscriber's news preferences
///
/// Treated as an immutable snapshot for the duration of one fetch. Category
/// order is preserved because it fixes the order of merged results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Preferences {
    /// True when neither categories nor sources are set
    ///
    /// An empty preference set produces an empty fetch plan, not an error.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.sources.is_empty()
    }
}

/// One subscriber's preference snapshot as the directory hands it out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberPreferences {
    pub subscriber_id: String,
    #[serde(flatten)]
    pub preferences: Preferences,
}
