//! News aggregator
//!
//! Serves a subscriber's merged article list: cache-first, with a concurrent
//! fan-out to the upstream provider on a miss. One failing upstream query
//! fails the whole aggregation; a partial, silently-incomplete article set is
//! worse than a clear failure.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::data::{Article, FetchNews, NewsError, NewsQuery, Preferences};
use crate::directory::SubscriberDirectory;

/// The provider's free tier serves a single page per query.
const FIRST_PAGE: u32 = 1;

/// Result of [`NewsAggregator::get_articles`]
#[derive(Debug, Clone)]
pub struct FetchedArticles {
    pub articles: Vec<Article>,
    /// Whether the list came from the cache rather than a fresh fan-out
    pub from_cache: bool,
}

/// Errors surfaced by the aggregator's entry points
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// The directory does not know this subscriber
    #[error("subscriber '{0}' does not exist")]
    SubscriberNotFound(String),

    /// An upstream query failed; the whole aggregation fails with it
    #[error(transparent)]
    Upstream(#[from] NewsError),
}

/// Cache key for a subscriber's merged article list
///
/// One key per subscriber; the request path and the refresh sweep must agree
/// on this scheme so the cache stays bounded by subscriber count.
pub fn cache_key(subscriber_id: &str) -> String {
    format!("news-{subscriber_id}")
}

/// Fans out upstream queries per subscriber preferences, merges and filters
/// the results, and keeps the cache store populated
pub struct NewsAggregator {
    cache: Arc<TtlCache<Vec<Article>>>,
    client: Arc<dyn FetchNews>,
    directory: Arc<dyn SubscriberDirectory>,
    page_size: u32,
    cache_ttl_secs: u64,
}

impl NewsAggregator {
    pub fn new(
        cache: Arc<TtlCache<Vec<Article>>>,
        client: Arc<dyn FetchNews>,
        directory: Arc<dyn SubscriberDirectory>,
        config: &Config,
    ) -> Self {
        Self {
            cache,
            client,
            directory,
            page_size: config.page_size,
            cache_ttl_secs: config.cache_ttl_secs,
        }
    }

    /// Returns a subscriber's articles, from cache when fresh
    ///
    /// An empty cached list counts as a miss: empty results usually mean a
    /// transient upstream condition, and holding them for a full TTL would
    /// suppress retries. The asymmetry is deliberate.
    ///
    /// # Returns
    /// * `Ok(FetchedArticles)` with `from_cache` telling the caller which
    ///   path produced the list
    /// * `Err(AggregatorError::SubscriberNotFound)` for unknown subscribers
    /// * `Err(AggregatorError::Upstream)` when any planned query fails
    pub async fn get_articles(
        &self,
        subscriber_id: &str,
    ) -> Result<FetchedArticles, AggregatorError> {
        if let Some(articles) = self.cache.get(&cache_key(subscriber_id)) {
            if !articles.is_empty() {
                return Ok(FetchedArticles {
                    articles,
                    from_cache: true,
                });
            }
        }

        let preferences = self
            .directory
            .get_preferences(subscriber_id)
            .await
            .ok_or_else(|| AggregatorError::SubscriberNotFound(subscriber_id.to_string()))?;

        let articles = self.fetch_and_cache(subscriber_id, &preferences).await?;
        Ok(FetchedArticles {
            articles,
            from_cache: false,
        })
    }

    /// Miss-path fetch: fan out the plan, merge, filter, store
    ///
    /// The refresh sweep calls this directly, bypassing the cache-hit
    /// short-circuit, since its purpose is to refresh regardless of
    /// freshness. The cache entry is only written on success; a failed
    /// fan-out leaves the prior entry (or absence) untouched.
    pub async fn fetch_and_cache(
        &self,
        subscriber_id: &str,
        preferences: &Preferences,
    ) -> Result<Vec<Article>, NewsError> {
        let plan = self.build_fetch_plan(preferences);
        let batches = try_join_all(plan.into_iter().map(|query| self.run_query(query))).await?;
        let mut articles: Vec<Article> = batches.into_iter().flatten().collect();

        if !preferences.sources.is_empty() {
            let wanted: HashSet<&str> = preferences.sources.iter().map(String::as_str).collect();
            articles.retain(|article| {
                article
                    .source
                    .id
                    .as_deref()
                    .is_some_and(|id| wanted.contains(id))
            });
        }

        self.cache
            .set(&cache_key(subscriber_id), articles.clone(), self.cache_ttl_secs);
        Ok(articles)
    }

    /// Searches headlines by keyword, bypassing the cache
    ///
    /// Search results are not preference-scoped and are not bound to any
    /// stable key a refresh sweep could re-warm, so they are never cached.
    pub async fn search_articles(
        &self,
        subscriber_id: &str,
        keyword: &str,
    ) -> Result<Vec<Article>, AggregatorError> {
        if self.directory.get_preferences(subscriber_id).await.is_none() {
            return Err(AggregatorError::SubscriberNotFound(
                subscriber_id.to_string(),
            ));
        }
        Ok(self.client.search(keyword).await?)
    }

    /// Drops a subscriber's cache entry, e.g. after a preference change
    pub fn invalidate(&self, subscriber_id: &str) {
        self.cache.invalidate(&cache_key(subscriber_id));
    }

    /// The upstream queries needed for one preference snapshot
    ///
    /// One query per category in preference order, then one combined query
    /// naming every source. The provider cannot filter by category and
    /// source in the same call. Empty preferences produce an empty plan.
    fn build_fetch_plan(&self, preferences: &Preferences) -> Vec<NewsQuery> {
        let mut plan = Vec::with_capacity(preferences.categories.len() + 1);
        for category in &preferences.categories {
            plan.push(NewsQuery::Category {
                category: *category,
                page: FIRST_PAGE,
                page_size: self.page_size,
            });
        }
        if !preferences.sources.is_empty() {
            plan.push(NewsQuery::Sources {
                sources: preferences.sources.clone(),
                page: FIRST_PAGE,
                page_size: self.page_size,
            });
        }
        plan
    }

    async fn run_query(&self, query: NewsQuery) -> Result<Vec<Article>, NewsError> {
        match query {
            NewsQuery::Category {
                category,
                page,
                page_size,
            } => self.client.fetch_by_category(category, page, page_size).await,
            NewsQuery::Sources {
                sources,
                page,
                page_size,
            } => self.client.fetch_by_sources(sources, page, page_size).await,
            NewsQuery::Keyword { keyword } => self.client.search(&keyword).await,
        }
    }
}
