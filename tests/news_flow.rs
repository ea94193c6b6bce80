//! End-to-end tests for the aggregation and refresh pipeline
//!
//! Exercises the aggregator, cache store and refresh scheduler together
//! against a recording upstream fake, covering the cache-hit short-circuit,
//! fetch-plan fan-out counts, source filtering and sweep failure isolation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use headliner::aggregator::{cache_key, AggregatorError, NewsAggregator};
use headliner::cache::TtlCache;
use headliner::config::Config;
use headliner::data::{
    Article, ArticleSource, Category, FetchNews, NewsError, NewsQuery, Preferences,
};
use headliner::directory::{MemoryDirectory, SubscriberDirectory};
use headliner::refresh::{self, RefreshConfig, RefreshHandle};

fn article(title: &str, source_id: Option<&str>) -> Article {
    Article {
        source: ArticleSource {
            id: source_id.map(str::to_string),
            name: source_id.unwrap_or("wire").to_uppercase(),
        },
        author: None,
        title: title.to_string(),
        description: None,
        url: format!("https://example.org/{title}"),
        url_to_image: None,
        published_at: None,
        content: None,
    }
}

/// Upstream fake that records every query it receives
struct RecordingClient {
    queries: Mutex<Vec<NewsQuery>>,
    by_category: HashMap<Category, Vec<Article>>,
    by_sources: Vec<Article>,
    fail_category: Option<Category>,
    return_empty: AtomicBool,
}

impl RecordingClient {
    fn new() -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
            by_category: HashMap::new(),
            by_sources: Vec::new(),
            fail_category: None,
            return_empty: AtomicBool::new(false),
        }
    }

    fn with_category(mut self, category: Category, articles: Vec<Article>) -> Self {
        self.by_category.insert(category, articles);
        self
    }

    fn with_sources_response(mut self, articles: Vec<Article>) -> Self {
        self.by_sources = articles;
        self
    }

    fn failing_on(mut self, category: Category) -> Self {
        self.fail_category = Some(category);
        self
    }

    fn recorded(&self) -> Vec<NewsQuery> {
        self.queries.lock().expect("Query log poisoned").clone()
    }

    fn category_query_count(&self) -> usize {
        self.recorded()
            .iter()
            .filter(|q| matches!(q, NewsQuery::Category { .. }))
            .count()
    }

    fn sources_query_count(&self) -> usize {
        self.recorded()
            .iter()
            .filter(|q| matches!(q, NewsQuery::Sources { .. }))
            .count()
    }

    fn record(&self, query: NewsQuery) {
        self.queries.lock().expect("Query log poisoned").push(query);
    }

    fn upstream_error(query: NewsQuery) -> NewsError {
        let parse_failure: Result<serde_json::Value, _> = serde_json::from_str("boom");
        NewsError::Malformed {
            query,
            source: parse_failure.unwrap_err(),
        }
    }
}

#[async_trait]
impl FetchNews for RecordingClient {
    async fn fetch_by_category(
        &self,
        category: Category,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Article>, NewsError> {
        let query = NewsQuery::Category {
            category,
            page,
            page_size,
        };
        self.record(query.clone());
        if self.fail_category == Some(category) {
            return Err(Self::upstream_error(query));
        }
        if self.return_empty.load(Ordering::SeqCst) {
            return Ok(vec![]);
        }
        Ok(self.by_category.get(&category).cloned().unwrap_or_default())
    }

    async fn fetch_by_sources(
        &self,
        sources: Vec<String>,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Article>, NewsError> {
        self.record(NewsQuery::Sources {
            sources,
            page,
            page_size,
        });
        if self.return_empty.load(Ordering::SeqCst) {
            return Ok(vec![]);
        }
        Ok(self.by_sources.clone())
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Article>, NewsError> {
        self.record(NewsQuery::Keyword {
            keyword: keyword.to_string(),
        });
        Ok(vec![article(keyword, None)])
    }
}

fn test_config() -> Config {
    Config::from_lookup(|var| match var {
        "NEWS_API_URL" => Some("https://newsapi.example".to_string()),
        "NEWS_API_SECRET" => Some("k-123".to_string()),
        _ => None,
    })
    .expect("Test config should resolve")
}

struct Pipeline {
    cache: Arc<TtlCache<Vec<Article>>>,
    client: Arc<RecordingClient>,
    directory: Arc<MemoryDirectory>,
    aggregator: Arc<NewsAggregator>,
}

fn pipeline(client: RecordingClient) -> Pipeline {
    let cache = Arc::new(TtlCache::new());
    let client = Arc::new(client);
    let directory = Arc::new(MemoryDirectory::new());
    let aggregator = Arc::new(NewsAggregator::new(
        Arc::clone(&cache),
        Arc::clone(&client) as Arc<dyn FetchNews>,
        Arc::clone(&directory) as Arc<dyn SubscriberDirectory>,
        &test_config(),
    ));
    Pipeline {
        cache,
        client,
        directory,
        aggregator,
    }
}

#[tokio::test]
async fn test_no_preferences_means_no_upstream_calls() {
    let p = pipeline(RecordingClient::new());
    p.directory.insert("u1", Preferences::default());

    let fetched = p.aggregator.get_articles("u1").await.expect("Should succeed");

    assert!(fetched.articles.is_empty());
    assert!(p.client.recorded().is_empty(), "No upstream call expected");
}

#[tokio::test]
async fn test_two_categories_issue_exactly_two_category_queries() {
    let p = pipeline(
        RecordingClient::new()
            .with_category(Category::Business, vec![article("b", None)])
            .with_category(Category::Science, vec![article("s", None)]),
    );
    p.directory.insert(
        "u1",
        Preferences {
            categories: vec![Category::Business, Category::Science],
            sources: vec![],
        },
    );

    p.aggregator.get_articles("u1").await.expect("Should succeed");

    assert_eq!(p.client.category_query_count(), 2);
    assert_eq!(p.client.sources_query_count(), 0);
}

#[tokio::test]
async fn test_sources_issue_exactly_one_combined_query() {
    let p = pipeline(
        RecordingClient::new()
            .with_sources_response(vec![article("s1-story", Some("s1"))]),
    );
    p.directory.insert(
        "u1",
        Preferences {
            categories: vec![],
            sources: vec!["s1".to_string(), "s2".to_string()],
        },
    );

    p.aggregator.get_articles("u1").await.expect("Should succeed");

    let recorded = p.client.recorded();
    assert_eq!(recorded.len(), 1);
    match &recorded[0] {
        NewsQuery::Sources { sources, .. } => {
            assert_eq!(sources.join(","), "s1,s2");
        }
        other => panic!("Expected a sources query, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_call_within_ttl_hits_the_cache() {
    let p = pipeline(
        RecordingClient::new()
            .with_category(Category::Business, vec![article("a", Some("bbc-news"))]),
    );
    p.directory.insert(
        "u1",
        Preferences {
            categories: vec![Category::Business],
            sources: vec![],
        },
    );

    let first = p.aggregator.get_articles("u1").await.expect("Should succeed");
    assert!(!first.from_cache);

    let second = p.aggregator.get_articles("u1").await.expect("Should succeed");
    assert!(second.from_cache);
    assert_eq!(second.articles, first.articles);

    // Exactly one fan-out: the second call must not re-hit the upstream.
    assert_eq!(p.client.category_query_count(), 1);
}

#[tokio::test]
async fn test_empty_upstream_result_is_not_a_cache_hit() {
    let p = pipeline(RecordingClient::new());
    p.client.return_empty.store(true, Ordering::SeqCst);
    p.directory.insert(
        "u1",
        Preferences {
            categories: vec![Category::Business],
            sources: vec![],
        },
    );

    let first = p.aggregator.get_articles("u1").await.expect("Should succeed");
    assert!(first.articles.is_empty());
    assert!(!first.from_cache);

    let second = p.aggregator.get_articles("u1").await.expect("Should succeed");
    assert!(!second.from_cache, "Empty cached lists must re-fetch");
    assert_eq!(p.client.category_query_count(), 2);
}

#[tokio::test]
async fn test_source_filtering_drops_unlisted_sources() {
    let p = pipeline(
        RecordingClient::new()
            .with_category(
                Category::Business,
                vec![article("cnn-story", Some("cnn")), article("bbc-story", Some("bbc"))],
            )
            .with_sources_response(vec![]),
    );
    p.directory.insert(
        "u1",
        Preferences {
            categories: vec![Category::Business],
            sources: vec!["cnn".to_string()],
        },
    );

    let fetched = p.aggregator.get_articles("u1").await.expect("Should succeed");

    assert_eq!(fetched.articles.len(), 1);
    assert_eq!(fetched.articles[0].title, "cnn-story");
}

#[tokio::test]
async fn test_business_subscriber_scenario() {
    // Subscriber u1, categories ["business"], sources []; upstream returns
    // one bbc article. First call fetches, second is served from cache.
    let p = pipeline(
        RecordingClient::new()
            .with_category(Category::Business, vec![article("A", Some("bbc"))]),
    );
    p.directory.insert(
        "u1",
        Preferences {
            categories: vec![Category::Business],
            sources: vec![],
        },
    );

    let first = p.aggregator.get_articles("u1").await.expect("Should succeed");
    assert_eq!(first.articles.len(), 1);
    assert_eq!(first.articles[0].title, "A");
    assert!(!first.from_cache);

    let second = p.aggregator.get_articles("u1").await.expect("Should succeed");
    assert!(second.from_cache);
    assert_eq!(second.articles, first.articles);
}

#[tokio::test]
async fn test_search_is_never_cached() {
    let p = pipeline(RecordingClient::new());
    p.directory.insert("u1", Preferences::default());

    p.aggregator
        .search_articles("u1", "fusion")
        .await
        .expect("Search should succeed");
    p.aggregator
        .search_articles("u1", "fusion")
        .await
        .expect("Search should succeed");

    let keyword_queries = p
        .client
        .recorded()
        .iter()
        .filter(|q| matches!(q, NewsQuery::Keyword { .. }))
        .count();
    assert_eq!(keyword_queries, 2, "Every search goes upstream");
    assert!(p.cache.get(&cache_key("u1")).is_none());
}

#[tokio::test]
async fn test_upstream_failure_surfaces_and_leaves_cache_untouched() {
    let p = pipeline(RecordingClient::new().failing_on(Category::Business));
    p.directory.insert(
        "u1",
        Preferences {
            categories: vec![Category::Business],
            sources: vec![],
        },
    );

    let result = p.aggregator.get_articles("u1").await;
    assert!(matches!(result, Err(AggregatorError::Upstream(_))));
    assert!(p.cache.get(&cache_key("u1")).is_none());
}

#[tokio::test]
async fn test_scheduler_sweep_isolates_failing_subscriber() {
    // u2's upstream category fails; the sweep must still refresh u1 and
    // leave u2's prior entry as it was before the tick.
    let p = pipeline(
        RecordingClient::new()
            .with_category(Category::Business, vec![article("fresh", Some("bbc"))])
            .failing_on(Category::Science),
    );
    p.directory.insert(
        "u1",
        Preferences {
            categories: vec![Category::Business],
            sources: vec![],
        },
    );
    p.directory.insert(
        "u2",
        Preferences {
            categories: vec![Category::Science],
            sources: vec![],
        },
    );
    p.cache
        .set(&cache_key("u2"), vec![article("before-tick", Some("bbc"))], 60);

    refresh::sweep(&p.aggregator, p.directory.as_ref()).await;

    let u1 = p.cache.get(&cache_key("u1")).expect("u1 should be refreshed");
    assert_eq!(u1[0].title, "fresh");
    let u2 = p.cache.get(&cache_key("u2")).expect("u2 entry should survive");
    assert_eq!(u2[0].title, "before-tick");
}

#[tokio::test]
async fn test_spawned_scheduler_warms_caches_and_drains_on_shutdown() {
    let p = pipeline(
        RecordingClient::new()
            .with_category(Category::Business, vec![article("warm", Some("bbc"))]),
    );
    p.directory.insert(
        "u1",
        Preferences {
            categories: vec![Category::Business],
            sources: vec![],
        },
    );

    let handle = RefreshHandle::spawn(
        Arc::clone(&p.aggregator),
        Arc::clone(&p.directory) as Arc<dyn SubscriberDirectory>,
        RefreshConfig {
            period: Duration::from_millis(20),
            enabled: true,
        },
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.shutdown().await;

    let warmed = p.cache.get(&cache_key("u1")).expect("Sweep should warm u1");
    assert_eq!(warmed[0].title, "warm");
}
