//! Upstream headlines provider client
//!
//! This module issues the individual queries a fetch plan is made of against
//! the provider's `top-headlines` endpoint and parses the JSON envelope into
//! [`Article`] values.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::{Article, Category};
use crate::config::Config;

/// The parameters of one upstream call
///
/// The provider rejects requests that combine a category filter with a source
/// filter, so a subscriber's fetch plan is built from the first two call
/// kinds; keyword search is its own uncached call.
#[derive(Debug, Clone, PartialEq)]
pub enum NewsQuery {
    Category {
        category: Category,
        page: u32,
        page_size: u32,
    },
    Sources {
        sources: Vec<String>,
        page: u32,
        page_size: u32,
    },
    Keyword {
        keyword: String,
    },
}

impl fmt::Display for NewsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewsQuery::Category {
                category,
                page,
                page_size,
            } => write!(f, "category={category} page={page} pageSize={page_size}"),
            NewsQuery::Sources {
                sources,
                page,
                page_size,
            } => write!(
                f,
                "sources={} page={page} pageSize={page_size}",
                sources.join(",")
            ),
            NewsQuery::Keyword { keyword } => write!(f, "q={keyword}"),
        }
    }
}

/// Errors that can occur while fetching from the upstream provider
///
/// Every variant carries the failing query's parameters. Timed-out requests
/// surface as `Request` like any other transport failure.
#[derive(Debug, Error)]
pub enum NewsError {
    /// The HTTP request could not be completed
    #[error("upstream request failed for {query}: {source}")]
    Request {
        query: NewsQuery,
        source: reqwest::Error,
    },

    /// The provider answered with a non-2xx status
    #[error("upstream returned {status} for {query}")]
    Status { query: NewsQuery, status: StatusCode },

    /// The response body did not match the expected envelope
    #[error("malformed upstream payload for {query}: {source}")]
    Malformed {
        query: NewsQuery,
        source: serde_json::Error,
    },
}

/// Issues upstream headline queries
///
/// The seam between the aggregator and the network; tests substitute
/// recording fakes, production wires a [`NewsClient`].
#[async_trait]
pub trait FetchNews: Send + Sync {
    /// One query filtered to a single category
    async fn fetch_by_category(
        &self,
        category: Category,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Article>, NewsError>;

    /// One combined query listing every named source
    async fn fetch_by_sources(
        &self,
        sources: Vec<String>,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Article>, NewsError>;

    /// One keyword query, unscoped by preferences
    async fn search(&self, keyword: &str) -> Result<Vec<Article>, NewsError>;
}

/// Envelope returned by the provider's top-headlines endpoint
#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    articles: Vec<Article>,
}

/// HTTP client for the upstream headlines provider
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsClient {
    /// Creates a client with the configured base URL, API key and a bounded
    /// per-request timeout
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a client over a caller-supplied `reqwest::Client`
    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Runs one query against `{base}/top-headlines` and parses the envelope
    async fn get_headlines(&self, query: NewsQuery) -> Result<Vec<Article>, NewsError> {
        let url = format!("{}/top-headlines", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())]);

        match &query {
            NewsQuery::Category {
                category,
                page,
                page_size,
            } => {
                request = request.query(&[
                    ("category", category.as_str().to_string()),
                    ("page", page.to_string()),
                    ("pageSize", page_size.to_string()),
                ]);
            }
            NewsQuery::Sources {
                sources,
                page,
                page_size,
            } => {
                request = request.query(&[
                    ("sources", sources.join(",")),
                    ("page", page.to_string()),
                    ("pageSize", page_size.to_string()),
                ]);
            }
            NewsQuery::Keyword { keyword } => {
                request = request.query(&[("q", keyword.as_str())]);
            }
        }

        let response = request.send().await.map_err(|source| NewsError::Request {
            query: query.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsError::Status { query, status });
        }

        let text = response.text().await.map_err(|source| NewsError::Request {
            query: query.clone(),
            source,
        })?;
        let envelope: HeadlinesResponse =
            serde_json::from_str(&text).map_err(|source| NewsError::Malformed { query, source })?;

        Ok(envelope.articles)
    }
}

#[async_trait]
impl FetchNews for NewsClient {
    async fn fetch_by_category(
        &self,
        category: Category,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Article>, NewsError> {
        self.get_headlines(NewsQuery::Category {
            category,
            page,
            page_size,
        })
        .await
    }

    async fn fetch_by_sources(
        &self,
        sources: Vec<String>,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<Article>, NewsError> {
        self.get_headlines(NewsQuery::Sources {
            sources,
            page,
            page_size,
        })
        .await
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Article>, NewsError> {
        self.get_headlines(NewsQuery::Keyword {
            keyword: keyword.to_string(),
        })
        .await
    }
}
