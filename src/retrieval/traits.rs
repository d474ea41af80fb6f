//! Retrieval collaborator traits and types

use crate::network::{ServiceRequest, ServiceResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A retrieval source failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("request timed out")]
    Timeout,
    #[error("quota exhausted or rate limited")]
    Quota,
    #[error("credentials rejected")]
    Auth,
    #[error("source is not configured")]
    NotConfigured,
    #[error("network error: {0}")]
    Network(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RetrievalError {
    /// Classify a non-successful HTTP response
    pub fn from_status(response: &ServiceResponse) -> Self {
        if response.is_rate_limited() {
            Self::Quota
        } else if response.is_unauthorized() {
            Self::Auth
        } else {
            Self::Provider(format!("HTTP {}", response.status))
        }
    }

    /// Worth another attempt; rejected credentials and exhausted quota are not
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Quota | Self::Auth | Self::NotConfigured)
    }
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// One nearest-neighbour candidate from the knowledge index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub text: String,
    /// Distance to the query, lower is closer
    pub score: f64,
    pub doc_id: String,
}

/// One ranked web snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebHit {
    pub snippet: String,
    pub url: String,
    /// 1-based provider rank
    pub rank: u32,
}

/// Nearest-neighbour search over the curated knowledge corpus.
///
/// Implementations must be deterministic for a fixed corpus and query.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Index name for logs and status
    fn name(&self) -> &str;

    /// Up to `k` candidates; an empty corpus yields an empty list
    async fn nearest_neighbors(&self, query: &str, k: usize)
        -> Result<Vec<Neighbor>, RetrievalError>;

    /// Number of indexed documents, when the index can tell
    async fn document_count(&self) -> Option<usize> {
        None
    }
}

/// Ranked snippet search on the public web
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logs and status
    fn name(&self) -> &str;

    /// Whether the provider has what it needs to serve requests
    fn is_configured(&self) -> bool {
        true
    }

    /// Up to `max_results` snippets in the provider's relevance order
    async fn web_search(&self, query: &str, max_results: usize)
        -> Result<Vec<WebHit>, RetrievalError>;
}

/// Parameters for building a web search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub max_results: usize,
}

impl SearchParams {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
        }
    }
}

/// An HTTP search API described as a request builder and a response parser.
///
/// Executed by [`HttpSearchProvider`](super::HttpSearchProvider).
pub trait SearchEngine: Send + Sync {
    /// Engine name
    fn name(&self) -> &str;

    /// Build the HTTP request for a search
    fn request(&self, params: &SearchParams) -> Result<ServiceRequest, RetrievalError>;

    /// Parse the HTTP response into ranked hits
    fn response(
        &self,
        response: ServiceResponse,
        params: &SearchParams,
    ) -> Result<Vec<WebHit>, RetrievalError>;

    /// Request for the full page behind the top hit; `None` keeps snippets only
    fn page_request(&self, _hit: &WebHit) -> Option<ServiceRequest> {
        None
    }

    /// Usable page text from a page response
    fn page_text(&self, response: ServiceResponse) -> Result<String, RetrievalError> {
        Err(RetrievalError::from_status(&response))
    }
}
