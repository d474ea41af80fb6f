//! Web search adapter and providers

use super::traits::{RetrievalError, SearchEngine, SearchParams, SearchProvider, WebHit};
use crate::evidence::EvidenceItem;
use crate::network::HttpClient;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempts at fetching the top hit's page
const PAGE_ATTEMPTS: u32 = 2;

/// Pause before fetching a page again
const PAGE_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Turns provider hits into web evidence in rank order.
///
/// Provider failures are returned to the caller untouched; whether they are fatal is the
/// orchestrator's decision.
#[derive(Clone)]
pub struct WebRetriever {
    provider: Arc<dyn SearchProvider>,
}

impl WebRetriever {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EvidenceItem>, RetrievalError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let mut hits = self.provider.web_search(query, max_results).await?;
        hits.retain(|hit| !hit.snippet.trim().is_empty());
        hits.sort_by_key(|hit| hit.rank);
        hits.truncate(max_results);

        debug!("Provider {} returned {} snippets", self.provider.name(), hits.len());

        Ok(hits
            .into_iter()
            .map(|hit| EvidenceItem::web(hit.snippet, hit.rank, hit.url))
            .collect())
    }
}

/// Executes a [`SearchEngine`] over HTTP
pub struct HttpSearchProvider<E> {
    client: HttpClient,
    engine: E,
}

impl<E: SearchEngine> HttpSearchProvider<E> {
    pub fn new(client: HttpClient, engine: E) -> Self {
        Self { client, engine }
    }

    /// Full page text for `hit`, or `None` to keep its snippet
    async fn fetch_page(&self, hit: &WebHit) -> Option<String> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = self.engine.page_request(hit)?;

            let outcome = match self.client.execute(request).await {
                Ok(response) => self.engine.page_text(response),
                Err(e) => Err(RetrievalError::from(e)),
            };

            match outcome {
                Ok(text) => {
                    debug!("Fetched {} chars from {}", text.len(), hit.url);
                    return Some(text);
                }
                Err(e) if attempt < PAGE_ATTEMPTS && e.is_transient() => {
                    warn!("Page fetch for {} failed, retrying: {}", hit.url, e);
                    tokio::time::sleep(PAGE_RETRY_DELAY).await;
                }
                Err(e) => {
                    warn!("Keeping the snippet for {}: {}", hit.url, e);
                    return None;
                }
            }
        }
    }
}

#[async_trait]
impl<E: SearchEngine> SearchProvider for HttpSearchProvider<E> {
    fn name(&self) -> &str {
        self.engine.name()
    }

    async fn web_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<WebHit>, RetrievalError> {
        let params = SearchParams::new(query, max_results);
        let request = self.engine.request(&params)?;

        let response = self.client.execute(request).await.map_err(|e| {
            warn!("Request failed for {}: {}", self.engine.name(), e);
            RetrievalError::from(e)
        })?;

        let mut hits = self.engine.response(response, &params)?;
        if let Some(top) = hits.first_mut() {
            if let Some(text) = self.fetch_page(top).await {
                top.snippet = text;
            }
        }

        Ok(hits)
    }
}

/// Stand-in for a web provider that has no credentials; every search fails
pub struct UnconfiguredProvider {
    name: String,
}

impl UnconfiguredProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl SearchProvider for UnconfiguredProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        false
    }

    async fn web_search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<WebHit>, RetrievalError> {
        Err(RetrievalError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::SourceKind;
    use crate::network::{ServiceRequest, ServiceResponse};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedProvider(Vec<WebHit>);

    #[async_trait]
    impl SearchProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn web_search(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> Result<Vec<WebHit>, RetrievalError> {
            Ok(self.0.clone())
        }
    }

    fn hit(snippet: &str, rank: u32) -> WebHit {
        WebHit {
            snippet: snippet.to_string(),
            url: format!("https://example.com/{}", rank),
            rank,
        }
    }

    #[tokio::test]
    async fn test_hits_become_ranked_web_evidence() {
        let retriever = WebRetriever::new(Arc::new(FixedProvider(vec![
            hit("second", 2),
            hit("", 1),
            hit("third", 3),
            hit("fourth", 4),
        ])));

        let items = retriever.search("patch notes", 2).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.source == SourceKind::Web));
        assert_eq!(items[0].content, "second");
        assert_eq!(items[0].score, 2.0);
        assert_eq!(items[1].origin, "https://example.com/3");
    }

    #[tokio::test]
    async fn test_unconfigured_provider_fails() {
        let retriever = WebRetriever::new(Arc::new(UnconfiguredProvider::new("serper")));
        assert!(!retriever.is_configured());
        assert_eq!(
            retriever.search("anything", 3).await.unwrap_err(),
            RetrievalError::NotConfigured
        );
    }

    struct EchoEngine {
        url: String,
    }

    impl SearchEngine for EchoEngine {
        fn name(&self) -> &str {
            "echo"
        }

        fn request(&self, params: &SearchParams) -> Result<ServiceRequest, RetrievalError> {
            Ok(ServiceRequest::post(&self.url).json(serde_json::json!({"q": params.query})))
        }

        fn response(
            &self,
            response: ServiceResponse,
            _params: &SearchParams,
        ) -> Result<Vec<WebHit>, RetrievalError> {
            if !response.is_success() {
                return Err(RetrievalError::from_status(&response));
            }
            Ok(vec![WebHit {
                snippet: response.text,
                url: response.url,
                rank: 1,
            }])
        }
    }

    #[tokio::test]
    async fn test_http_provider_runs_engine() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Valentine stables"))
            .mount(&server)
            .await;

        let provider = HttpSearchProvider::new(
            HttpClient::new().unwrap(),
            EchoEngine {
                url: format!("{}/search", server.uri()),
            },
        );

        let hits = provider.web_search("stables", 3).await.unwrap();
        assert_eq!(hits[0].snippet, "Valentine stables");
        assert_eq!(provider.name(), "echo");
    }

    #[tokio::test]
    async fn test_http_provider_maps_quota_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = HttpSearchProvider::new(
            HttpClient::new().unwrap(),
            EchoEngine {
                url: format!("{}/search", server.uri()),
            },
        );

        assert_eq!(
            provider.web_search("stables", 3).await.unwrap_err(),
            RetrievalError::Quota
        );
    }
}
