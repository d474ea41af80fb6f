//! Client for an external nearest-neighbour service

use super::traits::{Neighbor, RetrievalError, VectorIndex};
use crate::network::{HttpClient, ServiceRequest};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

/// Vector index served over HTTP.
///
/// `POST {base}/search` with `{"query", "k"}` returns `{"results": [{text, score, doc_id}]}`;
/// `GET {base}/count` returns `{"count": n}`.
pub struct HttpVectorIndex {
    client: HttpClient,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Neighbor>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: usize,
}

impl HttpVectorIndex {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    fn name(&self) -> &str {
        "vector-service"
    }

    async fn nearest_neighbors(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Neighbor>, RetrievalError> {
        let request = ServiceRequest::post(format!("{}/search", self.base_url))
            .json(serde_json::json!({ "query": query, "k": k }));

        let response = self.client.execute(request).await?;
        if !response.is_success() {
            return Err(RetrievalError::from_status(&response));
        }

        let parsed: SearchResponse = serde_json::from_str(&response.text)
            .map_err(|e| RetrievalError::Malformed(e.to_string()))?;
        Ok(parsed.results)
    }

    async fn document_count(&self) -> Option<usize> {
        let request = ServiceRequest::get(format!("{}/count", self.base_url));
        match self.client.execute(request).await {
            Ok(response) if response.is_success() => {
                response.json::<CountResponse>().ok().map(|c| c.count)
            }
            Ok(response) => {
                warn!("Vector service count returned HTTP {}", response.status);
                None
            }
            Err(e) => {
                warn!("Vector service count failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_nearest_neighbors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(serde_json::json!({"query": "gang camp", "k": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {
                        "text": "The gang camps at Horseshoe Overlook.",
                        "score": 1.2,
                        "doc_id": "doc_4"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let index = HttpVectorIndex::new(HttpClient::new().unwrap(), format!("{}/", server.uri()));
        let neighbors = index.nearest_neighbors("gang camp", 3).await.unwrap();

        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].doc_id, "doc_4");
        assert_eq!(neighbors[0].score, 1.2);
    }

    #[tokio::test]
    async fn test_service_errors_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let index = HttpVectorIndex::new(HttpClient::new().unwrap(), server.uri());
        assert_eq!(
            index.nearest_neighbors("q", 3).await.unwrap_err(),
            RetrievalError::Provider("HTTP 500".to_string())
        );
        assert_eq!(index.document_count().await, None);
    }

    #[tokio::test]
    async fn test_document_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/count"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"count": 42})),
            )
            .mount(&server)
            .await;

        let index = HttpVectorIndex::new(HttpClient::new().unwrap(), server.uri());
        assert_eq!(index.document_count().await, Some(42));
    }
}
