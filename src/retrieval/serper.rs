//! Serper web search engine
//!
//! Uses the Serper JSON API for Google organic results, optionally replacing the top
//! result's snippet with the page text from Serper's scraping endpoint.

use super::traits::{RetrievalError, SearchEngine, SearchParams, WebHit};
use crate::config::WebSearchSettings;
use crate::network::{ServiceRequest, ServiceResponse};
use serde::Deserialize;
use url::Url;

/// Scraped pages shorter than this are treated as failures
const MIN_PAGE_CHARS: usize = 20;

/// Serper search engine
pub struct Serper {
    endpoint: String,
    api_key: String,
    excluded_domains: Vec<String>,
    query_prefix: Option<String>,
    scrape: Option<Scrape>,
}

struct Scrape {
    endpoint: String,
    max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    text: String,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    snippet: Option<String>,
    position: Option<u32>,
}

impl Serper {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            excluded_domains: Vec::new(),
            query_prefix: None,
            scrape: None,
        }
    }

    /// Build from settings; `None` without an API key
    pub fn from_settings(settings: &WebSearchSettings, default_prefix: &str) -> Option<Self> {
        let api_key = settings.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        let prefix = settings
            .query_prefix
            .clone()
            .unwrap_or_else(|| default_prefix.to_string());

        let engine = Self::new(&settings.endpoint, api_key)
            .with_excluded_domains(settings.excluded_domains.clone())
            .with_query_prefix(prefix);

        Some(if settings.scrape_top_result {
            engine.with_scraping(&settings.scrape_endpoint, settings.scrape_max_chars)
        } else {
            engine
        })
    }

    pub fn with_excluded_domains(mut self, domains: Vec<String>) -> Self {
        self.excluded_domains = domains
            .into_iter()
            .map(|d| d.trim().trim_start_matches('.').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    pub fn with_query_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.query_prefix = if prefix.trim().is_empty() {
            None
        } else {
            Some(prefix.trim().to_string())
        };
        self
    }

    /// Fetch the top result's page text through `endpoint`
    pub fn with_scraping(mut self, endpoint: impl Into<String>, max_chars: usize) -> Self {
        self.scrape = Some(Scrape {
            endpoint: endpoint.into(),
            max_chars: max_chars.max(MIN_PAGE_CHARS),
        });
        self
    }

    /// The query as sent to the provider
    fn scoped_query(&self, query: &str) -> String {
        match &self.query_prefix {
            Some(prefix) if !query.to_lowercase().contains(&prefix.to_lowercase()) => {
                format!("{} {}", prefix, query)
            }
            _ => query.to_string(),
        }
    }

    fn is_excluded(&self, link: &str) -> bool {
        if self.excluded_domains.is_empty() {
            return false;
        }

        match Url::parse(link).ok().and_then(|u| u.host_str().map(str::to_lowercase)) {
            Some(host) => self
                .excluded_domains
                .iter()
                .any(|d| host == *d || host.ends_with(&format!(".{}", d))),
            None => {
                let link = link.to_lowercase();
                self.excluded_domains.iter().any(|d| link.contains(d.as_str()))
            }
        }
    }
}

impl SearchEngine for Serper {
    fn name(&self) -> &str {
        "serper"
    }

    fn request(&self, params: &SearchParams) -> Result<ServiceRequest, RetrievalError> {
        // Ask for extra results so exclusions still leave enough
        let num = (params.max_results * 2).max(10);

        Ok(ServiceRequest::post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(serde_json::json!({
                "q": self.scoped_query(&params.query),
                "num": num,
            })))
    }

    fn response(
        &self,
        response: ServiceResponse,
        params: &SearchParams,
    ) -> Result<Vec<WebHit>, RetrievalError> {
        if !response.is_success() {
            return Err(RetrievalError::from_status(&response));
        }

        let parsed: SerperResponse = serde_json::from_str(&response.text)
            .map_err(|e| RetrievalError::Malformed(e.to_string()))?;

        let hits = parsed
            .organic
            .into_iter()
            .enumerate()
            .filter(|(_, r)| !r.link.is_empty() && !self.is_excluded(&r.link))
            .filter_map(|(i, r)| {
                let snippet = r
                    .snippet
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(r.title);
                if snippet.trim().is_empty() {
                    return None;
                }
                Some(WebHit {
                    snippet: snippet.trim().to_string(),
                    url: r.link,
                    rank: r.position.unwrap_or(i as u32 + 1),
                })
            })
            .take(params.max_results)
            .collect();

        Ok(hits)
    }

    fn page_request(&self, hit: &WebHit) -> Option<ServiceRequest> {
        let scrape = self.scrape.as_ref()?;

        Some(
            ServiceRequest::post(&scrape.endpoint)
                .header("X-API-KEY", &self.api_key)
                .header("Content-Type", "application/json")
                .json(serde_json::json!({ "url": hit.url })),
        )
    }

    fn page_text(&self, response: ServiceResponse) -> Result<String, RetrievalError> {
        if !response.is_success() {
            return Err(RetrievalError::from_status(&response));
        }

        let parsed: ScrapeResponse = serde_json::from_str(&response.text)
            .map_err(|e| RetrievalError::Malformed(e.to_string()))?;

        let text = parsed.text.trim();
        if text.chars().count() < MIN_PAGE_CHARS {
            let reason = parsed
                .message
                .unwrap_or_else(|| "page has no usable text".to_string());
            return Err(RetrievalError::Malformed(reason));
        }

        let max_chars = self.scrape.as_ref().map_or(usize::MAX, |s| s.max_chars);
        Ok(text.chars().take(max_chars).collect())
    }
}
