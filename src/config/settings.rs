//! Settings structures for RDR2-Agent configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub pipeline: PipelineSettings,
    pub knowledge: KnowledgeSettings,
    pub web: WebSearchSettings,
    pub reasoning: ReasoningSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge overrides from an arbitrary variable source
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("RDR2_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("RDR2_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("RDR2_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("RDR2_KNOWLEDGE_PATH") {
            self.knowledge.path = val;
        }
        if let Some(val) = var("RDR2_VECTOR_SERVICE_URL") {
            self.knowledge.vector_service_url = Some(val);
        }
        if let Some(val) = var("SERPER_API_KEY") {
            self.web.api_key = Some(val);
        }
        if let Some(val) = var("GEMINI_API_KEY") {
            self.reasoning.api_key = Some(val);
        }
        if let Some(val) = var("RDR2_LLM_MODEL") {
            self.reasoning.model = val;
        }
    }

    /// Reject policy values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        if self.server.max_query_length == 0 {
            bail!("server.max_query_length must be greater than zero");
        }
        if self.server.rate_limit_per_minute == 0 {
            bail!("server.rate_limit_per_minute must be greater than zero");
        }
        Ok(())
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the API
    pub instance_name: String,
    /// Game the assistant answers questions about
    pub domain: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "RDR2 Agent".to_string(),
            domain: "Red Dead Redemption 2".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
    /// Longest accepted question, in characters
    pub max_query_length: usize,
    /// Accepted queries per minute across the instance
    pub rate_limit_per_minute: u32,
    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
            max_query_length: crate::DEFAULT_MAX_QUERY_LENGTH,
            rate_limit_per_minute: 60,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Outgoing HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Transport timeout for a single request in seconds
    pub request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 30.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Routing, fusion and timeout policy for one query.
///
/// Durations are expressed in seconds so they read naturally in YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Best local distance at or below which local knowledge is trusted alone
    pub similarity_threshold: f64,
    /// Cap on fused evidence items
    pub max_evidence: usize,
    /// Candidates requested from the similarity search
    pub local_top_k: usize,
    /// Snippets requested from the web search
    pub web_max_results: usize,
    /// Budget for one attempt of a reasoning stage
    pub stage_timeout: f64,
    /// Budget for one retrieval adapter call
    pub retrieval_timeout: f64,
    /// Budget for the whole query
    pub overall_deadline: f64,
    /// Extra attempts granted to a failed reasoning stage
    pub retry_count: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: crate::DEFAULT_SIMILARITY_THRESHOLD,
            max_evidence: crate::DEFAULT_MAX_EVIDENCE,
            local_top_k: 5,
            web_max_results: 5,
            stage_timeout: 10.0,
            retrieval_timeout: 5.0,
            overall_deadline: 50.0,
            retry_count: 1,
        }
    }
}

impl PipelineSettings {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.stage_timeout)
    }

    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.retrieval_timeout)
    }

    pub fn overall_deadline(&self) -> Duration {
        Duration::from_secs_f64(self.overall_deadline)
    }

    /// Two retrieval calls plus every attempt of both reasoning stages
    pub fn worst_case_secs(&self) -> f64 {
        let attempts = f64::from(self.retry_count + 1);
        2.0 * self.retrieval_timeout + 2.0 * attempts * self.stage_timeout
    }

    pub fn validate(&self) -> Result<()> {
        if !self.similarity_threshold.is_finite() || self.similarity_threshold < 0.0 {
            bail!("pipeline.similarity_threshold must be a non-negative number");
        }
        if self.max_evidence == 0 {
            bail!("pipeline.max_evidence must be greater than zero");
        }
        if self.local_top_k == 0 || self.web_max_results == 0 {
            bail!("pipeline.local_top_k and pipeline.web_max_results must be greater than zero");
        }
        for (name, secs) in [
            ("stage_timeout", self.stage_timeout),
            ("retrieval_timeout", self.retrieval_timeout),
            ("overall_deadline", self.overall_deadline),
        ] {
            if !secs.is_finite() || secs <= 0.0 {
                bail!("pipeline.{} must be a positive number of seconds", name);
            }
        }

        let worst_case = self.worst_case_secs();
        if worst_case > self.overall_deadline {
            bail!(
                "pipeline.overall_deadline ({}s) is shorter than the worst case of every stage \
                 using its full budget ({}s)",
                self.overall_deadline,
                worst_case
            );
        }
        Ok(())
    }
}

/// Curated knowledge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    /// Directory holding the curated `.txt` files
    pub path: String,
    /// External nearest-neighbour service; the in-process index is used when unset
    pub vector_service_url: Option<String>,
    /// Blocks shorter than this are dropped at load time
    pub min_block_chars: usize,
    /// Candidates farther than this are never returned
    pub max_distance: Option<f64>,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            path: "info".to_string(),
            vector_service_url: None,
            min_block_chars: 20,
            max_distance: None,
        }
    }
}

/// Web search provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchSettings {
    /// Search endpoint
    pub endpoint: String,
    /// API key; web search is disabled without one
    pub api_key: Option<String>,
    /// Results linking to these domains are dropped
    pub excluded_domains: Vec<String>,
    /// Prepended to every web query; defaults to the general domain when unset
    pub query_prefix: Option<String>,
    /// Replace the top hit's snippet with the text of its page
    pub scrape_top_result: bool,
    /// Page scraping endpoint
    pub scrape_endpoint: String,
    /// Scraped text is cut to this many characters
    pub scrape_max_chars: usize,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://google.serper.dev/search".to_string(),
            api_key: None,
            excluded_domains: vec![
                "reddit.com".to_string(),
                "quora.com".to_string(),
                "youtube.com".to_string(),
                "steamcommunity.com".to_string(),
            ],
            query_prefix: None,
            scrape_top_result: false,
            scrape_endpoint: "https://scrape.serper.dev".to_string(),
            scrape_max_chars: 4000,
        }
    }
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningSettings {
    /// API base URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// API key
    pub api_key: Option<String>,
    /// Sampling temperature
    pub temperature: f64,
}

impl Default for ReasoningSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            temperature: 0.0,
        }
    }
}
