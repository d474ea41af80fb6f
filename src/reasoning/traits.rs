//! Reasoning collaborator trait

use crate::pipeline::Stage;
use async_trait::async_trait;
use thiserror::Error;

/// The language model service failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReasoningError {
    #[error("request timed out")]
    Timeout,
    #[error("quota exhausted or rate limited")]
    Quota,
    #[error("credentials rejected")]
    Auth,
    #[error("network error: {0}")]
    Network(String),
    #[error("model error: {0}")]
    Provider(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ReasoningError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Completes one reasoning step.
///
/// Output is not assumed to be repeatable across calls.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Model identifier
    fn model(&self) -> &str;

    /// Complete `prompt` for `stage`
    async fn complete(&self, stage: Stage, prompt: &str) -> Result<String, ReasoningError>;
}
