//! Query intake
//!
//! A [`Query`] is the validated, immutable input to one orchestrator run. Construction is the
//! only place a question can be rejected; everything downstream assumes a non-empty, trimmed
//! string and an identifier that is unique among in-flight requests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Reasons a question is rejected before the pipeline starts
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("question cannot be empty")]
    Empty,
    #[error("question is {length} characters long, the limit is {max}")]
    TooLong { length: usize, max: usize },
}

/// A validated question
#[derive(Debug, Clone, Serialize)]
pub struct Query {
    id: String,
    text: String,
    received_at: DateTime<Utc>,
}

impl Query {
    /// Validate raw input and stamp it with an identifier and arrival time.
    ///
    /// A blank or missing caller identifier is replaced by a fresh UUID.
    pub fn new(
        text: &str,
        request_id: Option<String>,
        max_length: usize,
    ) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::Empty);
        }

        let length = text.chars().count();
        if length > max_length {
            return Err(ValidationError::TooLong {
                length,
                max: max_length,
            });
        }

        let id = request_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            id,
            text: text.to_string(),
            received_at: Utc::now(),
        })
    }

    /// Validate with the default length limit
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        Self::new(text, None, crate::DEFAULT_MAX_QUERY_LENGTH)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}
