//! Pipeline stages and their results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A step of the fixed query pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Language model turns the raw question into a research plan
    Analyze,
    /// Local and web retrieval plus fusion
    Retrieve,
    /// Language model writes the answer from the plan and the evidence
    Synthesize,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Analyze, Stage::Retrieve, Stage::Synthesize];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyze => "ANALYZE",
            Self::Retrieve => "RETRIEVE",
            Self::Synthesize => "SYNTHESIZE",
        }
    }

    /// Whether the stage is a language model call
    pub fn is_reasoning(&self) -> bool {
        !matches!(self, Self::Retrieve)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub stage: Stage,
    /// Text produced; empty for failed stages and for retrieval
    pub output: String,
    /// Wall-clock time across all attempts
    pub duration: Duration,
    pub success: bool,
    pub attempts: u32,
}

impl StageResult {
    pub fn succeeded(stage: Stage, output: String, duration: Duration, attempts: u32) -> Self {
        Self {
            stage,
            output,
            duration,
            success: true,
            attempts,
        }
    }

    pub fn failed(stage: Stage, duration: Duration, attempts: u32) -> Self {
        Self {
            stage,
            output: String::new(),
            duration,
            success: false,
            attempts,
        }
    }
}

/// A reasoning stage attempt failed
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StageError {
    #[error("stage {stage} exceeded its {budget:?} budget")]
    Timeout { stage: Stage, budget: Duration },
    #[error("stage {stage} failed: {message}")]
    Execution { stage: Stage, message: String },
}

impl StageError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Timeout { stage, .. } | Self::Execution { stage, .. } => *stage,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
