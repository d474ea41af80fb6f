//! Per-query pipeline state machine

use super::stage::{Stage, StageResult};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Lifecycle of one query's pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Pending,
    Analyzing,
    Retrieving,
    Synthesizing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The state entered when `stage` starts
    pub fn running(stage: Stage) -> Self {
        match stage {
            Stage::Analyze => Self::Analyzing,
            Stage::Retrieve => Self::Retrieving,
            Stage::Synthesize => Self::Synthesizing,
        }
    }

    /// Whether `self -> next` is allowed.
    ///
    /// Stages run strictly in order with no re-entry; any non-terminal state may fail.
    pub fn can_transition_to(self, next: Self) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Pending, Analyzing)
            | (Analyzing, Retrieving)
            | (Retrieving, Synthesizing)
            | (Synthesizing, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "PENDING",
            Self::Analyzing => "ANALYZING",
            Self::Retrieving => "RETRIEVING",
            Self::Synthesizing => "SYNTHESIZING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("invalid pipeline transition {from} -> {to}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },
}

/// State and stage history of one query, owned by that query's run
#[derive(Debug, Clone)]
pub struct Pipeline {
    state: PipelineState,
    results: Vec<StageResult>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Pending,
            results: Vec::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn transition(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("Pipeline {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Enter the running state for `stage`
    pub fn begin(&mut self, stage: Stage) -> Result<(), PipelineError> {
        self.transition(PipelineState::running(stage))
    }

    /// Move to FAILED unless already terminal
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = PipelineState::Failed;
        }
    }

    pub fn record(&mut self, result: StageResult) {
        self.results.push(result);
    }

    pub fn stage_results(&self) -> &[StageResult] {
        &self.results
    }

    pub fn into_stage_results(self) -> Vec<StageResult> {
        self.results
    }
}
