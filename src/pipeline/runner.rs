//! Execution of the language-model-backed stages

use super::stage::{Stage, StageError, StageResult};
use super::state::{Pipeline, PipelineState};
use crate::evidence::EvidenceSet;
use crate::query::Query;
use crate::reasoning::{analysis_prompt, synthesis_prompt, Reasoner};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs ANALYZE and SYNTHESIZE against the reasoner.
///
/// Every attempt gets its own `stage_timeout`, shortened when the caller needs the stage done
/// by a given instant. A stage that times out or errors is retried with the same prompt up to
/// `retry_count` times while time remains, then the pipeline is failed.
#[derive(Clone)]
pub struct StageRunner {
    reasoner: Arc<dyn Reasoner>,
    domain: String,
    stage_timeout: Duration,
    retry_count: u32,
}

impl StageRunner {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        domain: impl Into<String>,
        stage_timeout: Duration,
        retry_count: u32,
    ) -> Self {
        Self {
            reasoner,
            domain: domain.into(),
            stage_timeout,
            retry_count,
        }
    }

    pub fn reasoner(&self) -> &dyn Reasoner {
        self.reasoner.as_ref()
    }

    /// Produce the research plan for `query`, finishing by `until`
    pub async fn analyze(
        &self,
        pipeline: &mut Pipeline,
        query: &Query,
        until: Instant,
    ) -> Result<String, StageError> {
        let prompt = analysis_prompt(&self.domain, query.text());
        self.execute(pipeline, Stage::Analyze, &prompt, Some(until)).await
    }

    /// Write the answer; the pipeline is DONE on success
    pub async fn synthesize(
        &self,
        pipeline: &mut Pipeline,
        query: &Query,
        analysis: &str,
        evidence: &EvidenceSet,
    ) -> Result<String, StageError> {
        let prompt = synthesis_prompt(&self.domain, query.text(), analysis, evidence);
        let answer = self.execute(pipeline, Stage::Synthesize, &prompt, None).await?;

        pipeline
            .transition(PipelineState::Done)
            .map_err(|e| StageError::Execution {
                stage: Stage::Synthesize,
                message: e.to_string(),
            })?;

        Ok(answer)
    }

    /// Budget for the next attempt; zero once `until` has passed
    fn attempt_budget(&self, until: Option<Instant>) -> Duration {
        match until {
            Some(until) => self
                .stage_timeout
                .min(until.saturating_duration_since(Instant::now())),
            None => self.stage_timeout,
        }
    }

    async fn execute(
        &self,
        pipeline: &mut Pipeline,
        stage: Stage,
        prompt: &str,
        until: Option<Instant>,
    ) -> Result<String, StageError> {
        if let Err(e) = pipeline.begin(stage) {
            pipeline.fail();
            return Err(StageError::Execution {
                stage,
                message: e.to_string(),
            });
        }

        let start = Instant::now();
        let max_attempts = self.retry_count + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let budget = self.attempt_budget(until);
            let completion = timeout(budget, self.reasoner.complete(stage, prompt)).await;

            let error = match completion {
                Ok(Ok(text)) if !text.trim().is_empty() => {
                    debug!("Stage {} completed on attempt {}", stage, attempt);
                    pipeline.record(StageResult::succeeded(
                        stage,
                        text.clone(),
                        start.elapsed(),
                        attempt,
                    ));
                    return Ok(text);
                }
                Ok(Ok(_)) => StageError::Execution {
                    stage,
                    message: "empty completion".to_string(),
                },
                Ok(Err(e)) => StageError::Execution {
                    stage,
                    message: e.to_string(),
                },
                Err(_) => StageError::Timeout { stage, budget },
            };

            if attempt >= max_attempts || self.attempt_budget(until).is_zero() {
                warn!("Stage {} failed after {} attempts: {}", stage, attempt, error);
                pipeline.record(StageResult::failed(stage, start.elapsed(), attempt));
                pipeline.fail();
                return Err(error);
            }

            warn!("Stage {} attempt {} failed, retrying: {}", stage, attempt, error);
        }
    }
}
