//! Final per-query output

use crate::evidence::Provenance;
use crate::pipeline::{Stage, StageResult};
use crate::routing::RoutingDecision;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Overall outcome of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryStatus {
    /// Every selected source answered and evidence was found
    Ok,
    /// A retrieval source failed but some evidence was still obtained
    Partial,
    /// No source produced evidence; the answer says nothing was found
    NoEvidence,
    /// The overall deadline expired
    Timeout,
    /// A reasoning stage failed after its retry
    Failed,
}

impl QueryStatus {
    pub const ALL: [QueryStatus; 5] = [
        QueryStatus::Ok,
        QueryStatus::Partial,
        QueryStatus::NoEvidence,
        QueryStatus::Timeout,
        QueryStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Partial => "PARTIAL",
            Self::NoEvidence => "NO_EVIDENCE",
            Self::Timeout => "TIMEOUT",
            Self::Failed => "FAILED",
        }
    }

    /// Whether an answer was synthesized
    pub fn has_answer(&self) -> bool {
        matches!(self, Self::Ok | Self::Partial | Self::NoEvidence)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing of one finished stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub duration_ms: u64,
    pub success: bool,
    pub attempts: u32,
}

impl From<&StageResult> for StageTiming {
    fn from(result: &StageResult) -> Self {
        Self {
            stage: result.stage,
            duration_ms: result.duration.as_millis() as u64,
            success: result.success,
            attempts: result.attempts,
        }
    }
}

/// The single result produced for every query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub request_id: String,
    /// Empty unless the status carries an answer
    pub answer: String,
    /// Deduplicated references from the evidence that fed synthesis
    pub sources: Vec<Provenance>,
    pub status: QueryStatus,
    /// Absent when the run stopped before retrieval finished
    pub routing: Option<RoutingDecision>,
    pub evidence_count: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub stage_timings: Vec<StageTiming>,
    /// Why the run failed or timed out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl QueryResult {
    pub fn timing(&self, stage: Stage) -> Option<&StageTiming> {
        self.stage_timings.iter().find(|t| t.stage == stage)
    }
}
