//! HTTP request handlers

use super::error::ApiError;
use super::state::AppState;
use crate::evidence::Provenance;
use crate::orchestrator::{QueryResult, QueryStatus, StageTiming};
use crate::query::Query;
use crate::routing::RoutingDecision;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /query`
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The question
    #[serde(alias = "question")]
    pub text: String,
    /// Caller correlation id
    #[serde(default, alias = "session_id")]
    pub request_id: Option<String>,
}

/// Answer returned by `POST /query`
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub request_id: String,
    pub answer: String,
    pub sources: Vec<Provenance>,
    pub status: QueryStatus,
    /// Seconds
    pub response_time: f64,
    pub per_stage_timings: Vec<StageTiming>,
    pub routing: Option<RoutingDecision>,
    pub evidence_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<QueryResult> for QueryResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            request_id: result.request_id,
            answer: result.answer,
            sources: result.sources,
            status: result.status,
            response_time: result.elapsed.as_secs_f64(),
            per_stage_timings: result.stage_timings,
            routing: result.routing,
            evidence_count: result.evidence_count,
            error: result.error,
            timestamp: result.completed_at,
        }
    }
}

/// Service info
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.instance_name(),
        "domain": state.settings.general.domain,
        "version": crate::VERSION,
        "endpoints": ["POST /query", "GET /health", "GET /status", "GET /stats"],
    }))
}

/// Answer a question
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if !state.try_acquire() {
        tracing::warn!("Rate limit exceeded, rejecting query");
        return Err(ApiError::RateLimitExceeded);
    }

    let query = Query::new(
        &request.text,
        request.request_id,
        state.settings.server.max_query_length,
    )?;

    let result = state.orchestrator.run(query).await;
    Ok(Json(QueryResponse::from(result)))
}

/// Collaborator configuration and corpus size
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let orchestrator = &state.orchestrator;
    let documents = orchestrator.scorer().document_count().await;

    Json(serde_json::json!({
        "instance_name": state.instance_name(),
        "version": crate::VERSION,
        "uptime_seconds": state.uptime_seconds(),
        "knowledge": {
            "index": orchestrator.scorer().index_name(),
            "documents": documents,
        },
        "web": {
            "provider": orchestrator.web().provider_name(),
            "configured": orchestrator.web().is_configured(),
        },
        "reasoning": {
            "provider": orchestrator.reasoner().name(),
            "model": orchestrator.reasoner().model(),
        },
        "pipeline": orchestrator.policy(),
    }))
}

/// Query, stage and source metrics
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.metrics().snapshot())
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
