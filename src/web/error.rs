//! API error responses

use crate::query::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid question: {0}")]
    Validation(#[from] ValidationError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let body = Json(serde_json::json!({
            "error": code.canonical_reason().unwrap_or("Error"),
            "details": self.to_string(),
        }));
        (code, body).into_response()
    }
}
