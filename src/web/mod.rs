//! Web server module
//!
//! Provides the JSON HTTP API for RDR2-Agent.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use handlers::{QueryRequest, QueryResponse};
pub use routes::{create_router, PROCESS_TIME_HEADER};
pub use state::AppState;
