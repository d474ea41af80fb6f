//! Query orchestration
//!
//! Sequences analysis, retrieval and synthesis for one query under per-stage and overall time
//! budgets, and folds every failure into the [`QueryResult`] status.

mod executor;
mod result;

pub use executor::Orchestrator;
pub use result::{QueryResult, QueryStatus, StageTiming};
