//! RDR2-Agent: hybrid retrieval question answering for Red Dead Redemption 2
//!
//! Each question is analyzed by a language model, answered from a curated knowledge index when
//! the local match is confident, supplemented by web search when it is not, and written up from
//! the fused evidence with source references.

pub mod config;
pub mod evidence;
pub mod fusion;
pub mod knowledge;
pub mod metrics;
pub mod network;
pub mod orchestrator;
pub mod pipeline;
pub mod query;
pub mod reasoning;
pub mod retrieval;
pub mod routing;
pub mod web;

pub use config::Settings;
pub use evidence::{EvidenceItem, EvidenceSet};
pub use orchestrator::{Orchestrator, QueryResult, QueryStatus};
pub use query::Query;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Best local distance at or below which local knowledge is trusted alone
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 2.2;

/// Default cap on fused evidence items
pub const DEFAULT_MAX_EVIDENCE: usize = 10;

/// Default limit on question length, in characters
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 1000;
