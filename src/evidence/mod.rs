//! Evidence types
//!
//! Defines the retrieved facts that flow from the retrieval adapters through fusion into the
//! synthesis stage, along with the provenance references reported to callers.

mod set;
mod types;

pub use set::EvidenceSet;
pub use types::*;
