//! Curated knowledge
//!
//! Loads the `.txt` corpus and serves it through an in-process index when no external vector
//! service is configured.

mod corpus;
mod memory;

pub use corpus::{Corpus, Document, BLOCK_SEPARATOR};
pub use memory::{MemoryIndex, MAX_DISTANCE};
