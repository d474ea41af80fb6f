//! Retrieval adapters
//!
//! Local similarity search over the knowledge index and ranked web snippet search. The index
//! and the web provider sit behind traits so they can be swapped in tests.

mod scorer;
mod serper;
mod traits;
mod vector;
mod web;

pub use scorer::SimilarityScorer;
pub use serper::Serper;
pub use traits::*;
pub use vector::HttpVectorIndex;
pub use web::{HttpSearchProvider, UnconfiguredProvider, WebRetriever};
