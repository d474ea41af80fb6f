//! Query routing
//!
//! Chooses which retrieval sources to consult based on how confident the local knowledge is.

mod classifier;

pub use classifier::{QueryClassifier, Route, RoutingDecision};
