//! Evidence fusion
//!
//! Combines the local and web result lists chosen by routing into a single evidence set.

mod engine;

pub use engine::ResultFusionEngine;
