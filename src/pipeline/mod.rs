//! Stage pipeline
//!
//! A fixed ANALYZE -> RETRIEVE -> SYNTHESIZE sequence driven by an explicit state machine.

mod runner;
mod stage;
mod state;

pub use runner::StageRunner;
pub use stage::{Stage, StageError, StageResult};
pub use state::{Pipeline, PipelineError, PipelineState};
