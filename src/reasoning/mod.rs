//! Reasoning stages
//!
//! The language model sits behind [`Reasoner`]; prompts and answer cleanup live here too.

mod cleaner;
mod gemini;
mod prompts;
mod traits;

pub use cleaner::{clean_response, EMPTY_ANSWER};
pub use gemini::GeminiReasoner;
pub use prompts::{analysis_prompt, synthesis_prompt};
pub use traits::{Reasoner, ReasoningError};
