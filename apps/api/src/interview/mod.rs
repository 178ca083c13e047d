// Interview operations: question generation, voice analysis, behavioral analysis.
// All LLM calls go through llm_client; no direct provider calls here.

pub mod analysis;
pub mod behavioral;
pub mod handlers;
pub mod prompts;
pub mod questions;
pub mod voice;
