pub mod gemini;
pub mod prompt_builder;
mod prompts;

use crate::error::GenerationError;

/// Trait for talking to an LLM (real backend).
pub trait LlmClient {
    /// Turn a fully built prompt into one proposed commit message.
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
