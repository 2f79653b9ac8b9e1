//! AI service integration for styling text generation
//!
//! Provides the generation capability boundary and its Gemini-backed
//! implementation.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiChatClient;
pub use mock::MockGenerationClient;

use crate::Result;
use async_trait::async_trait;

/// Opaque text-generation capability: prompt in, generated text out.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
