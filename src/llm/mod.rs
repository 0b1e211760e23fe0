//! Generation collaborator — prompt in, raw text out.
//!
//! The trait is the seam the classifier depends on; `GeminiClient` is the
//! production implementation. Raw output carries no format guarantee, so
//! callers must tolerate markdown fences and surrounding prose.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::LlmError;

/// Text generation service.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}
