use anyhow::Result;
use async_trait::async_trait;

mod ollama;
pub use ollama::OllamaClient;

/// Advisory text-completion collaborator. Potentially slow; callers are
/// responsible for bounding the wait.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
