use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::llm::LlmClient;

/// Ollama-backed completion client against `/api/generate`.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize, Debug)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(model: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(180)).build()?;

        let base_url =
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string());

        Ok(OllamaClient {
            client,
            base_url,
            model: model.to_string(),
        })
    }

    pub fn with_base_url(model: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(180)).build()?;

        Ok(OllamaClient {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(model = %self.model, "sending advisory prompt");

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("ollama returned {status}: {body}"));
        }

        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response.trim().to_string())
    }
}
