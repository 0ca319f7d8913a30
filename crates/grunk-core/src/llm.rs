use std::time::Instant;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Config for an Ollama-style `POST /api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Full endpoint URL, e.g. `http://127.0.0.1:11434/api/generate`.
    pub endpoint: String,
    pub model: String,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Thin non-streaming client over the generate endpoint. One instance per
/// episode; the underlying `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let request = OllamaRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let started = Instant::now();
        let res = self
            .http
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .context("ollama request failed")?
            .error_for_status()
            .context("ollama non-2xx response")?
            .json::<OllamaResponse>()
            .await
            .context("ollama response decode failed")?;
        tracing::debug!(
            target: "llm",
            "llm.generate model={} prompt_len={} reply_len={} elapsed_ms={}",
            self.config.model,
            prompt.len(),
            res.response.len(),
            started.elapsed().as_millis()
        );

        Ok(res.response)
    }
}
