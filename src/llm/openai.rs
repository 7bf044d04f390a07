//! OpenAI-compatible chat completions transport.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::ModelConfig;

use super::{LanguageModel, ModelError};

/// HTTP client for any OpenAI-compatible `/chat/completions` endpoint
/// (OpenRouter, DeepSeek, a local server).
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .user_agent("react-agent/0.1")
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatClient {
    async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);

        // Temperature 0 keeps the loop deterministic; the stop sequence keeps
        // the model from inventing its own Observation lines.
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0,
            "stop": ["Observation:"],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ModelError::Transport(format!(
                "HTTP {}: {}",
                status,
                detail.chars().take(500).collect::<String>()
            )));
        }

        let payload: Value = response.json().await?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ModelError::Empty)?;

        Ok(content.to_string())
    }
}
