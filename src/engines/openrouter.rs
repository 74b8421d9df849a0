//! Note merging through the OpenRouter chat-completions API.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::NoteMerger;
use crate::config::OpenRouterConfig;
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenRouterMerger {
    client: reqwest::Client,
    config: OpenRouterConfig,
    api_key: String,
}

impl OpenRouterMerger {
    /// Reads the API key from the configured environment variable.
    pub fn from_env(config: OpenRouterConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            anyhow::anyhow!("missing env var: {} (set it in \".env\")", config.api_key_env)
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            config,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl NoteMerger for OpenRouterMerger {
    async fn merge(
        &self,
        primary: &str,
        secondary: &str,
        instructions: &str,
    ) -> PipelineResult<String> {
        let user_message = format!(
            "PDF CONTENT (AUTHORITATIVE SOURCE):\n{primary}\n\n---\n\n\
             LECTURE TRANSCRIPT (SECONDARY SOURCE):\n{secondary}\n\n---\n\n\
             Generate structured academic notes following the PDF structure, \
             enhanced only where the lecture explicitly adds value."
        );

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: instructions.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
        };

        info!("Requesting note merge from model {}", self.config.model);

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::MergeFailed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::MergeFailed(format!(
                "API error: {status} - {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::MergeFailed(format!("unparseable response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PipelineError::MergeFailed("no content in response".to_string()))
    }
}
