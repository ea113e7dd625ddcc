//! LLM API client module
//!
//! Talks to any OpenAI-compatible chat-completions endpoint (OpenRouter by
//! default) to produce the post text.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::core::TextGenerator;
use crate::errors::PostError;
use crate::prompt::SYSTEM_PROMPT;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// LLM API client for generating post text
pub struct LlmClient {
    http: Client,
    api_key: String,
    api_base: String,
    model_name: String,
}

impl LlmClient {
    #[must_use]
    pub fn new(api_key: String, api_base: String, model_name: String) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build LLM HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            http,
            api_key,
            api_base,
            model_name,
        }
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn build_prompt(&self, prompt: &str) -> Vec<ChatCompletionMessage> {
        vec![
            ChatCompletionMessage {
                role: MessageRole::system,
                content: Content::Text(SYSTEM_PROMPT.to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
            ChatCompletionMessage {
                role: MessageRole::user,
                content: Content::Text(prompt.to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
        ]
    }

    /// Serializes the chat into the request body of `/chat/completions`.
    #[must_use]
    pub fn request_body(&self, prompt: &[ChatCompletionMessage]) -> Value {
        let messages: Vec<Value> = prompt
            .iter()
            .filter_map(|msg| {
                let role_str = match msg.role {
                    MessageRole::system => "system",
                    MessageRole::assistant => "assistant",
                    _ => "user",
                };
                match &msg.content {
                    Content::Text(text) => Some(json!({
                        "role": role_str,
                        "content": text,
                    })),
                    _ => None,
                }
            })
            .collect();

        json!({
            "model": self.model_name,
            "messages": messages,
            "stream": false
        })
    }

    fn endpoint(&self) -> Result<Url, PostError> {
        let base = format!("{}/", self.api_base.trim_end_matches('/'));
        Url::parse(&base)
            .and_then(|u| u.join("chat/completions"))
            .map_err(|e| PostError::ConfigError(format!("TEXT_API_BASE {}: {}", self.api_base, e)))
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the API answers with a
    /// non-success status, or the response carries no message text.
    pub async fn generate_post(
        &self,
        prompt: Vec<ChatCompletionMessage>,
    ) -> Result<String, PostError> {
        #[cfg(feature = "debug-logs")]
        info!("Using chat prompt:\n{:?}", prompt);

        let estimated_input_tokens = prompt
            .iter()
            .map(|msg| estimate_tokens(&format!("{:?}", msg.content)))
            .sum::<usize>();

        info!(
            "Requesting post from model {} ({} messages, ~{} input tokens)",
            self.model_name,
            prompt.len(),
            estimated_input_tokens
        );

        let response = self
            .http
            .post(self.endpoint()?)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&prompt))
            .send()
            .await
            .map_err(|e| PostError::HttpError(format!("chat completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PostError::TextGenerationError(format!(
                "status {}: {}",
                status, error_text
            )));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            PostError::TextGenerationError(format!("Failed to parse chat response: {}", e))
        })?;

        extract_message_text(&response_json)
            .ok_or_else(|| PostError::TextGenerationError("No text in response".to_string()))
    }
}

/// Pulls `choices[0].message.content` out of a chat-completions response.
/// Blank content counts as missing.
#[must_use]
pub fn extract_message_text(response: &Value) -> Option<String> {
    response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, PostError> {
        let chat = self.build_prompt(prompt);
        let text = self.generate_post(chat).await?;

        #[cfg(feature = "debug-logs")]
        info!("Generated document:\n{}", text);

        #[cfg(not(feature = "debug-logs"))]
        info!("Generated document of {} characters", text.chars().count());

        Ok(text)
    }
}
