//! OpenAI chat-completions adapter

use super::retry::RetryPolicy;
use super::{
    CommitMessageProvider, GenerationContext, ModelInfo, classify_http_error,
    classify_transport_error, pricing,
};
use crate::config::Config;
use crate::errors::{ProviderError, QuillError};
use crate::log_debug;
use crate::message::GeneratedMessage;
use crate::prompt::{SYSTEM_PROMPT, build_commit_prompt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER_NAME: &str = "openai";
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
    max_subject_length: usize,
    include_emoji: bool,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl OpenAiProvider {
    /// Build the adapter. Fails fast when no API key is resolvable.
    pub fn new(config: &Config) -> Result<Self, QuillError> {
        let api_key = config.api_key.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
            QuillError::Configuration(
                "OpenAI API key is required; set GIT_QUILL_API_KEY".to_string(),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuillError::Configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint: config
                .api_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
            max_subject_length: config.max_subject_length,
            include_emoji: config.include_emoji,
            retry: RetryPolicy::with_max_attempts(config.max_retries),
        })
    }

    async fn request_completion(&self, prompt: &str) -> Result<(String, u32), ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error(PROVIDER_NAME, &e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(PROVIDER_NAME, status, body));
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    provider: PROVIDER_NAME,
                    message: e.to_string(),
                })?;

        let text = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER_NAME,
                message: "response contained no message content".to_string(),
            })?
            .to_string();

        let tokens = parsed.usage.map_or(0, |u| u.total_tokens);
        Ok((text, tokens))
    }
}

#[async_trait]
impl CommitMessageProvider for OpenAiProvider {
    async fn generate_commit_message(
        &self,
        diff: &str,
        context: &GenerationContext<'_>,
    ) -> Result<GeneratedMessage, ProviderError> {
        let prompt = build_commit_prompt(
            diff,
            context.files_changed,
            context.additions,
            context.deletions,
            context.change_types,
            self.include_emoji,
        );

        let (text, tokens) = self
            .retry
            .run(|| self.request_completion(&prompt), ProviderError::is_rate_limit)
            .await?;

        log_debug!("OpenAI reply: {} tokens", tokens);

        let cost = pricing::estimate_cost(tokens, &self.model);
        Ok(GeneratedMessage::parse_response(
            &text,
            self.max_subject_length,
            PROVIDER_NAME,
            &self.model,
            tokens,
            cost,
        ))
    }

    async fn validate_credentials(&self) -> bool {
        let response = self
            .client
            .get(format!("{}/models", self.endpoint))
            .bearer_auth(&self.api_key)
            .send()
            .await;

        matches!(response, Ok(r) if r.status().is_success())
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: PROVIDER_NAME,
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            free_tier: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let config = Config::default();
        assert!(matches!(
            OpenAiProvider::new(&config),
            Err(QuillError::Configuration(_))
        ));
    }

    #[test]
    fn custom_endpoint_is_honored() {
        let config = Config {
            api_key: Some("sk-test".to_string()),
            api_endpoint: Some("https://proxy.example/v1".to_string()),
            ..Config::default()
        };
        let provider = OpenAiProvider::new(&config).expect("constructible with key");
        assert_eq!(provider.endpoint, "https://proxy.example/v1");
    }
}
