//! Anthropic messages-API adapter

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

const PROVIDER_NAME: &str = "anthropic";
const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const FALLBACK_MODEL: &str = "claude-3-sonnet-20240229";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
    max_subject_length: usize,
    include_emoji: bool,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<UserMessage<'a>>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicProvider {
    /// Build the adapter. Fails fast when no API key is resolvable.
    /// A configured model without "claude" in its name falls back to a
    /// known Claude model.
    pub fn new(config: &Config) -> Result<Self, QuillError> {
        let api_key = config.api_key.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
            QuillError::Configuration(
                "Anthropic API key is required; set GIT_QUILL_API_KEY".to_string(),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuillError::Configuration(format!("cannot build HTTP client: {e}")))?;

        let model = if config.model.contains("claude") {
            config.model.clone()
        } else {
            FALLBACK_MODEL.to_string()
        };

        Ok(Self {
            client,
            api_key,
            model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
            max_subject_length: config.max_subject_length,
            include_emoji: config.include_emoji,
            retry: RetryPolicy::with_max_attempts(config.max_retries),
        })
    }

    async fn request_completion(&self, prompt: &str) -> Result<(String, u32), ProviderError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: SYSTEM_PROMPT,
            messages: vec![UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error(PROVIDER_NAME, &e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(PROVIDER_NAME, status, body));
        }

        let parsed: MessagesResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    provider: PROVIDER_NAME,
                    message: e.to_string(),
                })?;

        let text = parsed
            .content
            .first()
            .and_then(|block| block.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER_NAME,
                message: "response contained no text block".to_string(),
            })?
            .to_string();

        let tokens = parsed
            .usage
            .map_or(0, |u| u.input_tokens + u.output_tokens);
        Ok((text, tokens))
    }
}

#[async_trait]
impl CommitMessageProvider for AnthropicProvider {
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

        log_debug!("Anthropic reply: {} tokens", tokens);

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
        // Minimal live call: ten output tokens, no system prompt.
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: 10,
            temperature: 0.0,
            system: "",
            messages: vec![UserMessage {
                role: "user",
                content: "test",
            }],
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
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
            AnthropicProvider::new(&config),
            Err(QuillError::Configuration(_))
        ));
    }

    #[test]
    fn non_claude_model_falls_back() {
        let config = Config {
            api_key: Some("sk-ant-test".to_string()),
            model: "gpt-4".to_string(),
            ..Config::default()
        };
        let provider = AnthropicProvider::new(&config).expect("constructible with key");
        assert_eq!(provider.model, FALLBACK_MODEL);

        let config = Config {
            api_key: Some("sk-ant-test".to_string()),
            model: "claude-3-haiku-20240307".to_string(),
            ..Config::default()
        };
        let provider = AnthropicProvider::new(&config).expect("constructible with key");
        assert_eq!(provider.model, "claude-3-haiku-20240307");
    }
}
