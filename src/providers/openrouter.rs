//! OpenRouter adapter
//!
//! OpenRouter speaks the OpenAI chat-completions dialect. It additionally
//! offers free-tier models (model names containing "free") which are billed
//! at zero cost, and a built-in fallback key so the adapter works without
//! any configuration.

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

const PROVIDER_NAME: &str = "openrouter";
const API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const REFERER: &str = "https://github.com/quill-dev/git-quill";
const APP_TITLE: &str = "git-quill";

/// Shared free-tier key used when the user configures none. Rate limits on
/// this key are aggressive; a personal key avoids them.
const DEFAULT_FREE_API_KEY: &str =
    "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";

pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    free_tier: bool,
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

impl OpenRouterProvider {
    /// Build the adapter. Unlike the other backends this never fails on a
    /// missing key: the built-in free-tier key is used instead.
    pub fn new(config: &Config) -> Result<Self, QuillError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_FREE_API_KEY.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuillError::Configuration(format!("cannot build HTTP client: {e}")))?;

        let free_tier = config.model.to_lowercase().contains("free");

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            free_tier,
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
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
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
impl CommitMessageProvider for OpenRouterProvider {
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

        log_debug!("OpenRouter reply: {} tokens", tokens);

        let cost = if self.free_tier {
            0.0
        } else {
            pricing::estimate_cost(tokens, &self.model)
        };

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
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: "test",
            }],
            max_tokens: 5,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
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
            free_tier: self.free_tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_falls_back_to_free_tier_key() {
        let provider =
            OpenRouterProvider::new(&Config::default()).expect("constructible without key");
        assert_eq!(provider.api_key, DEFAULT_FREE_API_KEY);
    }

    #[test]
    fn free_models_are_flagged() {
        let config = Config {
            model: "meta-llama/llama-3.1-8b-instruct:free".to_string(),
            ..Config::default()
        };
        let provider = OpenRouterProvider::new(&config).expect("constructible");
        assert!(provider.model_info().free_tier);

        let config = Config {
            model: "anthropic/claude-3-haiku".to_string(),
            ..Config::default()
        };
        let provider = OpenRouterProvider::new(&config).expect("constructible");
        assert!(!provider.model_info().free_tier);
    }
}
