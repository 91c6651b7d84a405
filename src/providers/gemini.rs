//! Google Gemini generateContent adapter
//!
//! Gemini does not reliably report usage metadata, so token counts are
//! approximated from whitespace words over the reply plus the diff.

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
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const PROVIDER_NAME: &str = "gemini";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const FALLBACK_MODEL: &str = "gemini-pro";

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_secs: u64,
    max_subject_length: usize,
    include_emoji: bool,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiProvider {
    /// Build the adapter. Fails fast when no API key is resolvable.
    pub fn new(config: &Config) -> Result<Self, QuillError> {
        let api_key = config.api_key.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
            QuillError::Configuration(
                "Gemini API key is required; set GIT_QUILL_API_KEY".to_string(),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuillError::Configuration(format!("cannot build HTTP client: {e}")))?;

        let model = if config.model.contains("gemini") {
            config.model.clone()
        } else {
            FALLBACK_MODEL.to_string()
        };

        Ok(Self {
            client,
            api_key,
            base_url: config
                .api_endpoint
                .clone()
                .unwrap_or_else(|| BASE_URL.to_string()),
            model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
            max_subject_length: config.max_subject_length,
            include_emoji: config.include_emoji,
            retry: RetryPolicy::with_max_attempts(config.max_retries),
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_tokens,
            },
        })
    }

    async fn request_completion(&self, full_prompt: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.generate_url())
            .json(&self.request_body(full_prompt))
            .send()
            .await
            .map_err(|e| classify_transport_error(PROVIDER_NAME, &e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(PROVIDER_NAME, status, body));
        }

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    provider: PROVIDER_NAME,
                    message: e.to_string(),
                })?;

        parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER_NAME,
                message: "response contained no candidates".to_string(),
            })
    }
}

#[async_trait]
impl CommitMessageProvider for GeminiProvider {
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

        // Gemini has no separate system role on this endpoint; the house
        // style is prepended to the user prompt.
        let full_prompt = format!("{SYSTEM_PROMPT}\n\n{prompt}");

        let text = self
            .retry
            .run(
                || self.request_completion(&full_prompt),
                ProviderError::is_rate_limit,
            )
            .await?;

        let tokens = pricing::approximate_tokens(&text, diff);
        log_debug!("Gemini reply: ~{} tokens (approximated)", tokens);

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
        let probe = json!({
            "contents": [{ "parts": [{ "text": "test" }] }],
            "generationConfig": { "temperature": 0.0, "maxOutputTokens": 10 },
        });

        let response = self
            .client
            .post(self.generate_url())
            .json(&probe)
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
            GeminiProvider::new(&config),
            Err(QuillError::Configuration(_))
        ));
    }

    #[test]
    fn request_body_carries_prompt_and_generation_config() {
        let config = Config {
            api_key: Some("AIza-test".to_string()),
            model: "gemini-pro".to_string(),
            ..Config::default()
        };
        let provider = GeminiProvider::new(&config).expect("constructible with key");

        let body = provider.request_body("hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 200);
    }

    #[test]
    fn non_gemini_model_falls_back() {
        let config = Config {
            api_key: Some("AIza-test".to_string()),
            model: "gpt-4".to_string(),
            ..Config::default()
        };
        let provider = GeminiProvider::new(&config).expect("constructible with key");
        assert_eq!(provider.model, FALLBACK_MODEL);
    }
}
