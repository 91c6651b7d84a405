//! Provider abstraction: one adapter per backend API
//!
//! Each adapter owns request construction, rate-limit retry, response
//! parsing, and cost estimation for its backend. Adapters are selected by a
//! configuration string and dispatched through a trait object.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod openrouter;
pub mod pricing;
pub mod retry;

use crate::config::Config;
use crate::errors::{ProviderError, QuillError};
use crate::message::GeneratedMessage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use openrouter::OpenRouterProvider;

/// Diff context handed to a provider alongside the raw diff text.
#[derive(Debug, Clone)]
pub struct GenerationContext<'a> {
    pub files_changed: &'a [String],
    pub additions: u32,
    pub deletions: u32,
    pub change_types: &'a HashMap<String, char>,
}

/// Static reflection of an adapter's current configuration.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub provider: &'static str,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub free_tier: bool,
}

/// Capability interface implemented by every backend adapter.
#[async_trait]
pub trait CommitMessageProvider: Send + Sync {
    /// Generate one commit message from the staged diff.
    async fn generate_commit_message(
        &self,
        diff: &str,
        context: &GenerationContext<'_>,
    ) -> Result<GeneratedMessage, ProviderError>;

    /// Perform a minimal live call to check the configured credentials.
    /// Returns false (never errors) on auth or rate-limit failure.
    async fn validate_credentials(&self) -> bool;

    /// Describe the configured model. No network call.
    fn model_info(&self) -> ModelInfo;
}

/// The supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    OpenRouter,
}

impl ProviderKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
        }
    }

    pub fn all_names() -> [&'static str; 4] {
        ["openai", "anthropic", "gemini", "openrouter"]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = QuillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(QuillError::Configuration(format!(
                "unknown provider '{other}'; available: {}",
                Self::all_names().join(", ")
            ))),
        }
    }
}

/// Build the adapter selected by the configuration.
///
/// Fails with `QuillError::Configuration` when the adapter cannot resolve
/// credentials; no adapter is constructible without them (OpenRouter falls
/// back to its built-in free-tier key).
pub fn create_provider(config: &Config) -> Result<Box<dyn CommitMessageProvider>, QuillError> {
    let kind: ProviderKind = config.provider.parse()?;

    Ok(match kind {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(config)?),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(config)?),
        ProviderKind::Gemini => Box::new(GeminiProvider::new(config)?),
        ProviderKind::OpenRouter => Box::new(OpenRouterProvider::new(config)?),
    })
}

/// Map an HTTP error status to the provider error taxonomy.
/// 401/403 is an auth failure, 429 is the retryable rate-limit signal.
pub(crate) fn classify_http_error(
    provider: &'static str,
    status: reqwest::StatusCode,
    body: String,
) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Authentication {
            provider,
            message: body,
        },
        429 => ProviderError::RateLimited { provider },
        _ => ProviderError::Api {
            provider,
            message: format!("HTTP {status}: {body}"),
        },
    }
}

/// Map a transport-level reqwest failure to the provider error taxonomy.
pub(crate) fn classify_transport_error(
    provider: &'static str,
    err: &reqwest::Error,
    timeout_secs: u64,
) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            provider,
            seconds: timeout_secs,
        }
    } else {
        ProviderError::Api {
            provider,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_round_trip() {
        for name in ProviderKind::all_names() {
            let kind: ProviderKind = name.parse().expect("known provider");
            assert_eq!(kind.name(), name);
        }
    }

    #[test]
    fn provider_aliases_resolve() {
        assert_eq!("claude".parse::<ProviderKind>().ok(), Some(ProviderKind::Anthropic));
        assert_eq!("google".parse::<ProviderKind>().ok(), Some(ProviderKind::Gemini));
        assert_eq!("OpenAI".parse::<ProviderKind>().ok(), Some(ProviderKind::OpenAi));
    }

    #[test]
    fn unknown_provider_is_a_configuration_error() {
        let err = "phind".parse::<ProviderKind>().expect_err("unknown provider");
        assert!(matches!(err, QuillError::Configuration(_)));
    }
}
