use thiserror::Error;

/// Failures surfaced by a provider adapter.
///
/// Only `RateLimited` is retryable; everything else propagates immediately.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider}: authentication failed: {message}")]
    Authentication {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: rate limited by the API")]
    RateLimited { provider: &'static str },

    #[error("{provider}: request timed out after {seconds}s")]
    Timeout {
        provider: &'static str,
        seconds: u64,
    },

    #[error("{provider}: malformed response: {message}")]
    MalformedResponse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: API error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    /// Whether this error is a rate-limit signal worth retrying.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Top-level error taxonomy for git-quill.
#[derive(Error, Debug)]
pub enum QuillError {
    /// Bad or missing settings, reported before any network activity.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The current directory is not a usable Git repository.
    #[error("git repository error: {0}")]
    GitRepository(String),

    /// Nothing is staged for commit.
    #[error("no staged changes found; use 'git add' to stage changes first")]
    NoStagedChanges,

    /// A provider adapter failed after its retry budget was spent.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The configured monthly budget has been reached.
    #[error("monthly cost limit reached: ${current:.4} of ${limit:.2}")]
    CostLimitExceeded { limit: f64, current: f64 },

    /// The validator reported shape violations.
    #[error("invalid commit message: {}", .0.join("; "))]
    InvalidCommitMessage(Vec<String>),

    /// The user interrupted an interactive prompt.
    #[error("interrupted")]
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_the_only_retryable_error() {
        assert!(
            ProviderError::RateLimited { provider: "openai" }.is_rate_limit()
        );
        assert!(
            !ProviderError::Api {
                provider: "openai",
                message: "boom".to_string()
            }
            .is_rate_limit()
        );
        assert!(
            !ProviderError::Authentication {
                provider: "openai",
                message: "bad key".to_string()
            }
            .is_rate_limit()
        );
    }

    #[test]
    fn provider_error_converts_into_quill_error() {
        let err: QuillError = ProviderError::RateLimited { provider: "gemini" }.into();
        assert!(matches!(err, QuillError::Provider(_)));
    }
}
