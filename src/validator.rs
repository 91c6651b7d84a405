//! Rule-based commit message validation and type suggestion

use regex::Regex;
use std::sync::LazyLock;

/// The fixed Conventional Commits type set.
pub const CONVENTIONAL_TYPES: [&str; 11] = [
    "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore", "revert",
];

static TYPE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = CONVENTIONAL_TYPES.join("|");
    Regex::new(&format!(r"^({alternation})(\([a-z0-9-]+\))?: .+")).expect("valid type regex")
});

static PAST_TENSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\w+)(\([^)]+\))?: (added|fixed|changed|updated)")
        .expect("valid past-tense regex")
});

static BREAKING_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"BREAKING CHANGE: (.+)").expect("valid breaking-change regex"));

static BANG_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+!(\(|:)").expect("valid bang-type regex"));

/// Validates commit messages against the Conventional Commits shape.
pub struct CommitMessageValidator {
    max_subject_length: usize,
}

impl Default for CommitMessageValidator {
    fn default() -> Self {
        Self::new(72)
    }
}

impl CommitMessageValidator {
    pub fn new(max_subject_length: usize) -> Self {
        Self { max_subject_length }
    }

    /// Validate a full message against the Conventional Commits spec.
    ///
    /// All checks run independently; each contributes at most one error.
    pub fn validate_conventional(&self, message: &str) -> (bool, Vec<String>) {
        let mut errors = Vec::new();
        let lines: Vec<&str> = message.split('\n').collect();
        let subject = lines.first().copied().unwrap_or("");

        if subject.is_empty() {
            return (false, vec!["Message is empty".to_string()]);
        }

        if !TYPE_PREFIX.is_match(subject) {
            errors.push(format!(
                "Subject must start with a valid type: {}",
                CONVENTIONAL_TYPES.join(", ")
            ));
        }

        let subject_len = subject.chars().count();
        if subject_len > self.max_subject_length {
            errors.push(format!(
                "Subject exceeds {} characters ({subject_len})",
                self.max_subject_length
            ));
        }

        if subject.ends_with('.') {
            errors.push("Subject should not end with a period".to_string());
        }

        if PAST_TENSE.is_match(subject) {
            errors.push("Use imperative mood (add, fix, change) not past tense".to_string());
        }

        if lines.len() > 1 && !lines[1].is_empty() {
            errors.push("Separate subject from body with a blank line".to_string());
        }

        (errors.is_empty(), errors)
    }

    /// Whether the subject fits the configured maximum length.
    pub fn validate_subject_length(&self, subject: &str) -> bool {
        subject.chars().count() <= self.max_subject_length
    }

    /// Check body line lengths; offending line numbers are 1-indexed.
    pub fn validate_body_line_length(
        &self,
        body: &str,
        max_length: usize,
    ) -> (bool, Vec<usize>) {
        let invalid: Vec<usize> = body
            .split('\n')
            .enumerate()
            .filter(|(_, line)| line.chars().count() > max_length)
            .map(|(i, _)| i + 1)
            .collect();

        (invalid.is_empty(), invalid)
    }

    /// Extract a breaking-change description, if any.
    ///
    /// A `BREAKING CHANGE:` footer wins; a `!` immediately before the colon
    /// or scope parenthesis in the subject is the weaker signal.
    pub fn extract_breaking_change(&self, message: &str) -> Option<String> {
        if let Some(caps) = BREAKING_FOOTER.captures(message) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }

        if BANG_TYPE.is_match(message) {
            return Some("Breaking change indicated in subject".to_string());
        }

        None
    }

    /// Suggest a commit type from diff content.
    ///
    /// Heuristics run in fixed priority order; the first match wins.
    pub fn suggest_type(&self, diff: &str) -> &'static str {
        static TEST_PATTERN: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"test_|_test\.|spec\.").expect("valid regex"));
        static DOCS_PATTERN: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"readme|doc|comment").expect("valid regex"));
        static BUILD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"package\.json|requirements|setup\.py|cargo\.toml|dockerfile")
                .expect("valid regex")
        });
        static CI_PATTERN: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\.github/workflows|\.gitlab-ci").expect("valid regex"));
        static FIX_PATTERN: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"fix|bug|issue|error|crash").expect("valid regex"));

        let diff_lower = diff.to_lowercase();

        if TEST_PATTERN.is_match(&diff_lower) {
            "test"
        } else if DOCS_PATTERN.is_match(&diff_lower) {
            "docs"
        } else if BUILD_PATTERN.is_match(&diff_lower) {
            "build"
        } else if CI_PATTERN.is_match(&diff_lower) {
            "ci"
        } else if FIX_PATTERN.is_match(&diff_lower) {
            "fix"
        } else {
            "feat"
        }
    }
}
