//! Commit message model and response parsing

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Footer markers recognized by the response parser. A line beginning with
/// any of these starts the footer; everything after it belongs to the footer.
const FOOTER_MARKERS: [&str; 3] = ["BREAKING CHANGE:", "Refs:", "Closes:"];

/// One generated commit message, immutable after construction.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GeneratedMessage {
    /// Subject line, truncated to the configured maximum
    pub subject: String,
    /// Optional body, blank-line-separated from the subject
    pub body: Option<String>,
    /// Optional footer (breaking changes, issue references)
    pub footer: Option<String>,
    /// Unmodified model output, kept for diagnostics
    pub raw: String,
    /// Tokens consumed by the generation call
    pub tokens_used: u32,
    /// Estimated cost in USD
    pub cost_usd: f64,
    /// When the message was created
    pub created_at: DateTime<Local>,
    /// Provider that produced the message
    pub provider: String,
    /// Model that produced the message
    pub model: String,
}

impl GeneratedMessage {
    /// Parse raw model output into a structured message.
    ///
    /// Single-pass line classification: the first non-blank line is the
    /// subject; the footer starts at the first recognized footer marker and
    /// runs to the end of the text; everything else that is non-blank is
    /// body, preserved verbatim. Subjects longer than `max_subject_length`
    /// are cut to `max_subject_length - 3` characters plus an ellipsis.
    pub fn parse_response(
        raw: &str,
        max_subject_length: usize,
        provider: &str,
        model: &str,
        tokens_used: u32,
        cost_usd: f64,
    ) -> Self {
        let mut subject = String::new();
        let mut body_lines: Vec<&str> = Vec::new();
        let mut footer_lines: Vec<&str> = Vec::new();
        let mut in_footer = false;

        for line in raw.lines() {
            let trimmed = line.trim();
            if subject.is_empty() && !trimmed.is_empty() {
                subject = trimmed.to_string();
            } else if !in_footer && FOOTER_MARKERS.iter().any(|m| trimmed.starts_with(m)) {
                in_footer = true;
                footer_lines.push(trimmed);
            } else if in_footer {
                footer_lines.push(trimmed);
            } else if !trimmed.is_empty() {
                // Body lines keep their internal whitespace.
                body_lines.push(line);
            }
        }

        if subject.chars().count() > max_subject_length {
            let keep = max_subject_length.saturating_sub(3);
            subject = subject.chars().take(keep).collect::<String>() + "...";
        }

        let body = if body_lines.is_empty() {
            None
        } else {
            Some(body_lines.join("\n").trim().to_string())
        };
        let footer = if footer_lines.is_empty() {
            None
        } else {
            Some(footer_lines.join("\n").trim().to_string())
        };

        Self {
            subject,
            body,
            footer,
            raw: raw.to_string(),
            tokens_used,
            cost_usd,
            created_at: Local::now(),
            provider: provider.to_string(),
            model: model.to_string(),
        }
    }

    /// Format the message for committing: subject, then blank line + body if
    /// present, then blank line + footer if present. Never produces a
    /// dangling blank line at the start or end.
    pub fn format(&self) -> String {
        let mut parts = vec![self.subject.clone()];

        if let Some(body) = &self.body {
            parts.push(String::new());
            parts.push(body.clone());
        }

        if let Some(footer) = &self.footer {
            parts.push(String::new());
            parts.push(footer.clone());
        }

        parts.join("\n")
    }

    /// Quick conventional-commit shape check on the subject.
    pub fn is_conventional(&self) -> bool {
        const TYPES: [&str; 11] = [
            "feat", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci", "chore",
            "revert",
        ];

        TYPES.iter().any(|t| {
            self.subject.starts_with(&format!("{t}:")) || self.subject.starts_with(&format!("{t}("))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> GeneratedMessage {
        GeneratedMessage::parse_response(raw, 72, "openai", "gpt-4", 100, 0.001)
    }

    #[test]
    fn subject_only_format_has_no_trailing_blank_lines() {
        let msg = parse("feat(core): add widget support");
        assert_eq!(msg.format(), "feat(core): add widget support");
        assert!(!msg.format().ends_with('\n'));
    }

    #[test]
    fn long_subject_is_truncated_with_ellipsis() {
        let raw = "feat(core): ".to_string() + &"x".repeat(100);
        let msg = parse(&raw);
        assert_eq!(msg.subject.chars().count(), 72);
        assert!(msg.subject.ends_with("..."));
    }

    #[test]
    fn footer_markers_start_the_footer() {
        let raw = "feat(api): switch to v2 schema\n\n- Update DTOs\n- Migrate callers\n\nBREAKING CHANGE: v1 endpoint removed\nClients must migrate.";
        let msg = parse(raw);
        assert_eq!(msg.subject, "feat(api): switch to v2 schema");
        assert_eq!(msg.body.as_deref(), Some("- Update DTOs\n- Migrate callers"));
        let footer = msg.footer.expect("footer present");
        assert!(footer.starts_with("BREAKING CHANGE:"));
        assert!(footer.contains("Clients must migrate."));
    }

    #[test]
    fn body_lines_are_preserved_verbatim() {
        let raw = "fix: thing\n\n  - indented bullet\n- plain bullet";
        let msg = parse(raw);
        assert_eq!(msg.body.as_deref(), Some("- indented bullet\n- plain bullet"));
        // Interior indentation of lines after the first survives.
        let raw2 = "fix: thing\n\n- first\n  - nested";
        let msg2 = parse(raw2);
        assert_eq!(msg2.body.as_deref(), Some("- first\n  - nested"));
    }

    #[test]
    fn format_assembles_all_three_sections() {
        let raw = "feat: add thing\n\nbody line\n\nRefs: #42";
        let msg = parse(raw);
        assert_eq!(msg.format(), "feat: add thing\n\nbody line\n\nRefs: #42");
    }

    #[test]
    fn conventional_shape_check() {
        assert!(parse("feat(x): add thing").is_conventional());
        assert!(parse("chore: bump deps").is_conventional());
        assert!(!parse("added some stuff").is_conventional());
    }
}
