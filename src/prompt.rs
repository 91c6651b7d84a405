//! Prompt construction for commit message generation
//!
//! Pure string building: no I/O, no provider-specific branching. The fixed
//! system instruction carries the house style; `build_commit_prompt` carries
//! the per-invocation context.

use std::collections::HashMap;
use std::fmt::Write;

/// Maximum number of changed files listed in the prompt.
const MAX_LISTED_FILES: usize = 10;

/// Diff text is truncated to this many characters. Large diffs degrade to
/// partial context rather than failing, which bounds token usage and cost.
const MAX_DIFF_CHARS: usize = 3000;

/// Fixed system instruction: Conventional Commits rules, examples, and
/// forbidden preambles. Supplied separately per provider call.
pub const SYSTEM_PROMPT: &str = r#"You are an expert Git assistant tasked with creating clear, descriptive, and consistent commit messages based on the provided Git diff from staged changes. Analyze the diff thoroughly and generate a commit message that follows the Conventional Commits format, accurately summarizing the intent and impact of the changes.

Output only the commit message. Do not include additional labels (e.g., 'Title:', 'Body:'), explanations, or any text outside the message itself.

### Instructions

1. **Commit Message Structure:**
   - **Title:** `<type>(<scope>): <subject>`
     - Use the imperative mood for the subject (e.g., "add", "fix", "update", "refactor").
     - The subject concisely describes the primary purpose of the change (max 50 characters).
     - The scope pinpoints the affected area (file, module, component, or feature).
   - **Body:** Concise bullet points (-) detailing what changed, why, and how it affects the codebase. Begin each bullet with an action verb and keep it under 72 characters.
   - **Breaking Changes:** If applicable, include a section starting with "BREAKING CHANGE:" that explains what breaks and how to migrate.

2. **Types of Commits (choose the most appropriate):**
   - **feat:** Adds a new feature or significant enhancement
     - Example: `feat(auth): add multi-factor authentication option`
   - **fix:** Resolves a bug or issue
     - Example: `fix(api): correct query parameter handling in search endpoint`
   - **docs:** Updates documentation only
     - Example: `docs(readme): update installation instructions for v2.0`
   - **style:** Changes that don't affect code functionality (formatting, whitespace)
   - **refactor:** Code changes that neither fix bugs nor add features
   - **perf:** Improves performance
   - **test:** Adds or modifies tests
   - **chore:** Maintenance tasks, dependency updates, etc.

3. **Analyzing the Diff:**
   - Look for patterns in the added/removed code to determine the primary purpose.
   - Pay attention to file paths to identify the affected module or component.
   - If the diff mixes change kinds, pick the type reflecting the primary intent and detail secondary changes in the body.

4. **Best Practices:**
   - Be specific but concise in the subject line.
   - Focus exclusively on the changes present in the provided diff.
   - Avoid vague terms like "update" or "fix" without specifics.
   - Mention specific functions, types, or files that were significantly modified.

### Example Responses

Example 1 - Adding a new feature:
```
feat(user): implement password reset functionality

- Add PasswordResetController with email verification flow
- Create email templates for reset instructions
- Add rate limiting to prevent abuse of reset endpoint
```

Example 2 - Fixing a bug:
```
fix(checkout): resolve total calculation error with discounts

- Fix incorrect discount application with multiple promo codes
- Add validation to prevent negative totals
```

Example 3 - Introducing a breaking change:
```
feat(api): refactor user-data endpoint to use new schema

- Update user-data API to use User DTO
- Migrate all internal calls to the new endpoint structure

BREAKING CHANGE: The /api/v1/user-data endpoint has been replaced with /api/v2/user.
Clients must update their API calls and adopt the new User data schema.
```"#;

/// Build the user prompt for a generation call.
///
/// Lists at most the first ten changed files with their one-letter change
/// code, truncates the diff to 3000 characters with a marker, and optionally
/// appends an emoji instruction. Order of files is preserved from the input.
pub fn build_commit_prompt(
    diff: &str,
    files_changed: &[String],
    additions: u32,
    deletions: u32,
    change_types: &HashMap<String, char>,
    include_emoji: bool,
) -> String {
    let mut file_summary = String::new();
    for file in files_changed.iter().take(MAX_LISTED_FILES) {
        let code = change_types.get(file).copied().unwrap_or('M');
        let _ = writeln!(file_summary, "  {code} {file}");
    }
    if files_changed.len() > MAX_LISTED_FILES {
        let _ = writeln!(
            file_summary,
            "  ... and {} more files",
            files_changed.len() - MAX_LISTED_FILES
        );
    }

    let mut truncated_diff: String = diff.chars().take(MAX_DIFF_CHARS).collect();
    if diff.chars().count() > MAX_DIFF_CHARS {
        truncated_diff.push_str("\n\n... (diff truncated)");
    }

    let emoji_instruction = if include_emoji {
        "\nInclude an appropriate emoji at the start of the commit message.\n"
    } else {
        ""
    };

    format!(
        "Analyze the following staged changes and generate a Conventional Commit message.\n\n\
         Files changed ({}):\n{}\n\
         Statistics:\n  +{additions} additions, -{deletions} deletions\n\n\
         Git diff:\n```\n{truncated_diff}\n```\n{emoji_instruction}\n\
         ### Commit Message\n",
        files_changed.len(),
        file_summary,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_diff_yields_zero_file_listing() {
        let prompt = build_commit_prompt("", &[], 0, 0, &HashMap::new(), false);
        assert!(prompt.contains("Files changed (0):"));
        assert!(prompt.contains("+0 additions, -0 deletions"));
    }

    #[test]
    fn file_listing_is_capped_at_ten() {
        let files: Vec<String> = (0..14).map(|i| format!("src/file{i}.rs")).collect();
        let mut types = HashMap::new();
        for f in &files {
            types.insert(f.clone(), 'A');
        }

        let prompt = build_commit_prompt("diff", &files, 14, 0, &types, false);
        assert!(prompt.contains("  A src/file9.rs"));
        assert!(!prompt.contains("src/file10.rs"));
        assert!(prompt.contains("... and 4 more files"));
    }

    #[test]
    fn long_diffs_are_truncated_with_marker() {
        let diff = "x".repeat(5000);
        let prompt = build_commit_prompt(&diff, &[], 1, 1, &HashMap::new(), false);
        assert!(prompt.contains("... (diff truncated)"));

        let short = "y".repeat(100);
        let prompt = build_commit_prompt(&short, &[], 1, 1, &HashMap::new(), false);
        assert!(!prompt.contains("... (diff truncated)"));
    }

    #[test]
    fn emoji_instruction_is_optional() {
        let with = build_commit_prompt("d", &[], 0, 0, &HashMap::new(), true);
        let without = build_commit_prompt("d", &[], 0, 0, &HashMap::new(), false);
        assert!(with.contains("Include an appropriate emoji"));
        assert!(!without.contains("Include an appropriate emoji"));
    }
}
