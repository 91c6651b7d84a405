use git_quill::validator::{CONVENTIONAL_TYPES, CommitMessageValidator};

#[test]
fn well_formed_messages_pass() {
    let validator = CommitMessageValidator::default();

    let samples = [
        "feat: add usage ledger",
        "fix(parser): handle empty response body",
        "docs: describe provider configuration",
        "refactor(git): split diff collection from counting",
        "chore: bump dependencies\n\nRoutine update of the lockfile.",
    ];

    for message in samples {
        let (valid, errors) = validator.validate_conventional(message);
        assert!(valid, "expected '{message}' to pass, got: {errors:?}");
    }
}

#[test]
fn missing_type_prefix_is_reported() {
    let validator = CommitMessageValidator::default();
    let (valid, errors) = validator.validate_conventional("add usage ledger");
    assert!(!valid);
    assert!(errors.iter().any(|e| e.contains("valid type")));
}

#[test]
fn every_known_type_is_accepted() {
    let validator = CommitMessageValidator::default();
    for commit_type in CONVENTIONAL_TYPES {
        let message = format!("{commit_type}: do the thing");
        let (valid, errors) = validator.validate_conventional(&message);
        assert!(valid, "type '{commit_type}' rejected: {errors:?}");
    }
}

#[test]
fn each_violation_is_reported_independently() {
    let validator = CommitMessageValidator::new(30);

    // Four problems: bad type, too long, trailing period, no blank line
    let message = "added something that goes on far too long for the configured limit.\nbody";
    let (valid, errors) = validator.validate_conventional(message);
    assert!(!valid);
    assert_eq!(errors.len(), 4, "got: {errors:?}");
}

#[test]
fn untyped_past_tense_subject_reports_prefix_and_period() {
    let validator = CommitMessageValidator::default();
    let (valid, errors) = validator.validate_conventional("updated stuff.");
    assert!(!valid);
    assert!(errors.iter().any(|e| e.contains("valid type")));
    assert!(errors.iter().any(|e| e.contains("period")));
}

#[test]
fn past_tense_subject_is_flagged() {
    let validator = CommitMessageValidator::default();
    let (valid, errors) = validator.validate_conventional("feat: added new thing");
    assert!(!valid);
    assert!(errors.iter().any(|e| e.contains("imperative")));
}

#[test]
fn empty_message_short_circuits() {
    let validator = CommitMessageValidator::default();
    let (valid, errors) = validator.validate_conventional("");
    assert!(!valid);
    assert_eq!(errors, vec!["Message is empty".to_string()]);
}

#[test]
fn subject_length_uses_chars_not_bytes() {
    let validator = CommitMessageValidator::new(10);
    // Ten multibyte characters
    assert!(validator.validate_subject_length("éééééééééé"));
    assert!(!validator.validate_subject_length("ééééééééééé"));
}

#[test]
fn body_line_length_reports_one_indexed_lines() {
    let validator = CommitMessageValidator::default();
    let body = "short line\nthis line is decidedly too long for the configured limit\nshort";
    let (valid, lines) = validator.validate_body_line_length(body, 20);
    assert!(!valid);
    assert_eq!(lines, vec![2]);
}

#[test]
fn breaking_change_footer_wins_over_bang() {
    let validator = CommitMessageValidator::default();

    let message = "feat!: rework config\n\nBREAKING CHANGE: config file moved to a new path";
    assert_eq!(
        validator.extract_breaking_change(message),
        Some("config file moved to a new path".to_string())
    );

    let bang_only = "feat!: rework config";
    assert_eq!(
        validator.extract_breaking_change(bang_only),
        Some("Breaking change indicated in subject".to_string())
    );

    assert_eq!(validator.extract_breaking_change("feat: no break"), None);
}

#[test]
fn type_suggestion_follows_priority_order() {
    let validator = CommitMessageValidator::default();

    // test beats docs even when both patterns appear
    assert_eq!(
        validator.suggest_type("diff --git a/tests/readme_test.rs"),
        "test"
    );
    assert_eq!(validator.suggest_type("update README.md"), "docs");
    assert_eq!(validator.suggest_type("bump version in Cargo.toml"), "build");
    assert_eq!(
        validator.suggest_type("edit .github/workflows/release.yml"),
        "ci"
    );
    assert_eq!(validator.suggest_type("resolve crash on startup"), "fix");
    assert_eq!(validator.suggest_type("plain new functionality"), "feat");
}
