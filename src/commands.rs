//! Command handlers: generation, usage reporting, configuration display

use crate::config::Config;
use crate::errors::QuillError;
use crate::git::GitRepo;
use crate::interactive;
use crate::{log_debug, log_error, log_info, log_warn};
use crate::message::GeneratedMessage;
use crate::providers::{self, GenerationContext};
use crate::ui::Console;
use crate::usage::UsageTracker;
use crate::validator::CommitMessageValidator;
use anyhow::Result;
use colored::Colorize;

/// Flag overrides for the `gen` command; each `Some` wins over the
/// corresponding config value.
#[derive(Clone, Default)]
pub struct GenOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub verbose: bool,
}

impl GenOverrides {
    /// Apply the command-line overrides on top of the resolved config.
    pub fn apply(self, config: &mut Config) {
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = Some(api_key);
        }
        if self.verbose {
            config.verbose = true;
        }
    }
}

/// Handle the 'gen' command: build the prompt from the staged diff, call
/// the provider, review, then commit or print.
pub async fn handle_gen_command(
    console: &Console,
    overrides: GenOverrides,
    count: usize,
    no_review: bool,
    print_only: bool,
) -> Result<()> {
    log_debug!(
        "Starting 'gen' command with count: {}, no_review: {}, print: {}",
        count,
        no_review,
        print_only
    );

    let mut config = Config::load()?;
    overrides.apply(&mut config);
    config.validate()?;

    let repo = GitRepo::discover()?;
    let summary = repo.get_staged_diff()?;
    if summary.is_empty {
        return Err(QuillError::NoStagedChanges.into());
    }

    console.diff_summary(&summary);
    console.newline();

    if config.verbose {
        let info = repo.repo_info()?;
        console.message(&format!(
            "{} {} ({})",
            "Repository:".dimmed(),
            info.root,
            info.branch
        ));
    }

    let tracker = if config.track_usage {
        Some(UsageTracker::new(&Config::usage_db_path()?)?)
    } else {
        None
    };

    if let (Some(tracker), Some(limit)) = (&tracker, config.monthly_cost_limit) {
        let (reached, current) = tracker.check_monthly_limit(limit)?;
        if reached {
            return Err(QuillError::CostLimitExceeded { limit, current }.into());
        }
        // Warn when four fifths of the budget is gone.
        if current >= limit * 0.8 {
            log_warn!("Monthly cost at ${:.4} of ${:.2} limit", current, limit);
            console.warning(&format!(
                "Monthly cost at ${current:.4} of ${limit:.2} limit"
            ));
        }
    }

    let provider = providers::create_provider(&config)?;
    let info = provider.model_info();
    console.info(&format!("Generating with {} / {}", info.provider, info.model));

    let context = GenerationContext {
        files_changed: &summary.files_changed,
        additions: summary.additions,
        deletions: summary.deletions,
        change_types: &summary.change_types,
    };

    // A failed attempt does not abort the batch; only zero successes is fatal.
    let mut candidates: Vec<GeneratedMessage> = Vec::with_capacity(count);
    let mut last_error: Option<QuillError> = None;
    for attempt in 1..=count {
        let spinner = console.spinner(&format!(
            "Generating commit message ({attempt}/{count})..."
        ));
        let result = provider
            .generate_commit_message(&summary.diff_text, &context)
            .await;
        spinner.finish_and_clear();

        match result {
            Ok(message) => {
                if let Some(tracker) = &tracker {
                    tracker.record_usage(
                        &message.provider,
                        &message.model,
                        message.tokens_used,
                        message.cost_usd,
                        true,
                    )?;
                }
                console.commit_message(&message);
                candidates.push(message);
            }
            Err(e) => {
                if let Some(tracker) = &tracker {
                    tracker.record_usage(info.provider, &info.model, 0, 0.0, false)?;
                }
                log_error!("Generation attempt {attempt} failed: {e}");
                console.warning(&format!("Generation {attempt}/{count} failed: {e}"));
                last_error = Some(e.into());
            }
        }
    }

    if candidates.is_empty() {
        return Err(last_error
            .unwrap_or_else(|| {
                QuillError::Configuration("no message was generated".to_string())
            })
            .into());
    }

    validate_candidates(console, &config, &candidates);

    let selected = if no_review || print_only {
        candidates[0].format()
    } else {
        let formatted: Vec<String> = candidates.iter().map(GeneratedMessage::format).collect();
        match interactive::review_and_edit(console, &formatted)? {
            Some(message) => message,
            None => {
                console.warning("Commit cancelled");
                return Ok(());
            }
        }
    };

    if print_only {
        // Bare message on stdout for scripting; quiet mode already
        // suppressed the decorated output above.
        println!("{selected}");
        return Ok(());
    }

    match repo.commit(&selected) {
        Ok(commit_id) => {
            log_info!("Created commit {}", commit_id);
            console.success(&format!(
                "Created commit {}",
                commit_id.chars().take(10).collect::<String>()
            ));
            Ok(())
        }
        Err(e) => {
            // Echo the message back so the user's work is not lost.
            console.error("Commit failed; your message was:");
            println!("{selected}");
            Err(e)
        }
    }
}

/// Run the conventional-format checks and surface problems as warnings.
/// Generation output is advisory; a non-conforming message still commits.
fn validate_candidates(console: &Console, config: &Config, candidates: &[GeneratedMessage]) {
    if config.commit_format != "conventional" {
        return;
    }

    let validator = CommitMessageValidator::new(config.max_subject_length);
    for (i, message) in candidates.iter().enumerate() {
        let (valid, problems) = validator.validate_conventional(&message.format());
        if !valid {
            for problem in problems {
                console.warning(&format!("Message {}: {problem}", i + 1));
            }
        }
    }
}

/// Handle the 'usage' command: report on the ledger.
pub fn handle_usage_command(console: &Console, monthly: bool, by_provider: bool) -> Result<()> {
    let tracker = UsageTracker::new(&Config::usage_db_path()?)?;

    if monthly {
        let usage = tracker.monthly_usage()?;
        console.info(&format!("Usage for {}", usage.month));
        console.message(&format!("  Requests: {}", usage.requests));
        console.message(&format!("  Tokens:   {}", usage.tokens));
        console.message(&format!("  Cost:     ${:.4}", usage.cost));
        return Ok(());
    }

    if by_provider {
        let rows = tracker.usage_by_provider()?;
        if rows.is_empty() {
            console.message("No usage recorded yet.");
            return Ok(());
        }
        console.info("Usage by provider");
        for row in rows {
            console.message(&format!(
                "  {}/{}: {} requests, {} tokens, ${:.4}",
                row.provider, row.model, row.requests, row.tokens, row.cost
            ));
        }
        return Ok(());
    }

    let total = tracker.total_usage()?;
    console.info("All-time usage");
    console.message(&format!(
        "  Requests: {} ({} successful)",
        total.total_requests, total.successful_requests
    ));
    console.message(&format!("  Tokens:   {}", total.total_tokens));
    console.message(&format!("  Cost:     ${:.4}", total.total_cost));

    let recent = tracker.recent_usage(7)?;
    if !recent.is_empty() {
        console.newline();
        console.info("Last 7 days");
        for record in recent {
            let status = if record.success {
                "ok".green()
            } else {
                "failed".red()
            };
            console.message(&format!(
                "  {} {}/{} {} tokens ${:.4} [{status}]",
                record.timestamp, record.provider, record.model, record.tokens, record.cost
            ));
        }
    }

    Ok(())
}

/// Handle the 'config' command: show the resolved configuration with the
/// API key masked.
pub fn handle_config_command(console: &Console) -> Result<()> {
    let config = Config::load()?;

    // Write the defaults on first run so there is a file to edit
    if !Config::config_path()?.exists() {
        Config::default().save()?;
    }

    console.info("Configuration");
    console.message(&format!("  Provider:        {}", config.provider));
    console.message(&format!("  Model:           {}", config.model));
    console.message(&format!("  API key:         {}", config.masked_api_key()));
    if let Some(endpoint) = &config.api_endpoint {
        console.message(&format!("  Endpoint:        {endpoint}"));
    }
    console.message(&format!("  Max tokens:      {}", config.max_tokens));
    console.message(&format!("  Temperature:     {}", config.temperature));
    console.message(&format!("  Timeout:         {}s", config.timeout_secs));
    console.message(&format!("  Max retries:     {}", config.max_retries));
    console.message(&format!("  Format:          {}", config.commit_format));
    console.message(&format!("  Emoji:           {}", config.include_emoji));
    console.message(&format!(
        "  Subject length:  {}",
        config.max_subject_length
    ));
    console.message(&format!("  Track usage:     {}", config.track_usage));
    match config.monthly_cost_limit {
        Some(limit) => console.message(&format!("  Monthly limit:   ${limit:.2}")),
        None => console.message("  Monthly limit:   none"),
    }
    console.message(&format!(
        "  Config file:     {}",
        Config::config_path()?.display()
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_config_values() {
        let mut config = Config::default();
        GenOverrides {
            provider: Some("anthropic".to_string()),
            model: Some("claude-3-haiku-20240307".to_string()),
            api_key: Some("sk-ant-cli".to_string()),
            verbose: true,
        }
        .apply(&mut config);

        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.model, "claude-3-haiku-20240307");
        assert_eq!(config.api_key.as_deref(), Some("sk-ant-cli"));
        assert!(config.verbose);
    }

    #[test]
    fn empty_overrides_leave_config_untouched() {
        let mut config = Config {
            api_key: Some("sk-from-file".to_string()),
            ..Config::default()
        };
        GenOverrides::default().apply(&mut config);

        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_key.as_deref(), Some("sk-from-file"));
        assert!(!config.verbose);
    }
}
