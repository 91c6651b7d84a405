//! Terminal output handle
//!
//! All user-facing output goes through a `Console` constructed from the CLI
//! flags and passed down through the command handlers.

use crate::git::DiffSummary;
use crate::message::GeneratedMessage;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct Console {
    quiet: bool,
}

impl Console {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn spinner(&self, message: &str) -> ProgressBar {
        // Don't create a spinner in quiet mode
        if self.quiet {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan.bold} {msg}")
                .expect("Could not set spinner style"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        pb
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{}", message.cyan().bold());
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{}", message.yellow().bold());
        }
    }

    pub fn error(&self, message: &str) {
        // Always print errors, even in quiet mode
        eprintln!("{}", message.red().bold());
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{}", message.green().bold());
        }
    }

    /// Print a simple message (respects quiet mode)
    pub fn message(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    /// Print an empty line (respects quiet mode)
    pub fn newline(&self) {
        if !self.quiet {
            println!();
        }
    }

    pub fn version(&self, version: &str) {
        if !self.quiet {
            println!(
                "{} {} {}",
                "✒ Git-Quill".magenta().bold(),
                "version".cyan(),
                version.green()
            );
        }
    }

    /// Show the staged files with their change kind, then a one-line stat.
    pub fn diff_summary(&self, summary: &DiffSummary) {
        if self.quiet {
            return;
        }

        println!("{}", "Staged changes:".cyan().bold());
        for file in &summary.files_changed {
            let code = summary.change_types.get(file).copied().unwrap_or('M');
            let symbol = match code {
                'A' => "A".green(),
                'D' => "D".red(),
                'R' => "R".yellow(),
                _ => "M".yellow(),
            };
            println!("  {symbol} {file}");
        }
        println!(
            "  {} added, {} removed",
            format!("+{}", summary.additions).green(),
            format!("-{}", summary.deletions).red()
        );
    }

    /// Render one generated message inside a border, with its metering line.
    pub fn commit_message(&self, message: &GeneratedMessage) {
        if self.quiet {
            return;
        }

        println!("{}", "━".repeat(50).bright_purple());
        println!("{}", message.format());
        println!("{}", "━".repeat(50).bright_purple());
        println!(
            "{}",
            format!(
                "{} / {} | {} tokens | ${:.4}",
                message.provider, message.model, message.tokens_used, message.cost_usd
            )
            .dimmed()
        );
    }
}
