use crate::commands::{self, GenOverrides};
use crate::errors::QuillError;
use crate::log_debug;
use crate::providers::ProviderKind;
use crate::ui::Console;
use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand, crate_version};
use colored::Colorize;

const LOG_FILE: &str = "git-quill-debug.log";

/// CLI structure defining the available commands and global arguments
#[derive(Parser)]
#[command(
    author,
    version = crate_version!(),
    about = "Git-Quill: AI-assisted commit messages",
    long_about = "Git-Quill turns your staged changes into a well-formed commit message using an AI provider of your choice.",
    disable_version_flag = true,
    after_help = get_dynamic_help(),
    styles = get_styles(),
)]
pub struct Cli {
    /// Subcommands available for the CLI
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log debug messages to a file
    #[arg(
        short = 'l',
        long = "log",
        global = true,
        help = "Log debug messages to a file"
    )]
    pub log: bool,

    /// Specify a custom log file path
    #[arg(
        long = "log-file",
        global = true,
        help = "Specify a custom log file path"
    )]
    pub log_file: Option<String>,

    /// Suppress non-essential output (spinners, summaries, etc.)
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress non-essential output"
    )]
    pub quiet: bool,

    /// Display the version
    #[arg(
        short = 'v',
        long = "version",
        global = true,
        help = "Display the version"
    )]
    pub version: bool,
}

/// Enumeration of available subcommands
#[derive(Subcommand)]
#[command(subcommand_negates_reqs = true)]
#[command(subcommand_precedence_over_arg = true)]
pub enum Commands {
    /// Generate a commit message from the staged changes
    #[command(
        about = "Generate a commit message using AI",
        long_about = "Generate a commit message from the staged diff, review it interactively, then commit.",
        after_help = get_dynamic_help()
    )]
    Gen {
        /// Skip the interactive review and use the first message as-is
        #[arg(long, help = "Skip the interactive review step")]
        no_review: bool,

        /// Number of candidate messages to generate
        #[arg(
            short = 'n',
            long,
            default_value_t = 1,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=5),
            help = "Number of candidate messages to generate (1-5)"
        )]
        count: usize,

        /// Override the configured provider for this run
        #[arg(long, help = "Override the configured provider for this run")]
        provider: Option<String>,

        /// Override the configured model for this run
        #[arg(long, help = "Override the configured model for this run")]
        model: Option<String>,

        /// Override the configured API key for this run
        #[arg(long, help = "Override the configured API key for this run")]
        api_key: Option<String>,

        /// Print the generated message to stdout and exit
        #[arg(short, long, help = "Print the generated message to stdout and exit")]
        print: bool,

        /// Show repository details and full error chains
        #[arg(long, help = "Show repository details and full error chains")]
        verbose: bool,
    },

    /// Report on recorded token usage and costs
    #[command(about = "Show token usage and cost statistics")]
    Usage {
        /// Show the current calendar month only
        #[arg(long, help = "Show the current calendar month only")]
        monthly: bool,

        /// Break the totals down by provider and model
        #[arg(long, help = "Break the totals down by provider and model")]
        by_provider: bool,
    },

    /// Show the resolved configuration
    #[command(about = "Show the resolved configuration with the API key masked")]
    Config,
}

/// Define custom styles for Clap
fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Magenta.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .valid(AnsiColor::Blue.on_default().bold())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

/// Parse the command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Generate dynamic help including available providers
fn get_dynamic_help() -> String {
    let providers_list = ProviderKind::all_names()
        .iter()
        .map(|p| format!("{}", p.bold()))
        .collect::<Vec<_>>()
        .join(" | ");

    format!("\nAvailable providers: {providers_list}")
}

/// Main function to parse arguments and handle the command, returning the
/// process exit code.
pub async fn main() -> i32 {
    let cli = parse_args();
    let console = Console::new(cli.quiet);

    if cli.version {
        console.version(crate_version!());
        return 0;
    }

    let verbose = verbose_requested(&cli)
        || std::env::var("GIT_QUILL_VERBOSE").is_ok_and(|v| !v.is_empty());

    if cli.log {
        crate::logger::enable_logging();
        let log_file = cli.log_file.as_deref().unwrap_or(LOG_FILE);
        if let Err(e) = crate::logger::set_log_file(log_file) {
            return report_error(&anyhow::Error::new(e), verbose);
        }
    } else {
        crate::logger::disable_logging();
    }

    let Some(command) = cli.command else {
        // If no subcommand is provided, print the help
        let _ = Cli::parse_from(["git-quill", "--help"]);
        return 0;
    };

    match handle_command(command, &console).await {
        Ok(()) => 0,
        Err(e) => report_error(&e, verbose),
    }
}

/// Whether the run asked for verbose output on the command line.
fn verbose_requested(cli: &Cli) -> bool {
    matches!(cli.command, Some(Commands::Gen { verbose: true, .. }))
}

/// Print a failure and choose the exit code: 130 for a user interrupt, 1 for
/// everything else. The full cause chain appears only in verbose mode.
fn report_error(e: &anyhow::Error, verbose: bool) -> i32 {
    let code = error_exit_code(e);
    if code == 130 {
        eprintln!("{}", "Interrupted".yellow().bold());
        return code;
    }

    eprintln!("{}", format!("Error: {e}").red().bold());
    if verbose {
        eprintln!("{}", format!("{e:?}").red());
    }
    code
}

fn error_exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<QuillError>() {
        Some(QuillError::Interrupted) => 130,
        _ => 1,
    }
}

/// Handle the command based on parsed arguments
pub async fn handle_command(command: Commands, console: &Console) -> anyhow::Result<()> {
    match command {
        Commands::Gen {
            no_review,
            count,
            provider,
            model,
            api_key,
            print,
            verbose,
        } => {
            log_debug!(
                "Handling 'gen' with no_review: {}, count: {}, provider: {:?}, model: {:?}, print: {}, verbose: {}",
                no_review,
                count,
                provider,
                model,
                print,
                verbose
            );
            commands::handle_gen_command(
                console,
                GenOverrides {
                    provider,
                    model,
                    api_key,
                    verbose,
                },
                count,
                no_review,
                print,
            )
            .await
        }
        Commands::Usage {
            monthly,
            by_provider,
        } => {
            log_debug!(
                "Handling 'usage' with monthly: {}, by_provider: {}",
                monthly,
                by_provider
            );
            commands::handle_usage_command(console, monthly, by_provider)
        }
        Commands::Config => {
            log_debug!("Handling 'config'");
            commands::handle_config_command(console)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen_verbose_flag_is_detected() {
        let cli = Cli::parse_from(["git-quill", "gen", "--verbose"]);
        assert!(verbose_requested(&cli));

        let cli = Cli::parse_from(["git-quill", "gen"]);
        assert!(!verbose_requested(&cli));
    }

    #[test]
    fn gen_accepts_an_api_key_override() {
        let cli = Cli::parse_from(["git-quill", "gen", "--api-key", "sk-cli"]);
        match cli.command {
            Some(Commands::Gen { api_key, .. }) => {
                assert_eq!(api_key.as_deref(), Some("sk-cli"));
            }
            _ => panic!("expected the gen subcommand"),
        }
    }

    #[test]
    fn interrupts_exit_130_and_failures_exit_1() {
        let interrupt: anyhow::Error = QuillError::Interrupted.into();
        assert_eq!(error_exit_code(&interrupt), 130);

        let failure: anyhow::Error = QuillError::NoStagedChanges.into();
        assert_eq!(error_exit_code(&failure), 1);
    }
}
