//! Git-Quill - AI-assisted commit messages
//!
//! This library turns staged Git diffs into well-formed commit messages by
//! prompting an AI provider, with interactive review, format validation, and
//! a persistent token/cost ledger.

// Allow certain clippy warnings that are stylistic
#![allow(clippy::uninlined_format_args)] // Style preference
#![allow(clippy::items_after_statements)] // Locally-scoped use statements are fine

pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod git;
pub mod interactive;
pub mod logger;
pub mod message;
pub mod prompt;
pub mod providers;
pub mod ui;
pub mod usage;
pub mod validator;

// Re-export important structs for easier testing
pub use config::Config;
pub use errors::{ProviderError, QuillError};
pub use message::GeneratedMessage;
