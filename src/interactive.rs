//! Interactive review of generated commit messages

use crate::errors::QuillError;
use crate::ui::Console;
use anyhow::Result;
use colored::Colorize;
use dialoguer::{Confirm, Editor, Select, theme::ColorfulTheme};

enum ReviewAction {
    Accept,
    Edit,
    Cancel,
}

/// Let the user pick one of the candidate messages, then accept, edit, or
/// cancel. Returns `None` when the user cancels.
pub fn review_and_edit(console: &Console, candidates: &[String]) -> Result<Option<String>> {
    if candidates.is_empty() {
        return Err(QuillError::Configuration(
            "no candidate messages to review".to_string(),
        )
        .into());
    }

    let mut selected = if candidates.len() == 1 {
        candidates[0].clone()
    } else {
        let subjects: Vec<&str> = candidates
            .iter()
            .map(|m| m.lines().next().unwrap_or(""))
            .collect();

        let index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Which message?")
            .items(&subjects)
            .default(0)
            .interact()
            .map_err(classify_prompt_error)?;

        candidates[index].clone()
    };

    loop {
        console.newline();
        console.message(&selected);
        console.newline();

        let action = prompt_action()?;
        match action {
            ReviewAction::Accept => return Ok(Some(selected)),
            ReviewAction::Edit => {
                if let Some(edited) = edit_message(console, &selected)? {
                    selected = edited;
                }
            }
            ReviewAction::Cancel => return Ok(None),
        }
    }
}

fn prompt_action() -> Result<ReviewAction> {
    let choices = ["Accept", "Edit", "Cancel"];
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Use this commit message?")
        .items(&choices)
        .default(0)
        .interact()
        .map_err(classify_prompt_error)?;

    Ok(match index {
        0 => ReviewAction::Accept,
        1 => ReviewAction::Edit,
        _ => ReviewAction::Cancel,
    })
}

fn edit_message(console: &Console, current: &str) -> Result<Option<String>> {
    let Some(edited) = Editor::new().edit(current).map_err(classify_prompt_error)? else {
        // Editor closed without saving
        return Ok(None);
    };

    let edited = edited.trim().to_string();
    if edited.is_empty() {
        console.warning("Edited message is empty, keeping the original");
        return Ok(None);
    }

    println!("{}", "Edited message:".cyan().bold());
    println!("{edited}");

    let keep = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Keep this edit?")
        .default(true)
        .interact()
        .map_err(classify_prompt_error)?;

    Ok(if keep { Some(edited) } else { None })
}

/// Ctrl-C inside a prompt surfaces as an interrupted I/O error; give it its
/// own variant so the exit path can distinguish it from real failures.
fn classify_prompt_error(e: dialoguer::Error) -> anyhow::Error {
    match e {
        dialoguer::Error::IO(io) if io.kind() == std::io::ErrorKind::Interrupted => {
            QuillError::Interrupted.into()
        }
        other => other.into(),
    }
}
