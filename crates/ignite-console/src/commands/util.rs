//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;

use ignite_console_core::{Confirm, CoreError, EntityId};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, refuses instead of hanging.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Answers the engine's own questions (discarding changes, removing
/// items) on the terminal.
pub struct PromptConfirm {
    pub yes: bool,
}

impl Confirm for PromptConfirm {
    fn confirm(&self, message: &str) -> Result<bool, CoreError> {
        if self.yes {
            return Ok(true);
        }
        if !std::io::stdin().is_terminal() {
            return Ok(false);
        }
        dialoguer::Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .map_err(|e| CoreError::Internal(format!("prompt failed: {e}")))
    }
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON in {}: {e}", path.display()),
    })
}

/// Spinner on stderr while a request runs. Hidden in quiet mode and when
/// stderr is not a terminal.
pub fn spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Map a missing-entity error onto the resource the user asked for.
pub fn not_found_as(err: CoreError, resource_type: &str, id: &EntityId) -> CliError {
    match err {
        CoreError::NotFound { .. } => CliError::NotFound {
            resource_type: resource_type.into(),
            identifier: id.to_string(),
            list_command: "clusters list".into(),
        },
        other => other.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn yes_flag_skips_the_prompt() {
        assert!(confirm("Remove?", "clusters remove", true).unwrap());
        assert!(PromptConfirm { yes: true }.confirm("Discard?").unwrap());
    }

    #[test]
    fn not_found_names_the_resource() {
        let err = not_found_as(
            CoreError::NotFound {
                identifier: "x".into(),
            },
            "cluster",
            &EntityId::from("c9"),
        );
        assert_eq!(err.to_string(), "cluster 'c9' not found");
    }

    #[test]
    fn malformed_file_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_json_file::<serde_json::Value>(&path).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }
}
