//! Command dispatch: bridges CLI args -> console operations -> output formatting.

pub mod clusters;
pub mod config_cmd;
pub mod items;
pub mod util;

use ignite_console_core::{ConfigurationBackend, Console, ItemType};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch<B: ConfigurationBackend>(
    cmd: Command,
    console: &Console<B>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Clusters(args) => clusters::handle(console, args, global).await,
        Command::Caches(args) => items::handle(console, ItemType::Caches, args, global).await,
        Command::Models(args) => items::handle(console, ItemType::Models, args, global).await,
        Command::Igfss(args) => items::handle(console, ItemType::Igfss, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "handled without a backend connection".into(),
        }),
    }
}
