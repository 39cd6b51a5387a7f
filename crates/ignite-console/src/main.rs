mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ignite_console_core::RestConsole;

use crate::cli::{Cli, Command};
use crate::commands::util::PromptConfirm;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;
    match command {
        // Config commands don't need a backend connection
        Command::Config(args) => commands::config_cmd::handle(args, &global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "ignite-console", &mut std::io::stdout());
            Ok(())
        }

        // All other commands sign in, run, then sign out
        cmd => {
            let console_config = config::build_console_config(&global)?;
            let confirm = Arc::new(PromptConfirm { yes: global.yes });

            tracing::debug!(command = ?cmd, url = %console_config.url, "dispatching command");
            RestConsole::oneshot(&console_config, confirm, |console| async move {
                commands::dispatch(cmd, &console, &global).await
            })
            .await
        }
    }
}
