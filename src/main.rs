// src/main.rs
// context-reminder - Context usage reminder hook for Claude Code

use anyhow::Result;
use clap::Parser;
use context_reminder::cli::{Cli, Commands, HookAction};
use context_reminder::hooks;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Load .env files (global first, then project - project overrides)
    if let Some(config_dir) = dirs::config_dir() {
        let _ = dotenvy::from_path(config_dir.join("context-reminder/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Hooks speak JSON on stdout; keep logging quiet and on stderr.
    let log_level = match &cli.command {
        Commands::Hook { .. } => Level::WARN,
        Commands::Usage { .. } | Commands::Setup { .. } => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Hook { action } => match action {
            HookAction::PostTool => {
                // A hook must never fail the tool call it is attached to:
                // log and exit 0 even when something unexpected breaks.
                if let Err(e) = hooks::post_tool::run() {
                    tracing::error!(error = %e, "PostToolUse hook failed");
                }
            }
        },
        Commands::Usage { transcript } => {
            context_reminder::cli::usage::run(transcript)?;
        }
        Commands::Setup { check, yes } => {
            context_reminder::cli::setup::run(check, yes)?;
        }
    }

    Ok(())
}
