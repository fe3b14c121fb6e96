// src/cli/mod.rs
// CLI module for context-reminder commands

use clap::{Parser, Subcommand};

pub mod setup;
pub mod usage;

#[derive(Parser)]
#[command(name = "context-reminder")]
#[command(about = "Context usage reminder hook for Claude Code")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Claude Code hook handlers
    Hook {
        #[command(subcommand)]
        action: HookAction,
    },

    /// Show current context usage for a session transcript
    Usage {
        /// Transcript path (default: newest session for the current directory)
        transcript: Option<String>,
    },

    /// Register the hook in Claude Code settings and check configuration
    Setup {
        /// Read-only validation mode: show config status without modifying
        #[arg(long)]
        check: bool,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum HookAction {
    /// Handle PostToolUse hooks - warn when context usage crosses the threshold
    PostTool,
}
