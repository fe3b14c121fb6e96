// src/cli/usage.rs
// CLI handler for `context-reminder usage`

use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use crate::config::ReminderConfig;
use crate::engine::{self, Decision, WarnState};
use crate::state::StateStore;
use crate::transcript;

/// Format a number with comma separators (e.g. 1234567 -> "1,234,567")
fn fmt_num(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Run the usage command. Read-only: never touches the state store.
pub fn run(transcript_arg: Option<String>) -> Result<()> {
    let path = resolve_transcript(transcript_arg)?;
    let config = ReminderConfig::from_env();

    let scan = transcript::scan_file(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    println!("Transcript: {}", path.display());
    println!();

    let Some(usage) = scan.last_usage else {
        println!("No token usage recorded yet.");
        return Ok(());
    };

    println!("--- Latest Usage ---");
    println!("  Input tokens:     {}", fmt_num(usage.input_tokens));
    println!("  Cache read:       {}", fmt_num(usage.cache_read_input_tokens));
    println!("  Cache creation:   {}", fmt_num(usage.cache_creation_input_tokens));
    println!("  Output tokens:    {}", fmt_num(usage.output_tokens));
    println!("  Total context:    {}", fmt_num(usage.total_context()));
    println!("  Usage entries:    {}", fmt_num(scan.usage_entries));
    if scan.parse_errors > 0 {
        println!("  Parse errors:     {}", fmt_num(scan.parse_errors));
    }
    println!();

    println!("--- Reminder ---");
    let Some(ratio) = engine::usage_ratio(usage.total_context(), config.max_tokens) else {
        println!("  Window:           misconfigured (max_tokens is 0), reminders disabled");
        return Ok(());
    };

    println!(
        "  Window:           {}% of {} tokens",
        engine::percent(ratio),
        fmt_num(config.max_tokens)
    );
    println!("  Threshold:        {}%", config.threshold_percent());

    let key = StateStore::session_key(&path.to_string_lossy());
    let state = WarnState::from_stored(StateStore::open_default().load(&key));
    match state {
        WarnState::Quiet => println!("  Last warned:      never"),
        WarnState::Warned(p) => println!("  Last warned:      {}%", p),
    }

    match engine::evaluate(state, ratio, config.threshold) {
        Decision::Warn(p) => println!("  Next tool call:   would warn at {}%", p),
        Decision::Reset => println!("  Next tool call:   would reset the stored warning"),
        Decision::Stay => println!("  Next tool call:   silent"),
    }

    Ok(())
}

/// Resolve the transcript argument to a path.
///
/// Accepts a path to a .jsonl file, or nothing, in which case the newest
/// session for the current working directory is used. Claude Code stores
/// sessions in ~/.claude/projects/<slug>/ where the slug is the absolute
/// CWD path with '/' replaced by '-'.
fn resolve_transcript(arg: Option<String>) -> Result<PathBuf> {
    if let Some(ref s) = arg {
        let path = PathBuf::from(s);
        if path.exists() && path.extension().is_some_and(|e| e == "jsonl") {
            return Ok(path);
        } else if path.exists() {
            bail!("File exists but is not a .jsonl file: {s}");
        }
        bail!("Transcript not found: {s}");
    }

    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    let slug = cwd.to_string_lossy().replace('/', "-");
    let project_dir = dirs::home_dir()
        .context("Could not determine home directory")?
        .join(".claude/projects")
        .join(&slug);

    let mut newest: Option<(PathBuf, std::time::SystemTime)> = None;
    if project_dir.exists() {
        for file in std::fs::read_dir(&project_dir)?.flatten() {
            let fpath = file.path();
            if fpath.extension().is_some_and(|e| e == "jsonl")
                && let Ok(meta) = fpath.metadata()
                && let Ok(modified) = meta.modified()
                && newest.as_ref().is_none_or(|(_, t)| modified > *t)
            {
                newest = Some((fpath, modified));
            }
        }
    }

    match newest {
        Some((path, _)) => Ok(path),
        None => bail!("No session transcripts found. Provide a transcript path."),
    }
}
