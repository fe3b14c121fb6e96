// src/cli/setup.rs
// Setup for the context-reminder hook: configuration check and hook
// registration in Claude Code's user settings.

use anyhow::{Context, Result, bail};
use dialoguer::Confirm;
use serde_json::{Value, json};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::config::ReminderConfig;

/// Command registered for the PostToolUse event.
const HOOK_COMMAND: &str = "context-reminder hook post-tool";

/// Run the setup command
pub fn run(check: bool, yes: bool) -> Result<()> {
    if check {
        return run_check();
    }

    let settings_path = settings_path()?;
    let mut settings = read_settings(&settings_path);

    if hook_registered(&settings) {
        println!(
            "PostToolUse hook already registered in {}",
            settings_path.display()
        );
        return Ok(());
    }

    println!("This will add the following entry to {}:", settings_path.display());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "hooks": { "PostToolUse": [hook_entry()] } }))?
    );
    println!();

    if !yes {
        if !std::io::stdin().is_terminal() {
            bail!(
                "Setup requires an interactive terminal.\n\
                 Use --yes for non-interactive mode, or run in a terminal."
            );
        }
        if !Confirm::new()
            .with_prompt("Register the hook")
            .default(true)
            .interact()?
        {
            println!("Setup cancelled.");
            return Ok(());
        }
    }

    register_hook(&mut settings);
    write_settings(&settings_path, &settings)
        .with_context(|| format!("Failed to write {}", settings_path.display()))?;

    println!("Hook registered. New sessions will pick it up automatically.");
    Ok(())
}

/// Read-only validation: report configuration and registration status.
fn run_check() -> Result<()> {
    let config = ReminderConfig::from_env();

    println!("Configuration:");
    println!("  max_tokens: {}", config.max_tokens);
    println!("  threshold:  {} ({}%)", config.threshold, config.threshold_percent());
    println!();

    let validation = config.validate();
    println!("{}", validation.report());
    println!();

    let settings_path = settings_path()?;
    if hook_registered(&read_settings(&settings_path)) {
        println!("Hook registered in {}", settings_path.display());
    } else {
        println!(
            "Hook not registered. Run `context-reminder setup` to add it to {}",
            settings_path.display()
        );
    }

    if !validation.is_valid() {
        bail!("configuration is invalid");
    }
    Ok(())
}

/// Path to the user-level Claude Code settings file.
fn settings_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".claude").join("settings.json"))
}

/// Read the settings file, degrading to an empty object when it is missing
/// or unparseable. Unknown keys are carried through untouched.
fn read_settings(path: &Path) -> Value {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_else(|| json!({}))
}

/// Write settings atomically (temp file + rename).
fn write_settings(path: &Path, settings: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_string_pretty(settings)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// The PostToolUse matcher entry this tool installs.
fn hook_entry() -> Value {
    json!({
        "matcher": "*",
        "hooks": [{ "type": "command", "command": HOOK_COMMAND }]
    })
}

/// Whether any PostToolUse matcher already runs our command.
fn hook_registered(settings: &Value) -> bool {
    settings
        .get("hooks")
        .and_then(|h| h.get("PostToolUse"))
        .and_then(|v| v.as_array())
        .is_some_and(|entries| {
            entries.iter().any(|entry| {
                entry
                    .get("hooks")
                    .and_then(|h| h.as_array())
                    .is_some_and(|hooks| {
                        hooks.iter().any(|h| {
                            h.get("command").and_then(|c| c.as_str()) == Some(HOOK_COMMAND)
                        })
                    })
            })
        })
}

/// Append our matcher entry, creating the intermediate objects as needed.
/// Existing matchers and unrelated hook events are preserved.
fn register_hook(settings: &mut Value) {
    if !settings.is_object() {
        *settings = json!({});
    }
    let Some(root) = settings.as_object_mut() else {
        return;
    };

    let hooks = root.entry("hooks").or_insert_with(|| json!({}));
    if !hooks.is_object() {
        *hooks = json!({});
    }
    let Some(hooks_obj) = hooks.as_object_mut() else {
        return;
    };

    let post_tool = hooks_obj.entry("PostToolUse").or_insert_with(|| json!([]));
    if !post_tool.is_array() {
        *post_tool = json!([]);
    }
    if let Some(entries) = post_tool.as_array_mut() {
        entries.push(hook_entry());
    }
}
