// src/hooks/post_tool.rs
// PostToolUse hook handler - warns when the context window fills up
//
// Fires after every tool call. Reads the latest token usage from the
// session transcript and emits a one-line systemMessage once usage crosses
// the configured threshold, then again at each further 1% increase. The
// hook is attached to the user's every action, so every failure path
// degrades to a neutral output instead of an error.

use anyhow::Result;
use std::path::Path;

use crate::config::ReminderConfig;
use crate::engine;
use crate::hooks::{HookTimer, read_hook_input, write_hook_output};
use crate::state::StateStore;
use crate::transcript;

/// PostToolUse hook input from Claude Code
#[derive(Debug)]
struct PostToolInput {
    transcript_path: Option<String>,
}

impl PostToolInput {
    fn from_json(json: &serde_json::Value) -> Self {
        Self {
            transcript_path: json
                .get("transcript_path")
                .and_then(|v| v.as_str())
                .filter(|p| !p.is_empty())
                .map(|s| s.to_string()),
        }
    }
}

/// Run PostToolUse hook
pub fn run() -> Result<()> {
    let _timer = HookTimer::start("PostToolUse");

    let input = match read_hook_input() {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "Invalid hook input, staying silent");
            write_hook_output(&serde_json::json!({}));
            return Ok(());
        }
    };

    let Some(transcript_path) = PostToolInput::from_json(&input).transcript_path else {
        write_hook_output(&serde_json::json!({}));
        return Ok(());
    };

    let config = ReminderConfig::from_env();
    let store = StateStore::open_default();

    match reminder_for_transcript(&transcript_path, &config, &store) {
        Some(percent) => write_hook_output(&serde_json::json!({
            "continue": true,
            "systemMessage": reminder_message(percent),
        })),
        None => write_hook_output(&serde_json::json!({})),
    }

    Ok(())
}

/// Decide whether a reminder is due for this transcript, updating the
/// stored warning state. Returns the percentage to announce, or None.
pub fn reminder_for_transcript(
    transcript_path: &str,
    config: &ReminderConfig,
    store: &StateStore,
) -> Option<u32> {
    let scan = match transcript::scan_file(Path::new(transcript_path)) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(error = %e, path = transcript_path, "Could not read transcript");
            return None;
        }
    };

    let snapshot = scan.last_usage?;

    let Some(ratio) = engine::usage_ratio(snapshot.total_context(), config.max_tokens) else {
        tracing::warn!("CONTEXT_REMINDER_MAX_TOKENS is 0, skipping reminder");
        return None;
    };

    let key = StateStore::session_key(transcript_path);
    engine::check_and_update(store, &key, ratio, config.threshold)
}

fn reminder_message(percent: u32) -> String {
    format!("\u{26a0}\u{fe0f} Context {percent}% full - consider wrapping up or compacting soon")
}
