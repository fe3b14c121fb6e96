// src/config.rs
// Environment-based configuration - single source of truth for all env vars

use tracing::warn;

/// Default context window size in tokens.
pub const DEFAULT_MAX_TOKENS: u64 = 200_000;
/// Default usage ratio above which reminders begin.
pub const DEFAULT_THRESHOLD: f64 = 0.95;

/// Reminder configuration loaded once per invocation.
///
/// Immutable for the process lifetime; the hook is re-launched per tool
/// call, so there is no reload path.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Context window size in tokens (CONTEXT_REMINDER_MAX_TOKENS)
    pub max_tokens: u64,
    /// Usage ratio in (0, 1] that triggers reminders (CONTEXT_REMINDER_THRESHOLD)
    pub threshold: f64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ReminderConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to the defaults. A zero max_tokens is
    /// kept verbatim: the usage calculator refuses to divide by it and the
    /// setup report flags it, which beats silently substituting a guess.
    pub fn from_env() -> Self {
        let max_tokens = read_var("CONTEXT_REMINDER_MAX_TOKENS")
            .map(|v| parse_max_tokens(&v))
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let threshold = read_var("CONTEXT_REMINDER_THRESHOLD")
            .map(|v| parse_threshold(&v))
            .unwrap_or(DEFAULT_THRESHOLD);

        Self {
            max_tokens,
            threshold,
        }
    }

    /// The threshold as an integer percentage.
    pub fn threshold_percent(&self) -> u32 {
        (self.threshold * 100.0).floor() as u32
    }

    /// Validate the configuration for the setup report.
    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        if self.max_tokens == 0 {
            validation.add_error(
                "CONTEXT_REMINDER_MAX_TOKENS is 0; reminders are disabled until it is positive",
            );
        }

        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            validation.add_error(format!(
                "threshold {} is outside (0, 1]",
                self.threshold
            ));
        } else if self.threshold < 0.5 {
            validation.add_warning(format!(
                "threshold {} is unusually low; reminders will fire on most tool calls",
                self.threshold
            ));
        }

        validation
    }
}

/// Read a single env var, filtering empty values.
fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_max_tokens(value: &str) -> u64 {
    match value.trim().parse::<u64>() {
        Ok(n) => n,
        Err(_) => {
            warn!(value, "Unparseable CONTEXT_REMINDER_MAX_TOKENS, using default");
            DEFAULT_MAX_TOKENS
        }
    }
}

fn parse_threshold(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(t) if t > 0.0 && t <= 1.0 => t,
        Ok(t) => {
            warn!(
                threshold = t,
                "CONTEXT_REMINDER_THRESHOLD outside (0, 1], using default"
            );
            DEFAULT_THRESHOLD
        }
        Err(_) => {
            warn!(value, "Unparseable CONTEXT_REMINDER_THRESHOLD, using default");
            DEFAULT_THRESHOLD
        }
    }
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warn in &self.warnings {
                lines.push(format!("  - {}", warn));
            }
        }

        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}
