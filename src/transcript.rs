// src/transcript.rs
// Streaming reader for Claude Code session transcripts (JSONL).
//
// JSONL format (one JSON object per line). Assistant entries carry token
// usage either at the top level ({"usage": {...}}) or nested under the
// message ({"message": {"usage": {...}}}). Only the most recent
// usage-bearing entry reflects the current context window, so the scan
// keeps the last one seen and discards the rest.

use std::io::{self, BufRead};
use std::path::Path;

use serde::Deserialize;

/// Token usage from a single API call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
}

impl UsageSnapshot {
    /// Tokens currently occupying the context window: fresh input plus
    /// everything read from or written to the prompt cache. Output tokens
    /// are not part of the prompt and are excluded.
    pub fn total_context(&self) -> u64 {
        self.input_tokens + self.cache_creation_input_tokens + self.cache_read_input_tokens
    }
}

/// Result of one forward pass over a transcript.
#[derive(Debug, Clone, Default)]
pub struct TranscriptScan {
    /// The most recent usage snapshot, if any line carried one.
    pub last_usage: Option<UsageSnapshot>,
    /// How many usage-bearing entries were seen.
    pub usage_entries: u64,
    /// Candidate lines that failed to parse (trailing partial writes etc.).
    pub parse_errors: u64,
}

// ---------------------------------------------------------------------------
// Deserialization types (internal)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawEntry {
    usage: Option<RawUsage>,
    message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    usage: Option<RawUsage>,
}

#[derive(Deserialize)]
struct RawUsage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
    cache_creation_input_tokens: Option<u64>,
    cache_read_input_tokens: Option<u64>,
}

impl From<&RawUsage> for UsageSnapshot {
    fn from(raw: &RawUsage) -> Self {
        Self {
            input_tokens: raw.input_tokens.unwrap_or(0),
            output_tokens: raw.output_tokens.unwrap_or(0),
            cache_creation_input_tokens: raw.cache_creation_input_tokens.unwrap_or(0),
            cache_read_input_tokens: raw.cache_read_input_tokens.unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Scan a transcript file from disk.
pub fn scan_file(path: &Path) -> io::Result<TranscriptScan> {
    let file = std::fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    Ok(scan_from_reader(reader))
}

/// Scan JSONL entries from a string (for testing or piped input).
pub fn scan_entries(data: &str) -> TranscriptScan {
    let reader = io::BufReader::new(data.as_bytes());
    scan_from_reader(reader)
}

fn scan_from_reader<R: BufRead>(reader: R) -> TranscriptScan {
    let mut scan = TranscriptScan::default();

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => {
                scan.parse_errors += 1;
                continue;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Cheap pre-filter: most lines carry no usage and need no parse.
        if !trimmed.contains("\"usage\"") {
            continue;
        }

        let entry: RawEntry = match serde_json::from_str(trimmed) {
            Ok(e) => e,
            Err(_) => {
                scan.parse_errors += 1;
                continue;
            }
        };

        let usage = entry
            .usage
            .as_ref()
            .or_else(|| entry.message.as_ref().and_then(|m| m.usage.as_ref()));

        if let Some(raw) = usage {
            scan.last_usage = Some(UsageSnapshot::from(raw));
            scan.usage_entries += 1;
        }
    }

    scan
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_assistant_entry(input: u64, cache_read: u64, cache_create: u64) -> String {
        format!(
            r#"{{"type":"assistant","uuid":"a1","message":{{"content":[{{"type":"text","text":"hi"}}],"usage":{{"input_tokens":{},"output_tokens":42,"cache_read_input_tokens":{},"cache_creation_input_tokens":{}}}}}}}"#,
            input, cache_read, cache_create
        )
    }

    #[test]
    fn test_scan_empty() {
        let scan = scan_entries("");
        assert!(scan.last_usage.is_none());
        assert_eq!(scan.usage_entries, 0);
        assert_eq!(scan.parse_errors, 0);
    }

    #[test]
    fn test_scan_nested_usage() {
        let scan = scan_entries(&make_assistant_entry(1000, 5000, 500));
        let usage = scan.last_usage.unwrap();
        assert_eq!(usage.input_tokens, 1000);
        assert_eq!(usage.cache_read_input_tokens, 5000);
        assert_eq!(usage.cache_creation_input_tokens, 500);
        assert_eq!(usage.output_tokens, 42);
        assert_eq!(usage.total_context(), 6500);
    }

    #[test]
    fn test_scan_top_level_usage() {
        let line = r#"{"usage":{"input_tokens":200,"cache_read_input_tokens":300,"cache_creation_input_tokens":0,"output_tokens":10}}"#;
        let scan = scan_entries(line);
        assert_eq!(scan.last_usage.unwrap().total_context(), 500);
    }

    #[test]
    fn test_last_usage_entry_wins() {
        let data = [
            make_assistant_entry(100, 0, 0),
            make_assistant_entry(2000, 10000, 1000),
        ]
        .join("\n");
        let scan = scan_entries(&data);
        assert_eq!(scan.usage_entries, 2);
        assert_eq!(scan.last_usage.unwrap().total_context(), 13000);
    }

    #[test]
    fn test_lines_without_usage_skipped() {
        let data = format!(
            "{}\n{}\n{}",
            r#"{"type":"user","message":{"role":"user","content":"hello"}}"#,
            make_assistant_entry(500, 500, 0),
            r#"{"type":"progress","status":"running"}"#,
        );
        let scan = scan_entries(&data);
        assert_eq!(scan.usage_entries, 1);
        assert_eq!(scan.parse_errors, 0);
        assert_eq!(scan.last_usage.unwrap().total_context(), 1000);
    }

    #[test]
    fn test_trailing_garbage_does_not_poison_scan() {
        // A partial write mid-line is the common corruption mode.
        let data = format!(
            "{}\n{}",
            make_assistant_entry(1000, 2000, 0),
            r#"{"message":{"usage":{"input_tokens":99"#,
        );
        let scan = scan_entries(&data);
        assert_eq!(scan.parse_errors, 1);
        assert_eq!(scan.last_usage.unwrap().total_context(), 3000);
    }

    #[test]
    fn test_missing_usage_fields_default_to_zero() {
        let line = r#"{"message":{"usage":{"input_tokens":700}}}"#;
        let scan = scan_entries(line);
        let usage = scan.last_usage.unwrap();
        assert_eq!(usage.total_context(), 700);
        assert_eq!(usage.cache_read_input_tokens, 0);
    }

    #[test]
    fn test_scan_missing_file_is_io_error() {
        assert!(scan_file(Path::new("/nonexistent/transcript.jsonl")).is_err());
    }

    #[test]
    fn test_scan_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.jsonl");
        std::fs::write(&path, make_assistant_entry(1, 2, 3)).unwrap();

        let scan = scan_file(&path).unwrap();
        assert_eq!(scan.last_usage.unwrap().total_context(), 6);
    }
}
