//! Audit logging for rig commands.
//!
//! Every CLI invocation appends one JSONL entry to `<home>/action.log`.
//! Logging never fails a command; problems are reported as warnings on
//! stderr and the command result stands.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mask;

/// A single audit log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// ISO 8601 timestamp when the action occurred
    pub timestamp: DateTime<Utc>,

    /// Storage home the command ran against
    pub home: String,

    /// Command name (e.g., "schema create", "push")
    pub command: String,

    /// Command arguments as JSON, sensitive values redacted
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Append an entry to the audit log under `home`.
pub fn log_action(
    home: &Path,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    let entry = ActionLog {
        timestamp: Utc::now(),
        home: home.to_string_lossy().to_string(),
        command: command.to_string(),
        args: sanitize_args(&args),
        success,
        error,
        duration_ms,
        user: current_user(),
    };

    if let Err(e) = write_entry(&home.join("action.log"), &entry) {
        eprintln!("Warning: Failed to write audit log: {}", e);
    }
}

fn write_entry(path: &Path, entry: &ActionLog) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)
}

/// Redact sensitive data from logged arguments.
fn sanitize_args(args: &serde_json::Value) -> serde_json::Value {
    match args {
        serde_json::Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, value) in map {
                if mask::is_sensitive(key) {
                    sanitized.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    sanitized.insert(key.clone(), sanitize_args(value));
                }
            }
            serde_json::Value::Object(sanitized)
        }
        serde_json::Value::Array(arr) => {
            if arr.len() > 10 {
                serde_json::Value::String(format!("[Array with {} items]", arr.len()))
            } else {
                serde_json::Value::Array(arr.iter().map(sanitize_args).collect())
            }
        }
        serde_json::Value::String(s) => {
            // Filesystem paths shrink to their basename
            let sanitized = if s.starts_with('/') || s.contains('\\') {
                s.rsplit(['/', '\\']).next().unwrap_or(s).to_string()
            } else {
                s.clone()
            };

            if sanitized.len() > 100 {
                serde_json::Value::String(format!(
                    "{}... ({} chars)",
                    &sanitized[..97],
                    sanitized.len()
                ))
            } else {
                serde_json::Value::String(sanitized)
            }
        }
        _ => args.clone(),
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
