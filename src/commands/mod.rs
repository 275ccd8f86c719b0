//! Command implementations for the rig CLI.
//!
//! Each command opens the catalog, performs its operation, and packages
//! the outcome into a result struct implementing [`Output`], which `main`
//! prints as compact JSON (the default) or human-readable text under `-H`.
//!
//! Commands are organized by entity type:
//! - `system` - init, status, version, store check, remote check
//! - `schema` - schema CRUD
//! - `sheet` - config sheet CRUD, set/unset, import/export
//! - `project` - project CRUD and environment management
//! - `verify` - validation runs with per-target outcomes
//! - `sync` - push and pull against the remote service

mod project;
mod schema;
mod sheet;
mod sync;
mod system;
mod verify;

pub use project::*;
pub use schema::*;
pub use sheet::*;
pub use sync::*;
pub use system::*;
pub use verify::*;

use crate::models::EntitySummary;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to a compact JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Compact JSON for a serializable result.
pub(crate) fn json_string<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Human lines for an entity listing: name, id, optional description.
pub(crate) fn summary_lines(noun: &str, entries: &[EntitySummary]) -> String {
    if entries.is_empty() {
        return format!("No {}s", noun);
    }
    let mut out = format!("{} {}(s):\n", entries.len(), noun);
    for entry in entries {
        out.push_str(&format!("  {}  {}", entry.name, entry.id));
        if let Some(description) = &entry.description {
            out.push_str(&format!("  {}", description));
        }
        if entry.remote.is_some() {
            out.push_str("  [synced]");
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}
