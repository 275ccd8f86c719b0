//! Push and pull reconciliation between the local catalog and a remote
//! service.
//!
//! Both directions follow the same last-writer-wins policy from
//! [`crate::remote::convert`]: the side with the newer timestamp wins,
//! with a one-second allowance for clock skew. Losing concurrent edits
//! are overwritten, not merged.

pub mod pull;
pub mod push;

pub use pull::{PullOptions, pull};
pub use push::{PushOptions, push_project};

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a sync pass did (or, under dry-run, would do) with one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Create,
    Update,
    Skip,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncAction::Create => "create",
            SyncAction::Update => "update",
            SyncAction::Skip => "skip",
        };
        write!(f, "{}", s)
    }
}

/// One entity's outcome within a sync report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncChange {
    /// Entity type label, matching the store's wording
    pub kind: String,
    pub name: String,
    pub id: String,
    pub action: SyncAction,
}

/// Outcome of a project push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushReport {
    pub remote: String,
    pub project: String,
    pub dry_run: bool,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub changes: Vec<SyncChange>,
}

impl PushReport {
    pub fn new(remote: &str, project: &str, dry_run: bool) -> Self {
        Self {
            remote: remote.to_string(),
            project: project.to_string(),
            dry_run,
            created: 0,
            updated: 0,
            skipped: 0,
            changes: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, kind: &str, name: &str, id: &str, action: SyncAction) {
        match action {
            SyncAction::Create => self.created += 1,
            SyncAction::Update => self.updated += 1,
            SyncAction::Skip => self.skipped += 1,
        }
        self.changes.push(SyncChange {
            kind: kind.to_string(),
            name: name.to_string(),
            id: id.to_string(),
            action,
        });
    }
}

/// Outcome of a pull.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullReport {
    pub remote: String,
    pub dry_run: bool,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub changes: Vec<SyncChange>,
}

impl PullReport {
    pub fn new(remote: &str, dry_run: bool) -> Self {
        Self {
            remote: remote.to_string(),
            dry_run,
            created: 0,
            updated: 0,
            skipped: 0,
            changes: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, kind: &str, name: &str, id: &str, action: SyncAction) {
        match action {
            SyncAction::Create => self.created += 1,
            SyncAction::Update => self.updated += 1,
            SyncAction::Skip => self.skipped += 1,
        }
        self.changes.push(SyncChange {
            kind: kind.to_string(),
            name: name.to_string(),
            id: id.to_string(),
            action,
        });
    }
}
