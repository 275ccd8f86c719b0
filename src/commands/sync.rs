//! `push` and `pull` commands: wire the catalog to a remote client and
//! run the sync pass.

use std::path::Path;

use crate::remote::Client;
use crate::settings;
use crate::store::Catalog;
use crate::sync::{self, PullOptions, PullReport, PushOptions, PushReport};
use crate::Result;

use super::{json_string, Output};

impl Output for PushReport {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let dry = if self.dry_run { " (dry run)" } else { "" };
        let mut out = format!(
            "Push{} of project '{}' to {}: {} created, {} updated, {} skipped\n",
            dry, self.project, self.remote, self.created, self.updated, self.skipped
        );
        for change in &self.changes {
            out.push_str(&format!(
                "  {} '{}': {}\n",
                change.kind, change.name, change.action
            ));
        }
        out.trim_end().to_string()
    }
}

impl Output for PullReport {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let dry = if self.dry_run { " (dry run)" } else { "" };
        let mut out = format!(
            "Pull{} from {}: {} created, {} updated, {} skipped\n",
            dry, self.remote, self.created, self.updated, self.skipped
        );
        for change in &self.changes {
            out.push_str(&format!(
                "  {} '{}': {}\n",
                change.kind, change.name, change.action
            ));
        }
        out.trim_end().to_string()
    }
}

/// Push a project and its schemas and sheets to the remote.
pub fn push(
    home: &Path,
    project: &str,
    remote: Option<&str>,
    dry_run: bool,
    force: bool,
) -> Result<PushReport> {
    let catalog = Catalog::open(home)?;
    let settings = settings::resolve_remote(remote)?;
    let client = Client::from_settings(&settings);
    sync::push_project(
        &catalog,
        &client,
        &settings.base_url,
        project,
        PushOptions { dry_run, force },
    )
}

/// Pull schemas and sheets from the remote. With neither `--schemas` nor
/// `--sheets` both kinds are pulled.
pub fn pull(
    home: &Path,
    remote: Option<&str>,
    schemas: bool,
    sheets: bool,
    dry_run: bool,
    force: bool,
) -> Result<PullReport> {
    let catalog = Catalog::open(home)?;
    let settings = settings::resolve_remote(remote)?;
    let client = Client::from_settings(&settings);
    let (schemas, sheets) = if !schemas && !sheets {
        (true, true)
    } else {
        (schemas, sheets)
    };
    sync::pull(
        &catalog,
        &client,
        &settings.base_url,
        PullOptions {
            schemas,
            sheets,
            dry_run,
            force,
        },
    )
}
