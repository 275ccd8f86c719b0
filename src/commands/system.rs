//! System commands: init, status, version, store check, remote check.

use std::path::Path;

use serde::Serialize;

use crate::remote::{Client, RemoteApi, SheetFilter};
use crate::settings;
use crate::store::{Catalog, StoreIssue};
use crate::Result;

use super::{json_string, Output};

#[derive(Debug, Serialize)]
pub struct InitResult {
    pub home: String,
    pub initialized: bool,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("Initialized rigging home at {}", self.home)
    }
}

/// Materialize the store directories and index files under `home`.
pub fn init(home: &Path) -> Result<InitResult> {
    let catalog = Catalog::open(home)?;
    catalog.ensure_indexes()?;
    Ok(InitResult {
        home: catalog.home().display().to_string(),
        initialized: true,
    })
}

#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub home: String,
    pub initialized: bool,
    pub schemas: usize,
    pub projects: usize,
    pub sheets: usize,
}

impl Output for StatusResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if !self.initialized {
            return format!("{}: not initialized (run 'rig init')", self.home);
        }
        format!(
            "{}: {} schema(s), {} project(s), {} sheet(s)",
            self.home, self.schemas, self.projects, self.sheets
        )
    }
}

/// Storage overview printed when `rig` runs without a subcommand.
pub fn status(home: &Path) -> Result<StatusResult> {
    let catalog = Catalog::open(home)?;
    let initialized = [
        catalog.schemas.dir(),
        catalog.projects.dir(),
        catalog.sheets.dir(),
    ]
    .iter()
    .all(|dir| dir.join("index.json").exists());
    Ok(StatusResult {
        home: catalog.home().display().to_string(),
        initialized,
        schemas: catalog.schemas.list()?.len(),
        projects: catalog.projects.list()?.len(),
        sheets: catalog.sheets.list()?.len(),
    })
}

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub commit: String,
    pub built_at: String,
}

impl Output for VersionInfo {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("rig {} ({}, built {})", self.version, self.commit, self.built_at)
    }
}

/// Package version plus the build metadata baked in by `build.rs`.
pub fn version() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("RIG_GIT_COMMIT").to_string(),
        built_at: env!("RIG_BUILD_TIMESTAMP").to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct StoreCheckResult {
    pub ok: bool,
    pub issues: Vec<StoreIssue>,
}

impl Output for StoreCheckResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.ok {
            return "Store is consistent".to_string();
        }
        let mut out = format!("{} issue(s) found:\n", self.issues.len());
        for issue in &self.issues {
            out.push_str(&format!("  {}\n", issue));
        }
        out.trim_end().to_string()
    }
}

/// Cross-check every index against the entity files on disk.
pub fn store_check(home: &Path) -> Result<StoreCheckResult> {
    let catalog = Catalog::open(home)?;
    let issues = catalog.check()?;
    Ok(StoreCheckResult {
        ok: issues.is_empty(),
        issues,
    })
}

#[derive(Debug, Serialize)]
pub struct RemoteCheckResult {
    pub remote: String,
    pub status: String,
    pub schemas: usize,
    pub projects: usize,
    pub sheets: usize,
}

impl Output for RemoteCheckResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "{}: {} ({} schema(s), {} project(s), {} sheet(s))",
            self.remote, self.status, self.schemas, self.projects, self.sheets
        )
    }
}

/// Probe the remote service: health endpoint plus entity counts.
pub fn remote_check(remote: Option<&str>) -> Result<RemoteCheckResult> {
    let settings = settings::resolve_remote(remote)?;
    let client = Client::from_settings(&settings);
    client.health()?;
    Ok(RemoteCheckResult {
        schemas: client.list_schemas()?.len(),
        projects: client.list_projects()?.len(),
        sheets: client.list_sheets(&SheetFilter::default())?.len(),
        remote: settings.base_url,
        status: "ok".to_string(),
    })
}
