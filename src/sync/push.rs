//! Dependency-ordered project push.
//!
//! A push walks the project's full reference graph before touching the
//! remote: schemas go up parents-first, then the project record, then
//! each environment's config sheet. Remote entities are matched by name,
//! so a rename locally creates a new remote entity rather than updating
//! the old one.

use std::collections::{BTreeSet, HashMap};

use crate::models::{ConfigSheet, Project, SchemaRef, environment_sheet_name};
use crate::remote::RemoteApi;
use crate::remote::convert::{self, should_push};
use crate::store::{Catalog, Record, Store};
use crate::sync::{PushReport, SyncAction};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions {
    /// Plan and report without issuing any mutating call.
    pub dry_run: bool,
    /// Overwrite the remote copy even when it is newer.
    pub force: bool,
}

/// Push one project and everything it references to the remote.
///
/// Failures abort immediately with an error naming the entity; entities
/// already pushed in the same invocation stay pushed.
pub fn push_project(
    catalog: &Catalog,
    remote: &dyn RemoteApi,
    remote_url: &str,
    project_name: &str,
    opts: PushOptions,
) -> Result<PushReport> {
    let project = catalog.projects.get(project_name)?;
    let mut pusher = Pusher {
        catalog,
        remote,
        remote_url,
        opts,
        pushed: HashMap::new(),
        report: PushReport::new(remote_url, &project.entity.name, opts.dry_run),
    };
    pusher.run(&project)?;
    Ok(pusher.report)
}

/// State for one push invocation. `pushed` maps schema names to remote
/// guids, doubling as the processed set that terminates cyclic extends
/// graphs.
struct Pusher<'a> {
    catalog: &'a Catalog,
    remote: &'a dyn RemoteApi,
    remote_url: &'a str,
    opts: PushOptions,
    pushed: HashMap<String, String>,
    report: PushReport,
}

impl Pusher<'_> {
    fn run(&mut self, project: &Project) -> Result<()> {
        // Discovery resolves every reference up front, so a sheet that
        // cannot be pushed aborts before the first remote call.
        let schema_names = self.discover_schema_names(project)?;
        for name in &schema_names {
            self.push_schema(name)?;
        }

        let project_guid = self.push_project_record(project)?;

        for environment in project.environment_names() {
            let sheet_name = environment_sheet_name(&project.entity.name, &environment);
            let sheet = self.catalog.sheets.get(&sheet_name)?;
            let schema_guid = self.sheet_schema_guid(project, &sheet)?;
            self.push_sheet(sheet, &project_guid, &schema_guid)?;
        }
        Ok(())
    }

    /// Schema names referenced by the project or any environment sheet.
    fn discover_schema_names(&self, project: &Project) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();

        if let Some(key) = &project.schema {
            let schema = self.catalog.schemas.get(key)?;
            names.insert(schema.entity.name);
        }

        for environment in project.environment_names() {
            let sheet_name = environment_sheet_name(&project.entity.name, &environment);
            let sheet = self.catalog.sheets.get(&sheet_name)?;
            match &sheet.schema {
                Some(reference @ SchemaRef::Reference(_)) => {
                    let key = reference.target().unwrap_or_default();
                    let schema = self.catalog.schemas.get(key)?;
                    names.insert(schema.entity.name);
                }
                Some(SchemaRef::Inline(_)) => {
                    return Err(inline_sheet_error(&sheet.entity.name));
                }
                // No reference: the sheet rides on the project's schema.
                None => {}
            }
        }

        Ok(names)
    }

    /// Push a schema after its `extends` parents. Names already in
    /// `pushed` are not pushed again, which deduplicates shared parents
    /// and terminates cycles.
    fn push_schema(&mut self, name_or_id: &str) -> Result<()> {
        let mut schema = self.catalog.schemas.get(name_or_id)?;
        let name = schema.entity.name.clone();
        if self.pushed.contains_key(&name) {
            return Ok(());
        }
        self.pushed.insert(name.clone(), schema.entity.id.clone());

        for parent_key in schema.extends.clone() {
            self.push_schema(&parent_key)?;
        }

        let dto = convert::schema_to_wire(&schema);
        let found = self
            .remote
            .find_schema(&name)
            .map_err(|e| push_error("schema", &name, e))?;
        match found {
            None => {
                self.report
                    .record("schema", &name, &schema.entity.id, SyncAction::Create);
                if !self.opts.dry_run {
                    let created = self
                        .remote
                        .create_schema(&dto)
                        .map_err(|e| push_error("schema", &name, e))?;
                    self.pushed.insert(name, created.guid);
                    self.mark_remote(&self.catalog.schemas, &mut schema)?;
                }
            }
            Some(existing) => {
                self.pushed.insert(name.clone(), existing.guid.clone());
                if should_push(
                    schema.entity.updated_at,
                    existing.updated_at.time(),
                    self.opts.force,
                ) {
                    self.report
                        .record("schema", &name, &existing.guid, SyncAction::Update);
                    if !self.opts.dry_run {
                        self.remote
                            .update_schema(&existing.guid, &dto)
                            .map_err(|e| push_error("schema", &name, e))?;
                        self.mark_remote(&self.catalog.schemas, &mut schema)?;
                    }
                } else {
                    self.report
                        .record("schema", &name, &existing.guid, SyncAction::Skip);
                }
            }
        }
        Ok(())
    }

    fn push_project_record(&mut self, project: &Project) -> Result<String> {
        let name = project.entity.name.clone();
        let default_schema_guid = match &project.schema {
            Some(key) => Some(self.remote_schema_guid(key)?),
            None => None,
        };

        let mut local = project.clone();
        let dto = convert::project_to_wire(&local, default_schema_guid);
        let found = self
            .remote
            .find_project(&name)
            .map_err(|e| push_error("project", &name, e))?;
        match found {
            None => {
                self.report
                    .record("project", &name, &local.entity.id, SyncAction::Create);
                if self.opts.dry_run {
                    Ok(local.entity.id.clone())
                } else {
                    let created = self
                        .remote
                        .create_project(&dto)
                        .map_err(|e| push_error("project", &name, e))?;
                    self.mark_remote(&self.catalog.projects, &mut local)?;
                    Ok(created.guid)
                }
            }
            Some(existing) => {
                if should_push(
                    local.entity.updated_at,
                    existing.updated_at.time(),
                    self.opts.force,
                ) {
                    self.report
                        .record("project", &name, &existing.guid, SyncAction::Update);
                    if !self.opts.dry_run {
                        self.remote
                            .update_project(&existing.guid, &dto)
                            .map_err(|e| push_error("project", &name, e))?;
                        self.mark_remote(&self.catalog.projects, &mut local)?;
                    }
                } else {
                    self.report
                        .record("project", &name, &existing.guid, SyncAction::Skip);
                }
                Ok(existing.guid)
            }
        }
    }

    fn push_sheet(
        &mut self,
        sheet: ConfigSheet,
        project_guid: &str,
        schema_guid: &str,
    ) -> Result<()> {
        let mut local = sheet;
        let name = local.entity.name.clone();
        let dto = convert::sheet_to_wire(&local, project_guid, schema_guid);
        let found = self
            .remote
            .find_sheet(&name)
            .map_err(|e| push_error("config sheet", &name, e))?;
        match found {
            None => {
                self.report
                    .record("config sheet", &name, &local.entity.id, SyncAction::Create);
                if !self.opts.dry_run {
                    self.remote
                        .create_sheet(&dto)
                        .map_err(|e| push_error("config sheet", &name, e))?;
                    self.mark_remote(&self.catalog.sheets, &mut local)?;
                }
            }
            Some(existing) => {
                if should_push(
                    local.entity.updated_at,
                    existing.updated_at.time(),
                    self.opts.force,
                ) {
                    self.report
                        .record("config sheet", &name, &existing.guid, SyncAction::Update);
                    if !self.opts.dry_run {
                        self.remote
                            .update_sheet(&existing.guid, &dto)
                            .map_err(|e| push_error("config sheet", &name, e))?;
                        self.mark_remote(&self.catalog.sheets, &mut local)?;
                    }
                } else {
                    self.report
                        .record("config sheet", &name, &existing.guid, SyncAction::Skip);
                }
            }
        }
        Ok(())
    }

    /// Remote schema guid for a sheet. A sheet without its own reference
    /// inherits the project's schema; a project without one leaves the
    /// guid empty.
    fn sheet_schema_guid(&self, project: &Project, sheet: &ConfigSheet) -> Result<String> {
        let key = match &sheet.schema {
            Some(reference @ SchemaRef::Reference(_)) => {
                reference.target().unwrap_or_default().to_string()
            }
            Some(SchemaRef::Inline(_)) => {
                return Err(inline_sheet_error(&sheet.entity.name));
            }
            None => match &project.schema {
                Some(key) => key.clone(),
                None => return Ok(String::new()),
            },
        };
        self.remote_schema_guid(&key)
    }

    fn remote_schema_guid(&self, key: &str) -> Result<String> {
        let schema = self.catalog.schemas.get(key)?;
        Ok(self
            .pushed
            .get(&schema.entity.name)
            .cloned()
            .unwrap_or(schema.entity.id))
    }

    /// Record where the entity now lives without bumping `updated_at`,
    /// so a push does not make the local copy look newly edited.
    fn mark_remote<T: Record>(&self, store: &Store<T>, value: &mut T) -> Result<()> {
        value.entity_mut().remote = Some(self.remote_url.to_string());
        store.save(value)
    }
}

fn inline_sheet_error(name: &str) -> Error {
    Error::Validation(format!(
        "config sheet '{}' defines its variables inline and cannot be pushed",
        name
    ))
}

fn push_error(kind: &str, name: &str, err: Error) -> Error {
    let detail = match err {
        Error::Remote(msg) => msg,
        other => other.to_string(),
    };
    Error::Remote(format!("failed to push {} '{}': {}", kind, name, detail))
}
