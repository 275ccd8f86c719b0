//! Project commands, including the `project env` group.
//!
//! Environments are registered on the project and backed by a config
//! sheet named `{project}-{environment}`. Adding an environment creates
//! the sheet; removing one deletes it.

use std::path::Path;

use serde::Serialize;

use crate::models::{environment_sheet_name, EntitySummary, Project};
use crate::store::Catalog;
use crate::{Error, Result};

use super::sheet::{create_environment_sheet, EnvironmentSheetOptions};
use super::{json_string, summary_lines, Output};

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
}

impl Output for ProjectDetail {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{}  {}\n", self.project.entity.name, self.project.entity.id);
        if let Some(description) = &self.project.entity.description {
            out.push_str(&format!("  description: {}\n", description));
        }
        if let Some(schema) = &self.project.schema {
            out.push_str(&format!("  schema: {}\n", schema));
        }
        if let Some(remote) = &self.project.entity.remote {
            out.push_str(&format!("  remote: {}\n", remote));
        }
        if self.project.environments.is_empty() {
            out.push_str("  no environments");
        } else {
            out.push_str("  environments:\n");
            for name in self.project.environment_names() {
                out.push_str(&format!(
                    "    {}  ({})\n",
                    name,
                    environment_sheet_name(&self.project.entity.name, &name)
                ));
            }
        }
        out.trim_end().to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectList {
    pub projects: Vec<EntitySummary>,
    pub count: usize,
}

impl Output for ProjectList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        summary_lines("project", &self.projects)
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectDeleteResult {
    pub id: String,
    pub name: String,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deleted_sheets: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detached_sheets: Vec<String>,
}

impl Output for ProjectDeleteResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("Deleted project '{}'", self.name);
        if !self.deleted_sheets.is_empty() {
            out.push_str(&format!(
                " and {} sheet(s): {}",
                self.deleted_sheets.len(),
                self.deleted_sheets.join(", ")
            ));
        }
        if !self.detached_sheets.is_empty() {
            out.push_str(&format!(
                " (kept {} standalone sheet(s): {})",
                self.detached_sheets.len(),
                self.detached_sheets.join(", ")
            ));
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub struct EnvAddResult {
    pub project: String,
    pub environment: String,
    pub sheet: String,
    pub sheet_id: String,
}

impl Output for EnvAddResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Added environment '{}' to '{}' (sheet '{}')",
            self.environment, self.project, self.sheet
        )
    }
}

#[derive(Debug, Serialize)]
pub struct EnvRemoveResult {
    pub project: String,
    pub environment: String,
    pub sheet_deleted: bool,
}

impl Output for EnvRemoveResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let suffix = if self.sheet_deleted {
            " and its sheet"
        } else {
            ""
        };
        format!(
            "Removed environment '{}' from '{}'{}",
            self.environment, self.project, suffix
        )
    }
}

#[derive(Debug, Serialize)]
pub struct EnvEntry {
    pub name: String,
    pub sheet: String,
    pub sheet_exists: bool,
}

#[derive(Debug, Serialize)]
pub struct EnvListResult {
    pub project: String,
    pub environments: Vec<EnvEntry>,
}

impl Output for EnvListResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.environments.is_empty() {
            return format!("No environments in '{}'", self.project);
        }
        let mut out = format!("{} environment(s) in '{}':\n", self.environments.len(), self.project);
        for entry in &self.environments {
            let note = if entry.sheet_exists { "" } else { "  [sheet missing]" };
            out.push_str(&format!("  {}  {}{}\n", entry.name, entry.sheet, note));
        }
        out.trim_end().to_string()
    }
}

/// Create a project, optionally with a default schema for its
/// environment sheets.
pub fn project_create(
    home: &Path,
    name: String,
    description: Option<String>,
    schema: Option<&str>,
) -> Result<ProjectDetail> {
    let catalog = Catalog::open(home)?;
    let mut project = Project::new(name);
    project.entity.description = description;
    if let Some(schema) = schema {
        project.schema = Some(catalog.schemas.resolve_id(schema)?);
    }
    let project = catalog.projects.create(project)?;
    Ok(ProjectDetail { project })
}

pub fn project_list(home: &Path) -> Result<ProjectList> {
    let catalog = Catalog::open(home)?;
    let projects = catalog.projects.list()?;
    Ok(ProjectList {
        count: projects.len(),
        projects,
    })
}

pub fn project_show(home: &Path, id: &str) -> Result<ProjectDetail> {
    let catalog = Catalog::open(home)?;
    let project = catalog.projects.get(id)?;
    Ok(ProjectDetail { project })
}

/// Update a project's description or default schema. Existing
/// environment sheets keep the schema they were created with.
pub fn project_update(
    home: &Path,
    id: &str,
    description: Option<String>,
    schema: Option<&str>,
) -> Result<ProjectDetail> {
    let catalog = Catalog::open(home)?;
    let schema_id = match schema {
        Some(schema) => Some(catalog.schemas.resolve_id(schema)?),
        None => None,
    };
    let project = catalog.projects.update(id, |project| {
        if description.is_some() {
            project.entity.description = description;
        }
        if schema_id.is_some() {
            project.schema = schema_id;
        }
        Ok(())
    })?;
    Ok(ProjectDetail { project })
}

/// Delete a project and its sheets. `--keep-sheets` detaches them
/// instead, clearing their project and environment binding.
pub fn project_delete(home: &Path, id: &str, keep_sheets: bool) -> Result<ProjectDeleteResult> {
    let catalog = Catalog::open(home)?;
    let project = catalog.projects.get(id)?;

    let mut deleted_sheets = Vec::new();
    let mut detached_sheets = Vec::new();
    for summary in catalog.sheets.list()? {
        let sheet = catalog.sheets.load(&summary.id)?;
        if sheet.project.as_deref() != Some(project.entity.id.as_str()) {
            continue;
        }
        if keep_sheets {
            catalog.sheets.update(&sheet.entity.id, |sheet| {
                sheet.project = None;
                sheet.environment = None;
                Ok(())
            })?;
            detached_sheets.push(sheet.entity.name);
        } else {
            let removed = catalog.sheets.delete(&sheet.entity.id)?;
            deleted_sheets.push(removed.entity.name);
        }
    }

    let project = catalog.projects.delete(&project.entity.id)?;
    Ok(ProjectDeleteResult {
        id: project.entity.id,
        name: project.entity.name,
        deleted: true,
        deleted_sheets,
        detached_sheets,
    })
}

/// Register an environment and create its backing sheet.
pub fn project_env_add(
    home: &Path,
    project: &str,
    environment: &str,
    schema: Option<&str>,
) -> Result<EnvAddResult> {
    let catalog = Catalog::open(home)?;
    let opts = EnvironmentSheetOptions {
        schema: schema.map(String::from),
        ..Default::default()
    };
    let sheet = create_environment_sheet(&catalog, project, environment, opts)?;
    let project = catalog.projects.get(project)?;
    Ok(EnvAddResult {
        project: project.entity.name,
        environment: environment.to_string(),
        sheet: sheet.entity.name,
        sheet_id: sheet.entity.id,
    })
}

/// Deregister an environment, deleting its backing sheet when the sheet
/// still belongs to this project.
pub fn project_env_remove(home: &Path, project: &str, environment: &str) -> Result<EnvRemoveResult> {
    let catalog = Catalog::open(home)?;
    let project = catalog.projects.get(project)?;
    if !project.has_environment(environment) {
        return Err(Error::NotFound(format!(
            "environment '{}' in project '{}'",
            environment, project.entity.name
        )));
    }

    let sheet_name = environment_sheet_name(&project.entity.name, environment);
    let sheet_deleted = match catalog.sheets.get(&sheet_name) {
        Ok(sheet) if sheet.project.as_deref() == Some(project.entity.id.as_str()) => {
            catalog.sheets.delete(&sheet.entity.id)?;
            true
        }
        Ok(_) | Err(Error::NotFound(_)) => false,
        Err(e) => return Err(e),
    };

    catalog.projects.update(&project.entity.id, |project| {
        project.remove_environment(environment);
        Ok(())
    })?;

    Ok(EnvRemoveResult {
        project: project.entity.name,
        environment: environment.to_string(),
        sheet_deleted,
    })
}

/// List a project's environments with their backing sheets.
pub fn project_env_list(home: &Path, project: &str) -> Result<EnvListResult> {
    let catalog = Catalog::open(home)?;
    let project = catalog.projects.get(project)?;
    let mut environments = Vec::new();
    for name in project.environment_names() {
        let sheet = environment_sheet_name(&project.entity.name, &name);
        let sheet_exists = catalog.sheets.exists(&sheet)?;
        environments.push(EnvEntry {
            name,
            sheet,
            sheet_exists,
        });
    }
    Ok(EnvListResult {
        project: project.entity.name,
        environments,
    })
}
