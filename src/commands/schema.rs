//! Schema commands: create, list, show, update, delete.

use std::path::Path;

use serde::Serialize;

use crate::models::{EntitySummary, Schema, VarKind, Variable};
use crate::remote::{Client, RemoteApi};
use crate::resolve::resolve_schema;
use crate::settings;
use crate::store::Catalog;
use crate::validate::Validator;
use crate::{Error, Result};

use super::{json_string, summary_lines, Output};

#[derive(Debug, Serialize)]
pub struct SchemaDetail {
    #[serde(flatten)]
    pub schema: Schema,

    /// Effective variables through the extends chain, under `--resolved`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<Vec<Variable>>,
}

impl Output for SchemaDetail {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{}  {}\n", self.schema.entity.name, self.schema.entity.id);
        if let Some(description) = &self.schema.entity.description {
            out.push_str(&format!("  description: {}\n", description));
        }
        if !self.schema.extends.is_empty() {
            out.push_str(&format!("  extends: {}\n", self.schema.extends.join(", ")));
        }
        if let Some(remote) = &self.schema.entity.remote {
            out.push_str(&format!("  remote: {}\n", remote));
        }
        out.push_str("  variables:\n");
        for var in &self.schema.variables {
            out.push_str(&format!("    {}\n", format_variable(var)));
        }
        if let Some(resolved) = &self.resolved {
            out.push_str("  resolved variables:\n");
            for var in resolved {
                out.push_str(&format!("    {}\n", format_variable(var)));
            }
        }
        out.trim_end().to_string()
    }
}

fn format_variable(var: &Variable) -> String {
    let mut line = format!("{} ({})", var.name, var.kind);
    if var.required {
        line.push_str(" required");
    }
    if let Some(default) = &var.default {
        line.push_str(&format!(" default={}", default));
    }
    if let Some(regex) = &var.regex {
        line.push_str(&format!(" regex={}", regex));
    }
    line
}

#[derive(Debug, Serialize)]
pub struct SchemaList {
    pub schemas: Vec<EntitySummary>,
    pub count: usize,
}

impl Output for SchemaList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        summary_lines("schema", &self.schemas)
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub kind: String,
    pub id: String,
    pub name: String,
    pub deleted: bool,

    /// Whether a remote counterpart was deleted too; absent without `--remote`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_deleted: Option<bool>,
}

impl Output for DeleteResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("Deleted {} '{}'", self.kind, self.name);
        match self.remote_deleted {
            Some(true) => out.push_str(" (remote copy deleted)"),
            Some(false) => out.push_str(" (no remote copy found)"),
            None => {}
        }
        out
    }
}

/// Parse a `--variable` spec: `name:type[:title[:required[:default]]]`.
///
/// The default is the last field and may itself contain colons. Required
/// accepts yes/no, true/false, 1/0 and their single-letter forms.
pub(crate) fn parse_variable_spec(spec: &str) -> Result<Variable> {
    let mut parts = spec.splitn(5, ':');
    let name = parts.next().unwrap_or_default().trim();
    let kind = parts.next().unwrap_or_default().trim();
    if name.is_empty() || kind.is_empty() {
        return Err(Error::InvalidInput(format!(
            "variable spec '{}' must be name:type[:title[:required[:default]]]",
            spec
        )));
    }
    let kind: VarKind = kind.parse().map_err(Error::InvalidInput)?;

    let mut var = Variable::new(name.to_string(), kind);
    if let Some(title) = parts.next() {
        let title = title.trim();
        if !title.is_empty() {
            var.title = Some(title.to_string());
        }
    }
    if let Some(required) = parts.next() {
        let required = required.trim();
        if !required.is_empty() {
            var.required = parse_required(required).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "variable '{}': required must be yes/no, got '{}'",
                    name, required
                ))
            })?;
        }
    }
    if let Some(default) = parts.next() {
        if !default.is_empty() {
            var.default = Some(default.to_string());
        }
    }
    Ok(var)
}

fn parse_required(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" | "y" | "t" => Some(true),
        "no" | "false" | "0" | "n" | "f" => Some(false),
        _ => None,
    }
}

/// Create a schema from `--variable` specs.
pub fn schema_create(
    home: &Path,
    name: String,
    description: Option<String>,
    extends: Vec<String>,
    variables: Vec<String>,
) -> Result<SchemaDetail> {
    let catalog = Catalog::open(home)?;
    let mut schema = Schema::new(name);
    schema.entity.description = description;
    for spec in &variables {
        let var = parse_variable_spec(spec)?;
        if schema.variable(&var.name).is_some() {
            return Err(Error::InvalidInput(format!(
                "duplicate variable '{}'",
                var.name
            )));
        }
        schema.variables.push(var);
    }
    for target in extends {
        schema.extends.push(catalog.schemas.resolve_id(&target)?);
    }
    Validator::new().validate_schema(&schema)?;
    resolve_schema(&catalog, &schema)?;
    let schema = catalog.schemas.create(schema)?;
    Ok(SchemaDetail {
        schema,
        resolved: None,
    })
}

/// List all schemas.
pub fn schema_list(home: &Path) -> Result<SchemaList> {
    let catalog = Catalog::open(home)?;
    let schemas = catalog.schemas.list()?;
    Ok(SchemaList {
        count: schemas.len(),
        schemas,
    })
}

/// Show a schema, optionally with its resolved variable list.
pub fn schema_show(home: &Path, id: &str, resolved: bool) -> Result<SchemaDetail> {
    let catalog = Catalog::open(home)?;
    let schema = catalog.schemas.get(id)?;
    let resolved = if resolved {
        Some(resolve_schema(&catalog, &schema)?)
    } else {
        None
    };
    Ok(SchemaDetail { schema, resolved })
}

/// Update a schema: description, add-or-replace variables by name, remove
/// variables, replace the extends list.
pub fn schema_update(
    home: &Path,
    id: &str,
    description: Option<String>,
    variables: Vec<String>,
    remove_variables: Vec<String>,
    extends: Option<Vec<String>>,
) -> Result<SchemaDetail> {
    let catalog = Catalog::open(home)?;
    let mut parsed = Vec::new();
    for spec in &variables {
        parsed.push(parse_variable_spec(spec)?);
    }
    let extends = match extends {
        Some(targets) => {
            let mut ids = Vec::new();
            for target in targets {
                ids.push(catalog.schemas.resolve_id(&target)?);
            }
            Some(ids)
        }
        None => None,
    };

    let schema = catalog.schemas.update(id, |schema| {
        if let Some(description) = description {
            schema.entity.description = Some(description);
        }
        for var in parsed {
            match schema.variables.iter_mut().find(|v| v.name == var.name) {
                Some(existing) => *existing = var,
                None => schema.variables.push(var),
            }
        }
        for name in &remove_variables {
            if schema.variable(name).is_none() {
                return Err(Error::InvalidInput(format!(
                    "schema '{}' has no variable '{}'",
                    schema.entity.name, name
                )));
            }
            schema.variables.retain(|v| &v.name != name);
        }
        if let Some(ids) = extends {
            schema.extends = ids;
        }
        Validator::new().validate_schema(schema)?;
        resolve_schema(&catalog, schema)?;
        Ok(())
    })?;
    Ok(SchemaDetail {
        schema,
        resolved: None,
    })
}

/// Delete a schema. Refused while any schema, sheet, or project still
/// references it; `--remote` also deletes the remote counterpart first.
pub fn schema_delete(home: &Path, id: &str, remote: bool) -> Result<DeleteResult> {
    let catalog = Catalog::open(home)?;
    let schema = catalog.schemas.get(id)?;

    let referrers = schema_referrers(&catalog, &schema)?;
    if !referrers.is_empty() {
        return Err(Error::Validation(format!(
            "schema '{}' is still referenced by {}",
            schema.entity.name,
            referrers.join(", ")
        )));
    }

    let remote_deleted = if remote {
        Some(delete_remote_schema(&schema)?)
    } else {
        None
    };

    let schema = catalog.schemas.delete(&schema.entity.id)?;
    Ok(DeleteResult {
        kind: "schema".to_string(),
        id: schema.entity.id,
        name: schema.entity.name,
        deleted: true,
        remote_deleted,
    })
}

/// Entities whose extends chain or schema reference names `schema`.
fn schema_referrers(catalog: &Catalog, schema: &Schema) -> Result<Vec<String>> {
    let id = schema.entity.id.as_str();
    let name = schema.entity.name.as_str();
    let mut referrers = Vec::new();

    for summary in catalog.schemas.list()? {
        if summary.id == id {
            continue;
        }
        let other = catalog.schemas.load(&summary.id)?;
        if other.extends.iter().any(|t| t == id || t == name) {
            referrers.push(format!("schema '{}'", other.entity.name));
        }
    }
    for summary in catalog.sheets.list()? {
        let sheet = catalog.sheets.load(&summary.id)?;
        if let Some(target) = sheet.schema.as_ref().and_then(|r| r.target()) {
            if target == id || target == name {
                referrers.push(format!("config sheet '{}'", sheet.entity.name));
            }
        }
    }
    for summary in catalog.projects.list()? {
        let project = catalog.projects.load(&summary.id)?;
        if project.schema.as_deref() == Some(id) || project.schema.as_deref() == Some(name) {
            referrers.push(format!("project '{}'", project.entity.name));
        }
    }
    Ok(referrers)
}

fn delete_remote_schema(schema: &Schema) -> Result<bool> {
    let settings = settings::resolve_remote(schema.entity.remote.as_deref())?;
    let client = Client::from_settings(&settings);
    match client.find_schema(&schema.entity.name)? {
        Some(remote) => {
            client.delete_schema(&remote.guid)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
