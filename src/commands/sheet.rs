//! Config sheet commands: create, list, show, set/unset, import/export,
//! delete.
//!
//! Sheets are addressed by name, or by `--project` + `--env` which derive
//! the `{project}-{environment}` name. Values are masked in command output
//! when their key looks sensitive; `--reveal` prints them as stored.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::mask;
use crate::models::{environment_sheet_name, ConfigSheet, EntitySummary, SchemaRef};
use crate::remote::{Client, RemoteApi};
use crate::resolve::{resolve_schema, resolve_sheet};
use crate::settings;
use crate::store::Catalog;
use crate::validate::{effective_schema, Validator};
use crate::{Error, Result};

use super::schema::DeleteResult;
use super::{json_string, summary_lines, Output};

#[derive(Debug, Serialize)]
pub struct SheetDetail {
    #[serde(flatten)]
    pub sheet: ConfigSheet,

    /// Effective values through the extends chain, under `--resolved`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<BTreeMap<String, String>>,
}

impl Output for SheetDetail {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{}  {}\n", self.sheet.entity.name, self.sheet.entity.id);
        if let Some(description) = &self.sheet.entity.description {
            out.push_str(&format!("  description: {}\n", description));
        }
        if let (Some(project), Some(environment)) = (&self.sheet.project, &self.sheet.environment)
        {
            out.push_str(&format!(
                "  project: {}  environment: {}\n",
                project, environment
            ));
        }
        match &self.sheet.schema {
            Some(SchemaRef::Reference(r)) => out.push_str(&format!("  schema: {}\n", r)),
            Some(SchemaRef::Inline(vars)) => {
                out.push_str(&format!("  schema: inline ({} variables)\n", vars.len()))
            }
            None => {}
        }
        if !self.sheet.extends.is_empty() {
            out.push_str(&format!("  extends: {}\n", self.sheet.extends.join(", ")));
        }
        if let Some(remote) = &self.sheet.entity.remote {
            out.push_str(&format!("  remote: {}\n", remote));
        }
        out.push_str("  values:\n");
        for (key, value) in &self.sheet.values {
            out.push_str(&format!("    {} = {}\n", key, value));
        }
        if let Some(resolved) = &self.resolved {
            out.push_str("  resolved values:\n");
            for (key, value) in resolved {
                out.push_str(&format!("    {} = {}\n", key, value));
            }
        }
        out.trim_end().to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct SheetList {
    pub sheets: Vec<EntitySummary>,
    pub count: usize,
}

impl Output for SheetList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        summary_lines("config sheet", &self.sheets)
    }
}

#[derive(Debug, Serialize)]
pub struct UnsetResult {
    pub id: String,
    pub name: String,
    pub removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_present: Vec<String>,
}

impl Output for UnsetResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!(
            "Removed {} value(s) from '{}'",
            self.removed.len(),
            self.name
        );
        if !self.not_present.is_empty() {
            out.push_str(&format!(" (not present: {})", self.not_present.join(", ")));
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub struct ExportResult {
    pub id: String,
    pub name: String,
    pub format: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Output for ExportResult {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        match &self.output {
            Some(path) => format!("Wrote {} export to {}", self.format, path),
            None => self.content.clone(),
        }
    }
}

enum ExportFormat {
    Dotenv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "dotenv" => Ok(ExportFormat::Dotenv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportFormat::Dotenv => "dotenv",
            ExportFormat::Json => "json",
        };
        write!(f, "{}", s)
    }
}

/// Everything `sheet create` accepts. `values` entries are `KEY=value`
/// pairs and override imported ones.
#[derive(Debug, Default)]
pub struct NewSheet {
    pub name: Option<String>,
    pub project: Option<String>,
    pub environment: Option<String>,
    pub schema: Option<String>,
    pub description: Option<String>,
    pub extends: Vec<String>,
    pub values: Vec<String>,
    pub import_env: Option<PathBuf>,
    pub import_json: Option<PathBuf>,
}

/// Resolve the addressed sheet name: explicit, or derived from project +
/// environment.
fn sheet_key(
    catalog: &Catalog,
    name: Option<&str>,
    project: Option<&str>,
    environment: Option<&str>,
) -> Result<String> {
    match (name, project, environment) {
        (Some(name), _, _) => Ok(name.to_string()),
        (None, Some(project), Some(environment)) => {
            let project = catalog.projects.get(project)?;
            Ok(environment_sheet_name(&project.entity.name, environment))
        }
        _ => Err(Error::InvalidInput(
            "give a sheet name, or --project with --env".to_string(),
        )),
    }
}

/// Split a `KEY=value` argument.
pub(crate) fn parse_assignment(pair: &str) -> Result<(String, String)> {
    let invalid = || Error::InvalidInput(format!("expected KEY=value, got '{}'", pair));
    let (key, value) = pair.split_once('=').ok_or_else(invalid)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid());
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse dotenv content: `KEY=VALUE` lines, blanks and `#` comments
/// skipped, matching single or double quotes stripped from values.
fn parse_env_content(content: &str) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| {
            Error::InvalidInput(format!(
                "line {}: expected KEY=VALUE, got '{}'",
                number + 1,
                line
            ))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::InvalidInput(format!("line {}: empty key", number + 1)));
        }
        values.insert(key.to_string(), unquote(value.trim()).to_string());
    }
    Ok(values)
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Parse a flat JSON object: strings kept, numbers and booleans coerced
/// to strings, null or nested values rejected.
fn parse_json_content(content: &str) -> Result<BTreeMap<String, String>> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
    let mut values = BTreeMap::new();
    for (key, value) in object {
        let value = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            other => {
                return Err(Error::InvalidInput(format!(
                    "key '{}' has unsupported value {}",
                    key, other
                )));
            }
        };
        values.insert(key, value);
    }
    Ok(values)
}

fn import_values(
    env_file: Option<&Path>,
    json_file: Option<&Path>,
) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    if let Some(path) = env_file {
        let content = read_import(path)?;
        values.extend(parse_env_content(&content)?);
    }
    if let Some(path) = json_file {
        let content = read_import(path)?;
        values.extend(parse_json_content(&content)?);
    }
    Ok(values)
}

fn read_import(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::InvalidInput(format!("cannot read {}: {}", path.display(), e)))
}

/// Validate the sheet's own assignments against its resolved schema.
/// Sheets without any schema are accepted as-is; required-but-missing
/// variables are left to `verify` and `export`.
fn check_values(catalog: &Catalog, sheet: &ConfigSheet) -> Result<()> {
    let schema = match effective_schema(catalog, sheet) {
        Ok(schema) => schema,
        Err(Error::Validation(_)) => return Ok(()),
        Err(e) => return Err(e),
    };
    let variables = resolve_schema(catalog, &schema)?;
    let mut validator = Validator::new();
    for (key, value) in &sheet.values {
        if let Some(var) = variables.iter().find(|v| v.name == *key) {
            if let Err(e) = validator.validate_value(var, value) {
                let reason = match e {
                    Error::Validation(msg) => msg,
                    other => return Err(other),
                };
                return Err(Error::Validation(format!(
                    "config sheet '{}': {}",
                    sheet.entity.name, reason
                )));
            }
        }
    }
    Ok(())
}

fn masked(values: &BTreeMap<String, String>, reveal: bool) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(key, value)| (key.clone(), mask::display_value(key, value, reveal)))
        .collect()
}

fn present(
    mut sheet: ConfigSheet,
    resolved: Option<BTreeMap<String, String>>,
    reveal: bool,
) -> SheetDetail {
    sheet.values = masked(&sheet.values, reveal);
    SheetDetail {
        sheet,
        resolved: resolved.map(|values| masked(&values, reveal)),
    }
}

/// Create a config sheet. With `--project` and `--env` the sheet backs
/// that environment: its name is derived, the schema defaults to the
/// project's, and the environment is registered on the project.
pub fn sheet_create(home: &Path, spec: NewSheet) -> Result<SheetDetail> {
    let catalog = Catalog::open(home)?;
    let mut assignments = import_values(spec.import_env.as_deref(), spec.import_json.as_deref())?;
    for pair in &spec.values {
        let (key, value) = parse_assignment(pair)?;
        assignments.insert(key, value);
    }

    let sheet = match (spec.project, spec.environment) {
        (Some(project), Some(environment)) => {
            let opts = EnvironmentSheetOptions {
                name: spec.name,
                schema: spec.schema,
                description: spec.description,
                extends: spec.extends,
                values: assignments,
            };
            create_environment_sheet(&catalog, &project, &environment, opts)?
        }
        (None, None) => {
            let name = spec
                .name
                .ok_or_else(|| Error::InvalidInput("a sheet name is required".to_string()))?;
            let mut sheet = ConfigSheet::new(name);
            sheet.entity.description = spec.description;
            if let Some(schema) = &spec.schema {
                sheet.schema = Some(SchemaRef::schema(&catalog.schemas.resolve_id(schema)?));
            }
            for target in &spec.extends {
                sheet.extends.push(catalog.sheets.resolve_id(target)?);
            }
            sheet.values = assignments;
            check_values(&catalog, &sheet)?;
            catalog.sheets.create(sheet)?
        }
        _ => {
            return Err(Error::InvalidInput(
                "--project and --env go together".to_string(),
            ));
        }
    };
    Ok(present(sheet, None, false))
}

/// How to build an environment's backing sheet.
#[derive(Debug, Default)]
pub(crate) struct EnvironmentSheetOptions {
    /// Must match the derived `{project}-{environment}` name when given
    pub name: Option<String>,
    pub schema: Option<String>,
    pub description: Option<String>,
    pub extends: Vec<String>,
    pub values: BTreeMap<String, String>,
}

/// Create the backing sheet for a project environment and register the
/// environment. Shared by `sheet create --project/--env` and
/// `project env add`. Without an explicit schema the project's default
/// applies.
pub(crate) fn create_environment_sheet(
    catalog: &Catalog,
    project_key: &str,
    environment: &str,
    opts: EnvironmentSheetOptions,
) -> Result<ConfigSheet> {
    let project = catalog.projects.get(project_key)?;
    let sheet_name = environment_sheet_name(&project.entity.name, environment);
    if let Some(explicit) = opts.name {
        if explicit != sheet_name {
            return Err(Error::InvalidInput(format!(
                "environment sheets are named '{}', not '{}'",
                sheet_name, explicit
            )));
        }
    }
    if project.has_environment(environment) {
        return Err(Error::AlreadyExists(format!(
            "environment '{}' in project '{}'",
            environment, project.entity.name
        )));
    }

    let schema_id = match &opts.schema {
        Some(schema) => Some(catalog.schemas.resolve_id(schema)?),
        None => match &project.schema {
            Some(default) => Some(catalog.schemas.resolve_id(default)?),
            None => None,
        },
    };

    let mut sheet = ConfigSheet::new(sheet_name);
    sheet.entity.description = opts.description;
    sheet.schema = schema_id.map(|id| SchemaRef::schema(&id));
    sheet.project = Some(project.entity.id.clone());
    sheet.environment = Some(environment.to_string());
    for target in &opts.extends {
        sheet.extends.push(catalog.sheets.resolve_id(target)?);
    }
    sheet.values = opts.values;
    check_values(catalog, &sheet)?;

    let sheet = catalog.sheets.create(sheet)?;
    catalog.projects.update(&project.entity.id, |project| {
        project.add_environment(environment);
        Ok(())
    })?;
    Ok(sheet)
}

/// List sheets, optionally restricted to one project's.
pub fn sheet_list(home: &Path, project: Option<&str>) -> Result<SheetList> {
    let catalog = Catalog::open(home)?;
    let mut sheets = catalog.sheets.list()?;
    if let Some(project) = project {
        let project = catalog.projects.get(project)?;
        let mut filtered = Vec::new();
        for summary in sheets {
            let sheet = catalog.sheets.load(&summary.id)?;
            if sheet.project.as_deref() == Some(project.entity.id.as_str()) {
                filtered.push(summary);
            }
        }
        sheets = filtered;
    }
    Ok(SheetList {
        count: sheets.len(),
        sheets,
    })
}

/// Show a sheet, optionally with resolved values, masked unless `--reveal`.
pub fn sheet_show(
    home: &Path,
    name: Option<&str>,
    project: Option<&str>,
    environment: Option<&str>,
    resolved: bool,
    reveal: bool,
) -> Result<SheetDetail> {
    let catalog = Catalog::open(home)?;
    let key = sheet_key(&catalog, name, project, environment)?;
    let sheet = catalog.sheets.get(&key)?;
    let resolved = if resolved {
        Some(resolve_sheet(&catalog, &sheet)?.values)
    } else {
        None
    };
    Ok(present(sheet, resolved, reveal))
}

/// Set values on a sheet, validating each against the resolved schema.
pub fn sheet_set(home: &Path, id: &str, pairs: Vec<String>) -> Result<SheetDetail> {
    let catalog = Catalog::open(home)?;
    let mut assignments = Vec::new();
    for pair in &pairs {
        assignments.push(parse_assignment(pair)?);
    }
    let sheet = catalog.sheets.update(id, |sheet| {
        for (key, value) in assignments {
            sheet.values.insert(key, value);
        }
        check_values(&catalog, sheet)
    })?;
    Ok(present(sheet, None, false))
}

/// Remove values from a sheet. Missing keys are reported, not errors.
pub fn sheet_unset(home: &Path, id: &str, keys: Vec<String>) -> Result<UnsetResult> {
    let catalog = Catalog::open(home)?;
    let mut removed = Vec::new();
    let mut not_present = Vec::new();
    let sheet = catalog.sheets.update(id, |sheet| {
        for key in &keys {
            if sheet.values.remove(key).is_some() {
                removed.push(key.clone());
            } else {
                not_present.push(key.clone());
            }
        }
        Ok(())
    })?;
    Ok(UnsetResult {
        id: sheet.entity.id,
        name: sheet.entity.name,
        removed,
        not_present,
    })
}

/// Export a sheet's values as dotenv or JSON, unmasked.
///
/// When the sheet has a schema the values are validated first and
/// declared defaults fill in missing variables; `--resolved` exports the
/// inherited view. `--output` writes to a file instead of the result.
pub fn sheet_export(
    home: &Path,
    name: Option<&str>,
    project: Option<&str>,
    environment: Option<&str>,
    format: &str,
    resolved: bool,
    output: Option<&Path>,
) -> Result<ExportResult> {
    let format: ExportFormat = format.parse().map_err(Error::InvalidInput)?;
    let catalog = Catalog::open(home)?;
    let key = sheet_key(&catalog, name, project, environment)?;
    let mut sheet = catalog.sheets.get(&key)?;

    match effective_schema(&catalog, &sheet) {
        Ok(_) => Validator::new().validate_sheet(&catalog, &mut sheet)?,
        Err(Error::Validation(_)) => {}
        Err(e) => return Err(e),
    }

    let values = if resolved {
        resolve_sheet(&catalog, &sheet)?.values
    } else {
        sheet.values.clone()
    };

    let content = match format {
        ExportFormat::Dotenv => render_dotenv(&sheet.entity.name, &values),
        ExportFormat::Json => {
            let mut body = serde_json::to_string_pretty(&values)?;
            body.push('\n');
            body
        }
    };

    let output = match output {
        Some(path) => {
            std::fs::write(path, &content)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    Ok(ExportResult {
        id: sheet.entity.id.clone(),
        name: sheet.entity.name.clone(),
        format: format.to_string(),
        content,
        output,
    })
}

/// Delete a sheet. Environment sheets deregister their environment from
/// the owning project; `--remote` also deletes the remote counterpart
/// first.
pub fn sheet_delete(
    home: &Path,
    name: Option<&str>,
    project: Option<&str>,
    environment: Option<&str>,
    remote: bool,
) -> Result<DeleteResult> {
    let catalog = Catalog::open(home)?;
    let key = sheet_key(&catalog, name, project, environment)?;
    let sheet = catalog.sheets.get(&key)?;

    let remote_deleted = if remote {
        Some(delete_remote_sheet(&sheet)?)
    } else {
        None
    };

    let sheet = catalog.sheets.delete(&sheet.entity.id)?;

    if let (Some(project_id), Some(environment)) = (&sheet.project, &sheet.environment) {
        match catalog.projects.update(project_id, |project| {
            project.remove_environment(environment);
            Ok(())
        }) {
            Ok(_) | Err(Error::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(DeleteResult {
        kind: "config sheet".to_string(),
        id: sheet.entity.id,
        name: sheet.entity.name,
        deleted: true,
        remote_deleted,
    })
}

fn delete_remote_sheet(sheet: &ConfigSheet) -> Result<bool> {
    let settings = settings::resolve_remote(sheet.entity.remote.as_deref())?;
    let client = Client::from_settings(&settings);
    match client.find_sheet(&sheet.entity.name)? {
        Some(remote) => {
            client.delete_sheet(&remote.guid)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Render dotenv lines with a generated header.
fn render_dotenv(name: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = format!("# Generated by rig from config sheet '{}'\n", name);
    for (key, value) in values {
        out.push_str(&format!("{}={}\n", key, dotenv_value(value)));
    }
    out
}

/// Quote a dotenv value when it needs it. Spaces, tabs, newlines, quotes,
/// `$`, backslashes, `#`, and the empty string force double quotes with
/// the specials escaped.
fn dotenv_value(value: &str) -> String {
    let plain = !value.is_empty()
        && !value.chars().any(|c| {
            matches!(c, ' ' | '\t' | '\n' | '\r' | '"' | '\'' | '$' | '\\' | '#')
        });
    if plain {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '$' => quoted.push_str("\\$"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{project_create, schema_create};
    use crate::test_utils::TestEnv;

    fn schema_web(env: &TestEnv) {
        schema_create(
            env.path(),
            "web".to_string(),
            None,
            vec![],
            vec![
                "PORT:number::yes:8080".to_string(),
                "DEBUG:boolean::no:false".to_string(),
            ],
        )
        .unwrap();
    }

    fn named(name: &str) -> NewSheet {
        NewSheet {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("PORT=8080").unwrap(),
            ("PORT".to_string(), "8080".to_string())
        );
        assert_eq!(
            parse_assignment("URL=https://x?a=b").unwrap(),
            ("URL".to_string(), "https://x?a=b".to_string())
        );
        assert!(parse_assignment("PORT").is_err());
        assert!(parse_assignment("=value").is_err());
    }

    #[test]
    fn test_parse_env_content() {
        let content = "\n# comment\nPORT=8080\nNAME=\"with spaces\"\nTOKEN='single'\nEMPTY=\n";
        let values = parse_env_content(content).unwrap();
        assert_eq!(values.get("PORT").unwrap(), "8080");
        assert_eq!(values.get("NAME").unwrap(), "with spaces");
        assert_eq!(values.get("TOKEN").unwrap(), "single");
        assert_eq!(values.get("EMPTY").unwrap(), "");
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn test_parse_env_content_rejects_bad_lines() {
        assert!(parse_env_content("JUSTAWORD\n").is_err());
        assert!(parse_env_content("=nokey\n").is_err());
    }

    #[test]
    fn test_parse_json_content_coerces_scalars() {
        let values =
            parse_json_content(r#"{"PORT": 8080, "DEBUG": true, "NAME": "api"}"#).unwrap();
        assert_eq!(values.get("PORT").unwrap(), "8080");
        assert_eq!(values.get("DEBUG").unwrap(), "true");
        assert_eq!(values.get("NAME").unwrap(), "api");
    }

    #[test]
    fn test_parse_json_content_rejects_nested() {
        assert!(parse_json_content(r#"{"DB": {"host": "x"}}"#).is_err());
        assert!(parse_json_content(r#"{"X": null}"#).is_err());
        assert!(parse_json_content(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn test_dotenv_value_quoting() {
        assert_eq!(dotenv_value("8080"), "8080");
        assert_eq!(dotenv_value("with space"), "\"with space\"");
        assert_eq!(dotenv_value("pa$$word"), "\"pa\\$\\$word\"");
        assert_eq!(dotenv_value("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(dotenv_value("line1\nline2"), "\"line1\\nline2\"");
        assert_eq!(dotenv_value("back\\slash"), "\"back\\\\slash\"");
        assert_eq!(dotenv_value(""), "\"\"");
    }

    #[test]
    fn test_sheet_create_plain_and_show() {
        let env = TestEnv::new();
        schema_web(&env);
        let created = sheet_create(
            env.path(),
            NewSheet {
                schema: Some("web".to_string()),
                values: vec!["PORT=9090".to_string()],
                ..named("prod")
            },
        )
        .unwrap();
        assert_eq!(created.sheet.values.get("PORT").unwrap(), "9090");

        let shown = sheet_show(env.path(), Some("prod"), None, None, false, false).unwrap();
        assert_eq!(shown.sheet.entity.id, created.sheet.entity.id);
    }

    #[test]
    fn test_sheet_create_validates_values() {
        let env = TestEnv::new();
        schema_web(&env);
        let err = sheet_create(
            env.path(),
            NewSheet {
                schema: Some("web".to_string()),
                values: vec!["PORT=banana".to_string()],
                ..named("prod")
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_sheet_create_requires_name_or_pair() {
        let env = TestEnv::new();
        assert!(matches!(
            sheet_create(env.path(), NewSheet::default()).unwrap_err(),
            Error::InvalidInput(_)
        ));
        assert!(matches!(
            sheet_create(
                env.path(),
                NewSheet {
                    project: Some("shop".to_string()),
                    ..Default::default()
                }
            )
            .unwrap_err(),
            Error::InvalidInput(_)
        ));
    }

    #[test]
    fn test_sheet_create_environment_derives_name_and_registers() {
        let env = TestEnv::new();
        schema_web(&env);
        project_create(env.path(), "shop".to_string(), None, Some("web")).unwrap();

        let created = sheet_create(
            env.path(),
            NewSheet {
                project: Some("shop".to_string()),
                environment: Some("prod".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(created.sheet.entity.name, "shop-prod");
        assert_eq!(created.sheet.environment.as_deref(), Some("prod"));
        // schema defaulted from the project
        assert!(created.sheet.schema.is_some());

        let catalog = env.catalog();
        let project = catalog.projects.get("shop").unwrap();
        assert!(project.has_environment("prod"));
        assert_eq!(
            created.sheet.project.as_deref(),
            Some(project.entity.id.as_str())
        );
    }

    #[test]
    fn test_sheet_create_existing_environment_rejected() {
        let env = TestEnv::new();
        project_create(env.path(), "shop".to_string(), None, None).unwrap();
        let env_sheet = || NewSheet {
            project: Some("shop".to_string()),
            environment: Some("prod".to_string()),
            ..Default::default()
        };
        sheet_create(env.path(), env_sheet()).unwrap();

        let err = sheet_create(env.path(), env_sheet()).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_sheet_create_wrong_explicit_name_rejected() {
        let env = TestEnv::new();
        project_create(env.path(), "shop".to_string(), None, None).unwrap();
        let err = sheet_create(
            env.path(),
            NewSheet {
                name: Some("custom".to_string()),
                project: Some("shop".to_string()),
                environment: Some("prod".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("shop-prod"));
    }

    #[test]
    fn test_sheet_create_imports_with_value_override() {
        let env = TestEnv::new();
        let dir = tempfile::TempDir::new().unwrap();
        let env_file = dir.path().join("base.env");
        std::fs::write(&env_file, "PORT=8080\nHOST=localhost\n").unwrap();

        let created = sheet_create(
            env.path(),
            NewSheet {
                values: vec!["PORT=9090".to_string()],
                import_env: Some(env_file),
                ..named("prod")
            },
        )
        .unwrap();
        assert_eq!(created.sheet.values.get("PORT").unwrap(), "9090");
        assert_eq!(created.sheet.values.get("HOST").unwrap(), "localhost");
    }

    #[test]
    fn test_sheet_show_masks_sensitive_values() {
        let env = TestEnv::new();
        sheet_create(
            env.path(),
            NewSheet {
                values: vec![
                    "DB_PASSWORD=supersecretvalue".to_string(),
                    "PORT=8080".to_string(),
                ],
                ..named("prod")
            },
        )
        .unwrap();

        let masked = sheet_show(env.path(), Some("prod"), None, None, false, false).unwrap();
        assert_ne!(
            masked.sheet.values.get("DB_PASSWORD").unwrap(),
            "supersecretvalue"
        );
        assert_eq!(masked.sheet.values.get("PORT").unwrap(), "8080");

        let revealed = sheet_show(env.path(), Some("prod"), None, None, false, true).unwrap();
        assert_eq!(
            revealed.sheet.values.get("DB_PASSWORD").unwrap(),
            "supersecretvalue"
        );
    }

    #[test]
    fn test_sheet_set_validates_and_persists() {
        let env = TestEnv::new();
        schema_web(&env);
        sheet_create(
            env.path(),
            NewSheet {
                schema: Some("web".to_string()),
                ..named("prod")
            },
        )
        .unwrap();

        sheet_set(env.path(), "prod", vec!["PORT=9090".to_string()]).unwrap();
        let shown = sheet_show(env.path(), Some("prod"), None, None, false, true).unwrap();
        assert_eq!(shown.sheet.values.get("PORT").unwrap(), "9090");

        let err = sheet_set(env.path(), "prod", vec!["PORT=banana".to_string()]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        // failed set must not persist
        let shown = sheet_show(env.path(), Some("prod"), None, None, false, true).unwrap();
        assert_eq!(shown.sheet.values.get("PORT").unwrap(), "9090");
    }

    #[test]
    fn test_sheet_unset_reports_missing_keys() {
        let env = TestEnv::new();
        sheet_create(
            env.path(),
            NewSheet {
                values: vec!["PORT=8080".to_string()],
                ..named("prod")
            },
        )
        .unwrap();

        let result = sheet_unset(
            env.path(),
            "prod",
            vec!["PORT".to_string(), "GHOST".to_string()],
        )
        .unwrap();
        assert_eq!(result.removed, vec!["PORT"]);
        assert_eq!(result.not_present, vec!["GHOST"]);
    }

    #[test]
    fn test_sheet_export_dotenv_unmasked_with_defaults() {
        let env = TestEnv::new();
        schema_web(&env);
        sheet_create(
            env.path(),
            NewSheet {
                schema: Some("web".to_string()),
                values: vec![
                    "DB_PASSWORD=s3cret value".to_string(),
                    "PORT=9090".to_string(),
                ],
                ..named("prod")
            },
        )
        .unwrap();

        let result =
            sheet_export(env.path(), Some("prod"), None, None, "dotenv", false, None).unwrap();
        assert!(result.content.starts_with("# Generated by rig"));
        assert!(result.content.contains("PORT=9090"));
        assert!(result.content.contains("DB_PASSWORD=\"s3cret value\""));
        // declared default injected for the missing variable
        assert!(result.content.contains("DEBUG=false"));
        assert!(result.output.is_none());
    }

    #[test]
    fn test_sheet_export_json_to_file() {
        let env = TestEnv::new();
        sheet_create(
            env.path(),
            NewSheet {
                values: vec!["PORT=8080".to_string()],
                ..named("prod")
            },
        )
        .unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("prod.json");
        let result = sheet_export(
            env.path(),
            Some("prod"),
            None,
            None,
            "json",
            false,
            Some(&target),
        )
        .unwrap();
        assert_eq!(result.output.as_deref(), Some(target.to_str().unwrap()));

        let written: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written.get("PORT").unwrap(), "8080");
    }

    #[test]
    fn test_sheet_export_resolved_includes_inherited() {
        let env = TestEnv::new();
        sheet_create(
            env.path(),
            NewSheet {
                values: vec!["HOST=localhost".to_string()],
                ..named("defaults")
            },
        )
        .unwrap();
        sheet_create(
            env.path(),
            NewSheet {
                extends: vec!["defaults".to_string()],
                values: vec!["PORT=8080".to_string()],
                ..named("prod")
            },
        )
        .unwrap();

        let plain =
            sheet_export(env.path(), Some("prod"), None, None, "dotenv", false, None).unwrap();
        assert!(!plain.content.contains("HOST"));

        let resolved =
            sheet_export(env.path(), Some("prod"), None, None, "dotenv", true, None).unwrap();
        assert!(resolved.content.contains("HOST=localhost"));
        assert!(resolved.content.contains("PORT=8080"));
    }

    #[test]
    fn test_sheet_export_unknown_format() {
        let env = TestEnv::new();
        sheet_create(env.path(), named("prod")).unwrap();
        assert!(matches!(
            sheet_export(env.path(), Some("prod"), None, None, "yaml", false, None).unwrap_err(),
            Error::InvalidInput(_)
        ));
    }

    #[test]
    fn test_sheet_export_fails_invalid_sheet() {
        let env = TestEnv::new();
        schema_create(
            env.path(),
            "strict".to_string(),
            None,
            vec![],
            vec!["TOKEN:string::yes".to_string()],
        )
        .unwrap();
        sheet_create(
            env.path(),
            NewSheet {
                schema: Some("strict".to_string()),
                ..named("prod")
            },
        )
        .unwrap();

        let err =
            sheet_export(env.path(), Some("prod"), None, None, "dotenv", false, None).unwrap_err();
        assert!(err.to_string().contains("TOKEN"));
    }

    #[test]
    fn test_sheet_delete_deregisters_environment() {
        let env = TestEnv::new();
        project_create(env.path(), "shop".to_string(), None, None).unwrap();
        sheet_create(
            env.path(),
            NewSheet {
                project: Some("shop".to_string()),
                environment: Some("prod".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let result = sheet_delete(env.path(), None, Some("shop"), Some("prod"), false).unwrap();
        assert_eq!(result.name, "shop-prod");

        let catalog = env.catalog();
        let project = catalog.projects.get("shop").unwrap();
        assert!(!project.has_environment("prod"));
    }
}
