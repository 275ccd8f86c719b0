//! Verification of sheets and schemas against their declared rules.
//!
//! `verify` re-validates stored entities: one sheet, every environment of
//! a project (or one with `--env`), or a schema definition. Failures are
//! collected per target rather than aborting on the first.

use std::path::Path;

use serde::Serialize;

use crate::models::environment_sheet_name;
use crate::resolve::resolve_schema;
use crate::store::Catalog;
use crate::validate::Validator;
use crate::{Error, Result};

use super::{json_string, Output};

#[derive(Debug, Serialize)]
pub struct VerifyOutcome {
    pub kind: String,
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub ok: bool,
    pub checked: usize,
    pub failed: usize,
    pub targets: Vec<VerifyOutcome>,
}

impl Output for VerifyReport {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("{} target(s) checked, {} failed\n", self.checked, self.failed);
        for target in &self.targets {
            match &target.error {
                Some(error) => out.push_str(&format!(
                    "  {} '{}': FAILED: {}\n",
                    target.kind, target.name, error
                )),
                None => out.push_str(&format!("  {} '{}': ok\n", target.kind, target.name)),
            }
        }
        out.trim_end().to_string()
    }
}

/// Verify one target kind: a sheet, a project's environment sheets, or a
/// schema. Sheets that pass keep any defaults injected during
/// validation.
pub fn verify(
    home: &Path,
    sheet: Option<&str>,
    project: Option<&str>,
    environment: Option<&str>,
    schema: Option<&str>,
) -> Result<VerifyReport> {
    let catalog = Catalog::open(home)?;
    if environment.is_some() && project.is_none() {
        return Err(Error::InvalidInput("--env needs --project".to_string()));
    }

    let mut targets = Vec::new();
    match (sheet, project, schema) {
        (Some(sheet), None, None) => {
            targets.push(verify_sheet(&catalog, sheet));
        }
        (None, Some(project), None) => {
            let project = catalog.projects.get(project)?;
            let environments = match environment {
                Some(environment) => {
                    if !project.has_environment(environment) {
                        return Err(Error::NotFound(format!(
                            "environment '{}' in project '{}'",
                            environment, project.entity.name
                        )));
                    }
                    vec![environment.to_string()]
                }
                None => project.environment_names(),
            };
            for environment in environments {
                let name = environment_sheet_name(&project.entity.name, &environment);
                targets.push(verify_sheet(&catalog, &name));
            }
        }
        (None, None, Some(schema)) => {
            targets.push(verify_schema(&catalog, schema));
        }
        _ => {
            return Err(Error::InvalidInput(
                "choose one of --sheet, --project or --schema".to_string(),
            ));
        }
    }

    let failed = targets.iter().filter(|t| !t.ok).count();
    Ok(VerifyReport {
        ok: failed == 0,
        checked: targets.len(),
        failed,
        targets,
    })
}

fn verify_sheet(catalog: &Catalog, name: &str) -> VerifyOutcome {
    let outcome = |ok: bool, error: Option<String>| VerifyOutcome {
        kind: "config sheet".to_string(),
        name: name.to_string(),
        ok,
        error,
    };
    let mut sheet = match catalog.sheets.get(name) {
        Ok(sheet) => sheet,
        Err(e) => return outcome(false, Some(e.to_string())),
    };
    let before = sheet.values.clone();
    if let Err(e) = Validator::new().validate_sheet(catalog, &mut sheet) {
        return outcome(false, Some(e.to_string()));
    }
    // persist defaults injected by validation
    if sheet.values != before {
        if let Err(e) = catalog.sheets.save(&sheet) {
            return outcome(false, Some(e.to_string()));
        }
    }
    outcome(true, None)
}

fn verify_schema(catalog: &Catalog, name: &str) -> VerifyOutcome {
    let outcome = |ok: bool, error: Option<String>| VerifyOutcome {
        kind: "schema".to_string(),
        name: name.to_string(),
        ok,
        error,
    };
    let schema = match catalog.schemas.get(name) {
        Ok(schema) => schema,
        Err(e) => return outcome(false, Some(e.to_string())),
    };
    if let Err(e) = Validator::new().validate_schema(&schema) {
        return outcome(false, Some(e.to_string()));
    }
    if let Err(e) = resolve_schema(catalog, &schema) {
        return outcome(false, Some(e.to_string()));
    }
    outcome(true, None)
}
