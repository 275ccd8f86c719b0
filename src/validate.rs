//! Schema and config sheet validation.
//!
//! Values are checked against their variable's declared kind and optional
//! regex. Sheet validation resolves both the schema chain and the sheet
//! chain first, then injects declared defaults for missing variables into
//! the sheet's own values. Inherited values satisfy their variables without
//! being copied in.

use std::collections::HashMap;

use regex::Regex;
use url::Url;

use crate::models::{ConfigSheet, Schema, SchemaRef, VarKind, Variable};
use crate::resolve::{resolve_schema, resolve_sheet};
use crate::store::Catalog;
use crate::{Error, Result};

/// Validates schemas, values, and config sheets.
///
/// Compiled regexes are cached by pattern and reused across calls.
pub struct Validator {
    regexes: HashMap<String, Regex>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            regexes: HashMap::new(),
        }
    }

    fn pattern(&mut self, pattern: &str) -> Result<&Regex> {
        if !self.regexes.contains_key(pattern) {
            let compiled = Regex::new(pattern)
                .map_err(|e| Error::Validation(format!("invalid regex '{}': {}", pattern, e)))?;
            self.regexes.insert(pattern.to_string(), compiled);
        }
        Ok(&self.regexes[pattern])
    }

    /// Check a variable declaration: non-empty name, compilable regex,
    /// and a default (if any) that passes its own constraints.
    pub fn validate_variable(&mut self, var: &Variable) -> Result<()> {
        if var.name.trim().is_empty() {
            return Err(Error::Validation(
                "variable with an empty name".to_string(),
            ));
        }
        if let Some(pattern) = &var.regex {
            self.pattern(pattern)?;
        }
        if let Some(default) = &var.default {
            if let Err(e) = self.validate_value(var, default) {
                let reason = match e {
                    Error::Validation(msg) => msg,
                    other => return Err(other),
                };
                return Err(Error::Validation(format!("invalid default: {}", reason)));
            }
        }
        Ok(())
    }

    /// Check every variable a schema declares itself. Inherited variables
    /// are checked on their own schemas.
    pub fn validate_schema(&mut self, schema: &Schema) -> Result<()> {
        for var in &schema.variables {
            self.validate_variable(var)?;
        }
        Ok(())
    }

    /// Check a concrete value against a variable declaration.
    pub fn validate_value(&mut self, var: &Variable, value: &str) -> Result<()> {
        if value.is_empty() {
            if var.required {
                return Err(Error::Validation(format!(
                    "variable '{}' is required but empty",
                    var.name
                )));
            }
            return Ok(());
        }

        match var.kind {
            VarKind::String => {}
            VarKind::Boolean => {
                if value != "true" && value != "false" {
                    return Err(Error::Validation(format!(
                        "variable '{}' must be 'true' or 'false', got '{}'",
                        var.name, value
                    )));
                }
            }
            VarKind::Number => {
                let ok = value.parse::<f64>().map(f64::is_finite).unwrap_or(false);
                if !ok {
                    return Err(Error::Validation(format!(
                        "variable '{}' must be a number, got '{}'",
                        var.name, value
                    )));
                }
            }
            VarKind::Url => {
                if Url::parse(value).is_err() {
                    return Err(Error::Validation(format!(
                        "variable '{}' must be an absolute URL, got '{}'",
                        var.name, value
                    )));
                }
            }
        }

        if let Some(pattern) = &var.regex {
            let re = self.pattern(pattern)?;
            if !re.is_match(value) {
                return Err(Error::Validation(format!(
                    "variable '{}' value '{}' does not match '{}'",
                    var.name, value, pattern
                )));
            }
        }
        Ok(())
    }

    /// Validate a sheet's effective values against its effective schema.
    ///
    /// Missing variables take their declared default, written into the
    /// sheet's own `values`; a missing required variable without a default
    /// fails. The caller persists the sheet to keep injected defaults.
    pub fn validate_sheet(&mut self, catalog: &Catalog, sheet: &mut ConfigSheet) -> Result<()> {
        let schema = effective_schema(catalog, sheet)?;
        let variables = resolve_schema(catalog, &schema)?;
        let resolved = resolve_sheet(catalog, sheet)?;

        for var in &variables {
            match resolved.values.get(&var.name) {
                Some(value) => {
                    if let Err(e) = self.validate_value(var, value) {
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
                None => {
                    if let Some(default) = &var.default {
                        sheet.values.insert(var.name.clone(), default.clone());
                    } else if var.required {
                        return Err(Error::Validation(format!(
                            "config sheet '{}': required variable '{}' is not set",
                            sheet.entity.name, var.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// The schema a sheet is validated against: its reference loaded from the
/// catalog, or a throwaway schema synthesized from inline variables.
pub fn effective_schema(catalog: &Catalog, sheet: &ConfigSheet) -> Result<Schema> {
    match &sheet.schema {
        Some(reference @ SchemaRef::Reference(_)) => {
            let target = reference.target().unwrap_or_default();
            match catalog.schemas.get(target) {
                Ok(schema) => Ok(schema),
                Err(Error::NotFound(_)) => Err(Error::MissingDependency(format!(
                    "config sheet '{}' references unknown schema '{}'",
                    sheet.entity.name, target
                ))),
                Err(e) => Err(e),
            }
        }
        Some(SchemaRef::Inline(vars)) => {
            let mut schema = Schema::new(format!("{}-inline", sheet.entity.name));
            schema.variables = vars.values().cloned().collect();
            Ok(schema)
        }
        None => Err(Error::Validation(format!(
            "config sheet '{}' has no schema reference or inline variables",
            sheet.entity.name
        ))),
    }
}
