//! Inheritance resolution for schemas and config sheets.
//!
//! Both entity types carry an `extends` list of names or UUIDs. Resolution
//! walks the chain depth-first in declared order: extended entities
//! contribute first, then the entity's own declarations overlay them, so
//! the last definition of a name wins while the first occurrence keeps its
//! position.
//!
//! Cycle detection marks entities on the current descent path and unmarks
//! them on the way back out. A diamond (two branches sharing an ancestor)
//! resolves the ancestor once per branch; only a true cycle fails.

use std::collections::{BTreeMap, HashSet};

use crate::models::{ConfigSheet, Schema, Variable};
use crate::store::Catalog;
use crate::{Error, Result};

/// Resolve a schema's full variable list through its extends chain.
pub fn resolve_schema(catalog: &Catalog, schema: &Schema) -> Result<Vec<Variable>> {
    let mut path = HashSet::new();
    resolve_schema_variables(catalog, schema, &mut path)
}

fn resolve_schema_variables(
    catalog: &Catalog,
    schema: &Schema,
    path: &mut HashSet<String>,
) -> Result<Vec<Variable>> {
    if !path.insert(schema.entity.id.clone()) {
        return Err(Error::CircularDependency(format!(
            "schema '{}'",
            schema.entity.name
        )));
    }

    let mut merged: Vec<Variable> = Vec::new();
    for parent_key in &schema.extends {
        let parent = match catalog.schemas.get(parent_key) {
            Ok(parent) => parent,
            Err(Error::NotFound(_)) => {
                return Err(Error::MissingDependency(format!(
                    "schema '{}' extends unknown schema '{}'",
                    schema.entity.name, parent_key
                )));
            }
            Err(e) => return Err(e),
        };
        for var in resolve_schema_variables(catalog, &parent, path)? {
            upsert_variable(&mut merged, var);
        }
    }
    for var in &schema.variables {
        upsert_variable(&mut merged, var.clone());
    }

    path.remove(&schema.entity.id);
    Ok(merged)
}

/// Resolve a sheet's effective values through its extends chain.
///
/// Returns a copy of `sheet` with `values` replaced by the merged map. The
/// sheet's own entries win over anything inherited.
pub fn resolve_sheet(catalog: &Catalog, sheet: &ConfigSheet) -> Result<ConfigSheet> {
    let mut path = HashSet::new();
    let values = resolve_sheet_values(catalog, sheet, &mut path)?;
    let mut resolved = sheet.clone();
    resolved.values = values;
    Ok(resolved)
}

fn resolve_sheet_values(
    catalog: &Catalog,
    sheet: &ConfigSheet,
    path: &mut HashSet<String>,
) -> Result<BTreeMap<String, String>> {
    if !path.insert(sheet.entity.id.clone()) {
        return Err(Error::CircularDependency(format!(
            "config sheet '{}'",
            sheet.entity.name
        )));
    }

    let mut merged = BTreeMap::new();
    for parent_key in &sheet.extends {
        let parent = match catalog.sheets.get(parent_key) {
            Ok(parent) => parent,
            Err(Error::NotFound(_)) => {
                return Err(Error::MissingDependency(format!(
                    "config sheet '{}' extends unknown sheet '{}'",
                    sheet.entity.name, parent_key
                )));
            }
            Err(e) => return Err(e),
        };
        merged.extend(resolve_sheet_values(catalog, &parent, path)?);
    }
    for (key, value) in &sheet.values {
        merged.insert(key.clone(), value.clone());
    }

    path.remove(&sheet.entity.id);
    Ok(merged)
}

fn upsert_variable(list: &mut Vec<Variable>, var: Variable) {
    if let Some(existing) = list.iter_mut().find(|v| v.name == var.name) {
        *existing = var;
    } else {
        list.push(var);
    }
}
