//! Conversions between local entities and wire payloads, plus the
//! timestamp policy that decides when a copy is worth transferring.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use crate::models::{ConfigSheet, Entity, Project, Schema, SchemaRef, Variable};
use crate::remote::wire::{ProjectDto, SchemaDto, SheetDto, VariableDto};

/// Decides whether a local entity should be written to the remote.
///
/// An entity with no remote counterpart always goes up. Otherwise the
/// local copy must be newer, with one second of tolerance for clock skew
/// between this machine and the service.
pub fn should_push(local: DateTime<Utc>, remote: Option<DateTime<Utc>>, force: bool) -> bool {
    if force {
        return true;
    }
    match remote {
        None => true,
        Some(remote) => local > remote - Duration::seconds(1),
    }
}

/// Mirror of [`should_push`] for the download direction.
pub fn should_pull(local: Option<DateTime<Utc>>, remote: Option<DateTime<Utc>>, force: bool) -> bool {
    if force {
        return true;
    }
    match (local, remote) {
        (None, _) => true,
        (Some(local), Some(remote)) => remote > local - Duration::seconds(1),
        (Some(_), None) => false,
    }
}

pub fn variable_to_wire(variable: &Variable) -> VariableDto {
    VariableDto {
        name: variable.name.clone(),
        kind: variable.kind,
        regex: variable.regex.clone(),
        default: variable.default.clone(),
        required: variable.required,
    }
}

pub fn variable_from_wire(dto: &VariableDto) -> Variable {
    Variable {
        name: dto.name.clone(),
        kind: dto.kind,
        title: None,
        regex: dto.regex.clone(),
        default: dto.default.clone(),
        required: dto.required,
    }
}

pub fn schema_to_wire(schema: &Schema) -> SchemaDto {
    SchemaDto {
        guid: schema.entity.id.clone(),
        name: schema.entity.name.clone(),
        description: schema.entity.description.clone(),
        is_public: false,
        variables: schema.variables.iter().map(variable_to_wire).collect(),
        extends: schema.extends.clone(),
        created_at: schema.entity.created_at.into(),
        updated_at: schema.entity.updated_at.into(),
    }
}

pub fn schema_from_wire(dto: &SchemaDto, remote_url: &str) -> Schema {
    Schema {
        entity: entity_from_wire(
            &dto.guid,
            &dto.name,
            dto.description.clone(),
            remote_url,
            dto.created_at.time(),
            dto.updated_at.time(),
        ),
        variables: dto.variables.iter().map(variable_from_wire).collect(),
        extends: dto.extends.clone(),
    }
}

pub fn project_to_wire(project: &Project, default_schema_guid: Option<String>) -> ProjectDto {
    ProjectDto {
        guid: project.entity.id.clone(),
        name: project.entity.name.clone(),
        description: project.entity.description.clone(),
        default_schema_guid,
        created_at: project.entity.created_at.into(),
        updated_at: project.entity.updated_at.into(),
    }
}

pub fn project_from_wire(dto: &ProjectDto, remote_url: &str) -> Project {
    Project {
        entity: entity_from_wire(
            &dto.guid,
            &dto.name,
            dto.description.clone(),
            remote_url,
            dto.created_at.time(),
            dto.updated_at.time(),
        ),
        schema: dto.default_schema_guid.clone(),
        environments: BTreeMap::new(),
    }
}

/// The caller resolves which project and schema the sheet hangs off,
/// since the wire wants guids while local sheets may hold names.
pub fn sheet_to_wire(sheet: &ConfigSheet, project_guid: &str, schema_guid: &str) -> SheetDto {
    SheetDto {
        guid: sheet.entity.id.clone(),
        name: sheet.entity.name.clone(),
        description: sheet.entity.description.clone(),
        project_guid: project_guid.to_string(),
        schema_guid: schema_guid.to_string(),
        variables: sheet.values.clone(),
        extends: sheet.extends.clone(),
        is_active: true,
        created_at: sheet.entity.created_at.into(),
        updated_at: sheet.entity.updated_at.into(),
    }
}

pub fn sheet_from_wire(dto: &SheetDto, remote_url: &str) -> ConfigSheet {
    let schema = if dto.schema_guid.is_empty() {
        None
    } else {
        Some(SchemaRef::schema(&dto.schema_guid))
    };
    let project = if dto.project_guid.is_empty() {
        None
    } else {
        Some(dto.project_guid.clone())
    };
    ConfigSheet {
        entity: entity_from_wire(
            &dto.guid,
            &dto.name,
            dto.description.clone(),
            remote_url,
            dto.created_at.time(),
            dto.updated_at.time(),
        ),
        schema,
        project,
        environment: None,
        values: dto.variables.clone(),
        extends: dto.extends.clone(),
    }
}

fn entity_from_wire(
    guid: &str,
    name: &str,
    description: Option<String>,
    remote_url: &str,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
) -> Entity {
    // Absent timestamps read as the epoch so any dated remote copy wins
    // the next comparison.
    Entity {
        id: guid.to_string(),
        name: name.to_string(),
        description,
        remote: Some(remote_url.to_string()),
        local: false,
        created_at: created_at.unwrap_or(DateTime::UNIX_EPOCH),
        updated_at: updated_at.unwrap_or(DateTime::UNIX_EPOCH),
    }
}
