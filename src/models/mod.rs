//! Data models for rigging entities.
//!
//! This module defines the core data structures:
//! - `Entity` - Common identity/timestamp core shared by all types
//! - `Schema` - Ordered typed variable declarations, with inheritance
//! - `ConfigSheet` - Concrete KEY=value assignments against a schema
//! - `Project` - Named environments, each backed by one sheet
//! - `Index` - Per-type name and summary index for the file store

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix used by schema references stored on config sheets.
pub const SCHEMA_REF_PREFIX: &str = "#/schemas/";

/// Common fields shared by schemas, projects, and config sheets.
///
/// Embedded (flattened) into each entity type so the on-disk JSON keeps
/// these keys at the top level of the object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier (UUID v4, immutable)
    pub id: String,

    /// Human-readable name, unique per entity type
    pub name: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Remote base URL when this entity is synced; absent for local-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,

    /// True when the entity was created locally
    pub local: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// Create a new local entity with a fresh UUID and current timestamps.
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description: None,
            remote: None,
            local: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// True when the entity has been synced with a remote.
    pub fn is_remote(&self) -> bool {
        self.remote.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// Type of a schema variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    #[default]
    String,
    Number,
    Boolean,
    Url,
}

impl VarKind {
    /// Get all variable kinds.
    pub fn all() -> &'static [VarKind] {
        &[
            VarKind::String,
            VarKind::Number,
            VarKind::Boolean,
            VarKind::Url,
        ]
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VarKind::String => "string",
            VarKind::Number => "number",
            VarKind::Boolean => "boolean",
            VarKind::Url => "url",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for VarKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "string" => Ok(VarKind::String),
            "number" => Ok(VarKind::Number),
            "boolean" => Ok(VarKind::Boolean),
            "url" => Ok(VarKind::Url),
            _ => Err(format!("Unknown variable type: {}", s)),
        }
    }
}

/// A typed variable declared by a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name (the KEY in KEY=value)
    pub name: String,

    /// Value type
    #[serde(rename = "type", default)]
    pub kind: VarKind,

    /// Optional display label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Optional regex the value must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    /// Optional default, injected when the value is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Whether a value is mandatory
    #[serde(default)]
    pub required: bool,
}

impl Variable {
    /// Create a variable of the given kind with no constraints.
    pub fn new(name: String, kind: VarKind) -> Self {
        Self {
            name,
            kind,
            title: None,
            regex: None,
            default: None,
            required: false,
        }
    }
}

/// A set of typed variable declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(flatten)]
    pub entity: Entity,

    /// Declared variables, in declaration order
    #[serde(default)]
    pub variables: Vec<Variable>,

    /// Names or UUIDs of schemas this one extends, in precedence order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
}

impl Schema {
    /// Create an empty schema with the given name.
    pub fn new(name: String) -> Self {
        Self {
            entity: Entity::new(name),
            variables: Vec::new(),
            extends: Vec::new(),
        }
    }

    /// Find a declared variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// How a config sheet names its schema: a reference to a stored schema,
/// or variable definitions carried inline on the sheet itself.
///
/// Serialized externally tagged, so the JSON is `{"ref": "..."}` or
/// `{"variables": {...}}` and an object carrying both keys fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaRef {
    /// Reference to a stored schema (`#/schemas/{uuid}`, or a bare name/UUID)
    #[serde(rename = "ref")]
    Reference(String),

    /// Inline variable definitions keyed by variable name
    #[serde(rename = "variables")]
    Inline(BTreeMap<String, Variable>),
}

impl SchemaRef {
    /// Build a reference to a stored schema by id.
    pub fn schema(id: &str) -> Self {
        SchemaRef::Reference(format!("{}{}", SCHEMA_REF_PREFIX, id))
    }

    /// The referenced schema name or UUID, with any `#/schemas/` prefix
    /// stripped. `None` for inline schemas.
    pub fn target(&self) -> Option<&str> {
        match self {
            SchemaRef::Reference(r) => Some(r.strip_prefix(SCHEMA_REF_PREFIX).unwrap_or(r)),
            SchemaRef::Inline(_) => None,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, SchemaRef::Inline(_))
    }
}

/// Concrete KEY=value assignments validated against a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSheet {
    #[serde(flatten)]
    pub entity: Entity,

    /// The schema this sheet is validated against; sheets without one
    /// fail validation until a schema is assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,

    /// Owning project UUID for environment-bound sheets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Environment name within the owning project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Variable assignments
    #[serde(default)]
    pub values: BTreeMap<String, String>,

    /// Names or UUIDs of sheets this one extends, in precedence order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
}

impl ConfigSheet {
    /// Create an empty sheet with the given name and no schema.
    pub fn new(name: String) -> Self {
        Self {
            entity: Entity::new(name),
            schema: None,
            project: None,
            environment: None,
            values: BTreeMap::new(),
            extends: Vec::new(),
        }
    }

    /// True when this sheet backs a project environment.
    pub fn is_environment_sheet(&self) -> bool {
        self.project.is_some() && self.environment.is_some()
    }
}

/// Canonical name of the sheet backing a project environment.
pub fn environment_sheet_name(project: &str, environment: &str) -> String {
    format!("{}-{}", project, environment)
}

/// A named environment within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
}

/// A collection of environments sharing a default schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(flatten)]
    pub entity: Entity,

    /// Default schema (name or UUID) for new environment sheets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Environments keyed by name
    #[serde(default)]
    pub environments: BTreeMap<String, Environment>,
}

impl Project {
    /// Create a project with no environments.
    pub fn new(name: String) -> Self {
        Self {
            entity: Entity::new(name),
            schema: None,
            environments: BTreeMap::new(),
        }
    }

    /// Register an environment. Returns false if it already exists.
    pub fn add_environment(&mut self, name: &str) -> bool {
        if self.environments.contains_key(name) {
            return false;
        }
        self.environments.insert(
            name.to_string(),
            Environment {
                name: name.to_string(),
            },
        );
        true
    }

    /// Deregister an environment. Returns false if it was not present.
    pub fn remove_environment(&mut self, name: &str) -> bool {
        self.environments.remove(name).is_some()
    }

    pub fn has_environment(&self, name: &str) -> bool {
        self.environments.contains_key(name)
    }

    /// Environment names in sorted order.
    pub fn environment_names(&self) -> Vec<String> {
        self.environments.keys().cloned().collect()
    }
}

/// Listing entry kept in the per-type index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub id: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,

    pub local: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl From<&Entity> for EntitySummary {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            description: entity.description.clone(),
            remote: entity.remote.clone(),
            local: entity.local,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Per-type index mapping names to UUIDs and UUIDs to summaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    /// Name → UUID lookup
    #[serde(default)]
    pub name_to_id: BTreeMap<String, String>,

    /// UUID → summary, one entry per stored entity
    #[serde(default)]
    pub summaries: BTreeMap<String, EntitySummary>,
}

impl Index {
    /// Record (or refresh) an entity. Aliases left behind by a rename are
    /// dropped so every name maps to a live entity.
    pub fn upsert(&mut self, entity: &Entity) {
        self.name_to_id
            .retain(|name, id| *id != entity.id || *name == entity.name);
        self.name_to_id
            .insert(entity.name.clone(), entity.id.clone());
        self.summaries
            .insert(entity.id.clone(), EntitySummary::from(entity));
    }

    /// Resolve a name or UUID to a UUID. UUIDs win when a name collides
    /// with one.
    pub fn resolve<'a>(&'a self, name_or_id: &'a str) -> Option<&'a str> {
        if self.summaries.contains_key(name_or_id) {
            return Some(name_or_id);
        }
        self.name_to_id.get(name_or_id).map(String::as_str)
    }

    /// Remove an entity and every alias pointing at it. Returns the removed
    /// UUID, or `None` if the key matched nothing.
    pub fn remove(&mut self, name_or_id: &str) -> Option<String> {
        let id = self.resolve(name_or_id)?.to_string();
        self.summaries.remove(&id);
        self.name_to_id.retain(|_, mapped| *mapped != id);
        Some(id)
    }

    pub fn contains(&self, name_or_id: &str) -> bool {
        self.resolve(name_or_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}
