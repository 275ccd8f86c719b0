//! Rigging - typed environment configuration with remote sync.
//!
//! This library provides the core functionality for the `rig` CLI tool:
//! schemas of typed variables, config sheets holding concrete values,
//! projects grouping environments, and push/pull synchronization against
//! a remote configuration service.

pub mod audit;
pub mod cli;
pub mod commands;
pub mod mask;
pub mod models;
pub mod remote;
pub mod resolve;
pub mod settings;
pub mod store;
pub mod sync;
pub mod validate;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::Path;

    use tempfile::TempDir;

    use crate::models::{ConfigSheet, Project, Schema, SchemaRef, Variable};
    use crate::store::Catalog;

    /// Test environment backed by a temporary storage home.
    pub struct TestEnv {
        pub home: TempDir,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self {
                home: TempDir::new().unwrap(),
            }
        }

        pub fn path(&self) -> &Path {
            self.home.path()
        }

        /// Open a catalog rooted at this environment's home.
        pub fn catalog(&self) -> Catalog {
            Catalog::open(self.path()).unwrap()
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Build a schema with the given variables and extends chain.
    pub fn make_schema(name: &str, variables: Vec<Variable>, extends: Vec<&str>) -> Schema {
        let mut schema = Schema::new(name.to_string());
        schema.variables = variables;
        schema.extends = extends.into_iter().map(String::from).collect();
        schema
    }

    /// Build a sheet referencing `schema`, with `values` as KEY=VALUE pairs.
    pub fn make_sheet(name: &str, schema: Option<SchemaRef>, values: &[(&str, &str)]) -> ConfigSheet {
        let mut sheet = ConfigSheet::new(name.to_string());
        sheet.schema = schema;
        for (k, v) in values {
            sheet.values.insert(k.to_string(), v.to_string());
        }
        sheet
    }

    /// Build a project with a default schema and no environments.
    pub fn make_project(name: &str, schema: Option<&str>) -> Project {
        let mut project = Project::new(name.to_string());
        project.schema = schema.map(String::from);
        project
    }

    /// In-memory stand-in for the remote service. Mutating calls are
    /// logged as `"<verb> <kind> <name>"` (deletes log the guid) so tests
    /// can assert ordering, and `fail_on` makes any mutation of that
    /// entity name error.
    #[derive(Default)]
    pub struct FakeRemote {
        pub schemas: std::cell::RefCell<Vec<crate::remote::wire::SchemaDto>>,
        pub projects: std::cell::RefCell<Vec<crate::remote::wire::ProjectDto>>,
        pub sheets: std::cell::RefCell<Vec<crate::remote::wire::SheetDto>>,
        pub calls: std::cell::RefCell<Vec<String>>,
        pub fail_on: Option<String>,
    }

    impl FakeRemote {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn mutate(&self, verb: &str, kind: &str, name: &str) -> crate::Result<()> {
            if self.fail_on.as_deref() == Some(name) {
                return Err(crate::Error::Remote(format!("HTTP 500: {} rejected", name)));
            }
            self.calls
                .borrow_mut()
                .push(format!("{} {} {}", verb, kind, name));
            Ok(())
        }
    }

    impl crate::remote::RemoteApi for FakeRemote {
        fn health(&self) -> crate::Result<()> {
            Ok(())
        }

        fn list_schemas(&self) -> crate::Result<Vec<crate::remote::wire::SchemaDto>> {
            Ok(self.schemas.borrow().clone())
        }

        fn create_schema(
            &self,
            schema: &crate::remote::wire::SchemaDto,
        ) -> crate::Result<crate::remote::wire::SchemaDto> {
            self.mutate("create", "schema", &schema.name)?;
            self.schemas.borrow_mut().push(schema.clone());
            Ok(schema.clone())
        }

        fn update_schema(
            &self,
            guid: &str,
            schema: &crate::remote::wire::SchemaDto,
        ) -> crate::Result<crate::remote::wire::SchemaDto> {
            self.mutate("update", "schema", &schema.name)?;
            let mut schemas = self.schemas.borrow_mut();
            match schemas.iter_mut().find(|s| s.guid == guid) {
                Some(slot) => {
                    *slot = schema.clone();
                    Ok(schema.clone())
                }
                None => Err(crate::Error::Remote(format!("HTTP 404: schema {}", guid))),
            }
        }

        fn delete_schema(&self, guid: &str) -> crate::Result<()> {
            self.mutate("delete", "schema", guid)?;
            self.schemas.borrow_mut().retain(|s| s.guid != guid);
            Ok(())
        }

        fn list_projects(&self) -> crate::Result<Vec<crate::remote::wire::ProjectDto>> {
            Ok(self.projects.borrow().clone())
        }

        fn create_project(
            &self,
            project: &crate::remote::wire::ProjectDto,
        ) -> crate::Result<crate::remote::wire::ProjectDto> {
            self.mutate("create", "project", &project.name)?;
            self.projects.borrow_mut().push(project.clone());
            Ok(project.clone())
        }

        fn update_project(
            &self,
            guid: &str,
            project: &crate::remote::wire::ProjectDto,
        ) -> crate::Result<crate::remote::wire::ProjectDto> {
            self.mutate("update", "project", &project.name)?;
            let mut projects = self.projects.borrow_mut();
            match projects.iter_mut().find(|p| p.guid == guid) {
                Some(slot) => {
                    *slot = project.clone();
                    Ok(project.clone())
                }
                None => Err(crate::Error::Remote(format!("HTTP 404: project {}", guid))),
            }
        }

        fn list_sheets(
            &self,
            filter: &crate::remote::SheetFilter,
        ) -> crate::Result<Vec<crate::remote::wire::SheetDto>> {
            Ok(self
                .sheets
                .borrow()
                .iter()
                .filter(|s| filter.matches(s))
                .cloned()
                .collect())
        }

        fn create_sheet(
            &self,
            sheet: &crate::remote::wire::SheetDto,
        ) -> crate::Result<crate::remote::wire::SheetDto> {
            self.mutate("create", "sheet", &sheet.name)?;
            self.sheets.borrow_mut().push(sheet.clone());
            Ok(sheet.clone())
        }

        fn update_sheet(
            &self,
            guid: &str,
            sheet: &crate::remote::wire::SheetDto,
        ) -> crate::Result<crate::remote::wire::SheetDto> {
            self.mutate("update", "sheet", &sheet.name)?;
            let mut sheets = self.sheets.borrow_mut();
            match sheets.iter_mut().find(|s| s.guid == guid) {
                Some(slot) => {
                    *slot = sheet.clone();
                    Ok(sheet.clone())
                }
                None => Err(crate::Error::Remote(format!("HTTP 404: sheet {}", guid))),
            }
        }

        fn delete_sheet(&self, guid: &str) -> crate::Result<()> {
            self.mutate("delete", "sheet", guid)?;
            self.sheets.borrow_mut().retain(|s| s.guid != guid);
            Ok(())
        }
    }
}

/// Library-level error type for rigging operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("circular dependency detected in {0}")]
    CircularDependency(String),

    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error("remote API error: {0}")]
    Remote(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for rigging operations.
pub type Result<T> = std::result::Result<T, Error>;
