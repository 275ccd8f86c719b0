//! Remote configuration service integration.
//!
//! [`RemoteApi`] is the seam between sync logic and the network: the
//! real [`Client`] speaks HTTP, tests substitute an in-memory fake.

pub mod client;
pub mod convert;
pub mod wire;

pub use client::Client;

use crate::Result;
use wire::{ProjectDto, SchemaDto, SheetDto};

/// Narrowing criteria for sheet listings.
#[derive(Debug, Clone, Default)]
pub struct SheetFilter {
    pub project_guid: Option<String>,
    pub schema_guid: Option<String>,
    pub active_only: bool,
}

impl SheetFilter {
    pub fn for_project(guid: &str) -> Self {
        Self {
            project_guid: Some(guid.to_string()),
            ..Self::default()
        }
    }

    /// Query string for the listing endpoint, empty when unfiltered.
    pub fn query(&self) -> String {
        let mut params = Vec::new();
        if let Some(guid) = &self.project_guid {
            params.push(format!("project_guid={}", guid));
        }
        if let Some(guid) = &self.schema_guid {
            params.push(format!("schema_guid={}", guid));
        }
        if self.active_only {
            params.push("active_only=true".to_string());
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }

    /// Client-side equivalent of the server's filtering, for fakes.
    pub fn matches(&self, sheet: &SheetDto) -> bool {
        if let Some(guid) = &self.project_guid {
            if &sheet.project_guid != guid {
                return false;
            }
        }
        if let Some(guid) = &self.schema_guid {
            if &sheet.schema_guid != guid {
                return false;
            }
        }
        if self.active_only && !sheet.is_active {
            return false;
        }
        true
    }
}

/// Operations the sync layer needs from a remote service.
pub trait RemoteApi {
    fn health(&self) -> Result<()>;

    fn list_schemas(&self) -> Result<Vec<SchemaDto>>;
    fn create_schema(&self, schema: &SchemaDto) -> Result<SchemaDto>;
    fn update_schema(&self, guid: &str, schema: &SchemaDto) -> Result<SchemaDto>;
    fn delete_schema(&self, guid: &str) -> Result<()>;

    fn list_projects(&self) -> Result<Vec<ProjectDto>>;
    fn create_project(&self, project: &ProjectDto) -> Result<ProjectDto>;
    fn update_project(&self, guid: &str, project: &ProjectDto) -> Result<ProjectDto>;

    fn list_sheets(&self, filter: &SheetFilter) -> Result<Vec<SheetDto>>;
    fn create_sheet(&self, sheet: &SheetDto) -> Result<SheetDto>;
    fn update_sheet(&self, guid: &str, sheet: &SheetDto) -> Result<SheetDto>;
    fn delete_sheet(&self, guid: &str) -> Result<()>;

    fn find_schema(&self, name: &str) -> Result<Option<SchemaDto>> {
        Ok(self.list_schemas()?.into_iter().find(|s| s.name == name))
    }

    fn find_project(&self, name: &str) -> Result<Option<ProjectDto>> {
        Ok(self.list_projects()?.into_iter().find(|p| p.name == name))
    }

    fn find_sheet(&self, name: &str) -> Result<Option<SheetDto>> {
        Ok(self
            .list_sheets(&SheetFilter::default())?
            .into_iter()
            .find(|s| s.name == name))
    }
}
