//! HTTP client for the remote configuration service.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::remote::wire::{ApiErrorBody, ProjectDto, SchemaDto, SheetDto};
use crate::remote::{RemoteApi, SheetFilter};
use crate::settings::RemoteSettings;
use crate::{Error, Result};

/// Client for one service instance. Requests carry a bearer token when an
/// API key is configured and time out after thirty seconds.
pub struct Client {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
}

impl Client {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn from_settings(settings: &RemoteSettings) -> Self {
        Self::new(&settings.base_url, settings.api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let mut request = self
            .agent
            .request(method, &format!("{}{}", self.base_url, path))
            .set("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }
        request
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        match self.request("GET", path).call() {
            Ok(resp) => parse_body(resp),
            Err(e) => Err(remote_error(e)),
        }
    }

    fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        path: &str,
        body: &B,
    ) -> Result<T> {
        match self.request(method, path).send_json(body) {
            Ok(resp) => parse_body(resp),
            Err(e) => Err(remote_error(e)),
        }
    }

    fn delete(&self, path: &str) -> Result<()> {
        match self.request("DELETE", path).call() {
            Ok(_) => Ok(()),
            Err(e) => Err(remote_error(e)),
        }
    }
}

fn parse_body<T: DeserializeOwned>(resp: ureq::Response) -> Result<T> {
    resp.into_json()
        .map_err(|e| Error::Remote(format!("failed to parse response: {}", e)))
}

fn remote_error(err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail)
                .unwrap_or(body);
            if detail.is_empty() {
                Error::Remote(format!("HTTP {}", code))
            } else {
                Error::Remote(format!("HTTP {}: {}", code, detail))
            }
        }
        e => Error::Remote(e.to_string()),
    }
}

impl RemoteApi for Client {
    fn health(&self) -> Result<()> {
        match self.request("GET", "/health").call() {
            Ok(_) => Ok(()),
            Err(e) => Err(remote_error(e)),
        }
    }

    fn list_schemas(&self) -> Result<Vec<SchemaDto>> {
        self.get_json("/schemas")
    }

    fn create_schema(&self, schema: &SchemaDto) -> Result<SchemaDto> {
        self.send_json("POST", "/schemas", schema)
    }

    fn update_schema(&self, guid: &str, schema: &SchemaDto) -> Result<SchemaDto> {
        self.send_json("PUT", &format!("/schemas/{}", guid), schema)
    }

    fn delete_schema(&self, guid: &str) -> Result<()> {
        self.delete(&format!("/schemas/{}", guid))
    }

    fn list_projects(&self) -> Result<Vec<ProjectDto>> {
        self.get_json("/projects")
    }

    fn create_project(&self, project: &ProjectDto) -> Result<ProjectDto> {
        self.send_json("POST", "/projects", project)
    }

    fn update_project(&self, guid: &str, project: &ProjectDto) -> Result<ProjectDto> {
        self.send_json("PUT", &format!("/projects/{}", guid), project)
    }

    fn list_sheets(&self, filter: &SheetFilter) -> Result<Vec<SheetDto>> {
        self.get_json(&format!("/config-sheets{}", filter.query()))
    }

    fn create_sheet(&self, sheet: &SheetDto) -> Result<SheetDto> {
        self.send_json("POST", "/config-sheets", sheet)
    }

    fn update_sheet(&self, guid: &str, sheet: &SheetDto) -> Result<SheetDto> {
        self.send_json("PUT", &format!("/config-sheets/{}", guid), sheet)
    }

    fn delete_sheet(&self, guid: &str) -> Result<()> {
        self.delete(&format!("/config-sheets/{}", guid))
    }
}
