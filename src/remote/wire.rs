//! Wire types for the remote configuration service.
//!
//! One DTO per endpoint payload, decoded strictly: unknown fields are
//! rejected instead of silently dropped, so a shape change on the service
//! side surfaces as an error rather than defaulted data. Timestamps are
//! the exception and stay lenient, because the service emits several
//! formats.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::models::VarKind;

/// Timestamp as the service emits it.
///
/// Parsing tries microsecond and plain-second naive forms (assumed UTC),
/// then RFC 3339. Anything else reads as absent rather than failing the
/// payload. Serializes as RFC 3339 with microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApiTime(pub Option<DateTime<Utc>>);

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.6f", "%Y-%m-%dT%H:%M:%S"];

impl ApiTime {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_none()
    }

    fn parse(raw: &str) -> Option<DateTime<Utc>> {
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl From<DateTime<Utc>> for ApiTime {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(Some(dt))
    }
}

impl Serialize for ApiTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Some(dt) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for ApiTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(ApiTime(raw.as_deref().and_then(ApiTime::parse)))
    }
}

/// Variable as the service represents it. The wire carries no display
/// title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableDto {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: VarKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default)]
    pub required: bool,
}

/// Schema payload for `/schemas`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDto {
    pub guid: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub is_public: bool,

    #[serde(default)]
    pub variables: Vec<VariableDto>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,

    #[serde(default, skip_serializing_if = "ApiTime::is_zero")]
    pub created_at: ApiTime,

    #[serde(default, skip_serializing_if = "ApiTime::is_zero")]
    pub updated_at: ApiTime,
}

/// Project payload for `/projects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDto {
    pub guid: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema_guid: Option<String>,

    #[serde(default, skip_serializing_if = "ApiTime::is_zero")]
    pub created_at: ApiTime,

    #[serde(default, skip_serializing_if = "ApiTime::is_zero")]
    pub updated_at: ApiTime,
}

/// Config sheet payload for `/config-sheets`. The service calls value
/// assignments `variables`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetDto {
    pub guid: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub project_guid: String,

    pub schema_guid: String,

    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "ApiTime::is_zero")]
    pub created_at: ApiTime,

    #[serde(default, skip_serializing_if = "ApiTime::is_zero")]
    pub updated_at: ApiTime,
}

/// Error body the service returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}
