//! Runtime settings: storage home and remote endpoint resolution.
//!
//! The storage home comes from `--home`, then `RIG_HOME`, then
//! `~/.rigging` (the flag/env precedence is handled by the CLI parser;
//! this module supplies the default). Remote settings come from
//! `--remote` / `RIG_REMOTE_URL` plus the API key environment.

use std::path::PathBuf;

use crate::{Error, Result};

/// Environment variable overriding the storage home.
pub const HOME_ENV: &str = "RIG_HOME";

/// Environment variable holding the default remote URL.
pub const REMOTE_URL_ENV: &str = "RIG_REMOTE_URL";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "RIG_API_KEY";

/// Directory name under the user's home directory.
pub const DEFAULT_HOME_DIR: &str = ".rigging";

/// Resolve the storage home from an already-parsed flag/env value.
pub fn resolve_home(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Other("could not determine home directory".to_string()))?;
    Ok(home.join(DEFAULT_HOME_DIR))
}

/// Remote endpoint configuration.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Resolve the remote endpoint: `--remote` first, then `RIG_REMOTE_URL`.
pub fn resolve_remote(flag: Option<&str>) -> Result<RemoteSettings> {
    let raw = match flag {
        Some(url) => url.to_string(),
        None => std::env::var(REMOTE_URL_ENV).map_err(|_| {
            Error::InvalidInput(format!(
                "no remote configured: pass --remote or set {}",
                REMOTE_URL_ENV
            ))
        })?,
    };
    let base_url = parse_remote_url(&raw)?;
    let api_key = api_key_for(&base_url);
    Ok(RemoteSettings { base_url, api_key })
}

/// Normalize a remote spec into a base URL.
///
/// Full `http(s)://` URLs are used as-is minus any trailing slash. The
/// shorthand `org@host[/path]` expands to `https://{org}.{host}/api`.
pub fn parse_remote_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(trimmed.trim_end_matches('/').to_string());
    }
    let invalid = || {
        Error::InvalidInput(format!(
            "invalid remote '{}': expected a URL or org@host",
            trimmed
        ))
    };
    let (org, rest) = trimmed.split_once('@').ok_or_else(invalid)?;
    let host = rest.split('/').next().unwrap_or(rest);
    if org.is_empty() || host.is_empty() {
        return Err(invalid());
    }
    Ok(format!("https://{}.{}/api", org, host))
}

/// Look up the API key: `RIG_API_KEY` first, then the host-specific
/// `RIG_API_KEY_<HOST>` form (host uppercased, non-alphanumerics as `_`).
pub fn api_key_for(base_url: &str) -> Option<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.is_empty() {
            return Some(key);
        }
    }
    let host = url::Url::parse(base_url).ok()?.host_str()?.to_string();
    let suffix: String = host
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    std::env::var(format!("{}_{}", API_KEY_ENV, suffix))
        .ok()
        .filter(|key| !key.is_empty())
}
