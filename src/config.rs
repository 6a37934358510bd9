//! Endpoint and credential configuration.
//!
//! The document store and the identity provider are both reached over
//! HTTPS with an API key. Values are read from environment variables
//! first, falling back to an optional JSON settings file (the shell keeps
//! one next to its own state when env configuration is not practical).

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

// Environment variable names.
const ENV_STORE_URL: &str = "BORDADOS_STORE_URL";
const ENV_API_KEY: &str = "BORDADOS_API_KEY";
const ENV_AUTH_URL: &str = "BORDADOS_AUTH_URL";
const ENV_SETTINGS_FILE: &str = "BORDADOS_SETTINGS_FILE";

/// Connection settings for the store and identity provider.
///
/// `api_key` authenticates both: the identity provider takes it as the
/// `key` query parameter, the document store as the `X-Api-Key` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store_url: String,
    pub auth_url: String,
    pub api_key: String,
}

/// On-disk settings file shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    store_url: Option<String>,
    #[serde(default)]
    auth_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
}

impl Config {
    /// Load configuration from the environment. When `BORDADOS_SETTINGS_FILE`
    /// is set, the file supplies any value the environment leaves unset.
    pub fn from_env() -> Result<Self> {
        let mut lookup: HashMap<String, String> = HashMap::new();
        for key in [ENV_STORE_URL, ENV_API_KEY, ENV_AUTH_URL] {
            if let Ok(value) = std::env::var(key) {
                lookup.insert(key.to_string(), value);
            }
        }
        if let Ok(path) = std::env::var(ENV_SETTINGS_FILE) {
            let file = read_settings_file(Path::new(&path))?;
            merge_file_values(&mut lookup, &file);
        }
        Self::from_lookup(&lookup)
    }

    /// Build a config from pre-resolved values. Split out from `from_env`
    /// so tests do not have to mutate process-global environment state.
    pub fn from_lookup(lookup: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            lookup
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let store_url = get(ENV_STORE_URL)
            .ok_or_else(|| Error::Config(format!("missing {ENV_STORE_URL}")))?;
        let api_key =
            get(ENV_API_KEY).ok_or_else(|| Error::Config(format!("missing {ENV_API_KEY}")))?;
        // The identity provider usually lives on its own host; default to
        // the store host for single-endpoint deployments.
        let auth_url = get(ENV_AUTH_URL).unwrap_or_else(|| store_url.clone());

        Ok(Self {
            store_url,
            auth_url,
            api_key,
        })
    }

    /// Whether every mandatory value is present (mirrors the shell's
    /// "configured" gate before it shows the login screen).
    pub fn is_configured(&self) -> bool {
        !self.store_url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

fn read_settings_file(path: &Path) -> Result<SettingsFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("read settings file {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| Error::Config(format!("parse settings file {}: {e}", path.display())))
}

fn merge_file_values(lookup: &mut HashMap<String, String>, file: &SettingsFile) {
    let pairs = [
        (ENV_STORE_URL, &file.store_url),
        (ENV_AUTH_URL, &file.auth_url),
        (ENV_API_KEY, &file.api_key),
    ];
    for (key, value) in pairs {
        if lookup.contains_key(key) {
            continue;
        }
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            lookup.insert(key.to_string(), v.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn from_lookup_requires_store_url_and_api_key() {
        let err = Config::from_lookup(&lookup(&[(ENV_API_KEY, "k")])).unwrap_err();
        assert!(err.to_string().contains(ENV_STORE_URL), "got: {err}");

        let err = Config::from_lookup(&lookup(&[(ENV_STORE_URL, "https://db.example.com")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_API_KEY), "got: {err}");
    }

    #[test]
    fn auth_url_defaults_to_store_url() {
        let config = Config::from_lookup(&lookup(&[
            (ENV_STORE_URL, "https://db.example.com"),
            (ENV_API_KEY, "secret"),
        ]))
        .expect("config");
        assert_eq!(config.auth_url, "https://db.example.com");
        assert!(config.is_configured());
    }

    #[test]
    fn blank_values_are_treated_as_missing() {
        let err = Config::from_lookup(&lookup(&[
            (ENV_STORE_URL, "   "),
            (ENV_API_KEY, "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn settings_file_fills_missing_values_only() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"storeUrl":"https://file.example.com","authUrl":"https://auth.example.com","apiKey":"file-key"}}"#
        )
        .expect("write settings");

        let parsed = read_settings_file(file.path()).expect("parse");
        let mut resolved = lookup(&[(ENV_STORE_URL, "https://env.example.com")]);
        merge_file_values(&mut resolved, &parsed);

        let config = Config::from_lookup(&resolved).expect("config");
        // Env wins, file fills the rest.
        assert_eq!(config.store_url, "https://env.example.com");
        assert_eq!(config.auth_url, "https://auth.example.com");
        assert_eq!(config.api_key, "file-key");
    }
}
