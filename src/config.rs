// Configuration module: everything the run needs comes from the process
// environment. The three required variables keep the exact names the
// deployment already uses (`source_dir`, `clientId`, `clientSecret`).

use crate::error::{Result, SyncError};
use secrecy::SecretString;
use std::path::PathBuf;

pub const SOURCE_DIR_VAR: &str = "source_dir";
pub const CLIENT_ID_VAR: &str = "clientId";
pub const CLIENT_SECRET_VAR: &str = "clientSecret";
pub const BASE_URL_VAR: &str = "API_BASE_URL";

/// Fallback base URL when `API_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Remote folder every file is uploaded into.
pub const REMOTE_DIR: &str = "/docs/";

/// Service account credentials exchanged for a session token.
#[derive(Debug)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

/// Settings for one sync run.
#[derive(Debug)]
pub struct Config {
    pub source_dir: PathBuf,
    pub credentials: Credentials,
    pub base_url: String,
    pub remote_dir: String,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Missing or
    /// empty required values fail before anything else happens.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or(SyncError::MissingVar(key))
        };

        let source_dir = PathBuf::from(required(SOURCE_DIR_VAR)?);
        let client_id = required(CLIENT_ID_VAR)?;
        let client_secret = SecretString::from(required(CLIENT_SECRET_VAR)?);

        let base_url = lookup(BASE_URL_VAR)
            .map(|v| v.trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Config {
            source_dir,
            credentials: Credentials {
                client_id,
                client_secret,
            },
            base_url,
            remote_dir: REMOTE_DIR.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_reads_required_vars() {
        let config = Config::from_lookup(lookup_from(&[
            ("source_dir", "/tmp/photos"),
            ("clientId", "svc-account"),
            ("clientSecret", "hunter2"),
        ]))
        .unwrap();

        assert_eq!(config.source_dir, PathBuf::from("/tmp/photos"));
        assert_eq!(config.credentials.client_id, "svc-account");
        assert_eq!(config.credentials.client_secret.expose_secret(), "hunter2");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.remote_dir, "/docs/");
    }

    #[test]
    fn test_missing_var_is_named() {
        let err = Config::from_lookup(lookup_from(&[
            ("source_dir", "/tmp/photos"),
            ("clientSecret", "hunter2"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SyncError::MissingVar("clientId")));
    }

    #[test]
    fn test_empty_secret_is_missing() {
        let err = Config::from_lookup(lookup_from(&[
            ("source_dir", "/tmp/photos"),
            ("clientId", "svc-account"),
            ("clientSecret", ""),
        ]))
        .unwrap_err();
        assert!(matches!(err, SyncError::MissingVar("clientSecret")));
    }

    #[test]
    fn test_var_names_are_case_sensitive() {
        let err = Config::from_lookup(lookup_from(&[
            ("SOURCE_DIR", "/tmp/photos"),
            ("clientId", "svc-account"),
            ("clientSecret", "hunter2"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SyncError::MissingVar("source_dir")));
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let config = Config::from_lookup(lookup_from(&[
            ("source_dir", "/tmp/photos"),
            ("clientId", "svc-account"),
            ("clientSecret", "hunter2"),
            ("API_BASE_URL", "https://images.internal/"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://images.internal");
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = Config::from_lookup(lookup_from(&[
            ("source_dir", "/tmp/photos"),
            ("clientId", "svc-account"),
            ("clientSecret", "hunter2"),
        ]))
        .unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }
}
