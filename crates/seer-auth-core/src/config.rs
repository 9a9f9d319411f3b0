//! Configuration and per-user file locations.
//!
//! Settings are stored at `~/.config/seer-auth/config.json` and may be
//! overridden by `SEER_API_URL`, `SEER_ENVIRONMENT` and `SEER_EMAIL`.
//! `SEER_PASSWORD` is only ever read from the environment.
//!
//! Session cookies and the optional credentials file live in `~/.seerpy`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::auth::Environment;
use crate::error::AuthError;

/// Application name used for the config directory path
const APP_NAME: &str = "seer-auth";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Per-user directory holding session cookies and the credentials file
const SEER_DIR: &str = ".seerpy";

/// Two-line plaintext file: email, then password
const CREDENTIALS_FILE: &str = "credentials";

pub const ENV_API_URL: &str = "SEER_API_URL";
pub const ENV_ENVIRONMENT: &str = "SEER_ENVIRONMENT";
pub const ENV_EMAIL: &str = "SEER_EMAIL";
pub const ENV_PASSWORD: &str = "SEER_PASSWORD";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_url: Option<String>,
    pub environment: Option<Environment>,
    pub email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Overlay settings from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay settings from `lookup`; empty values are ignored
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(env) = lookup(ENV_ENVIRONMENT) {
            let parsed = env
                .parse::<Environment>()
                .map_err(|e| anyhow::anyhow!("{}: {}", ENV_ENVIRONMENT, e))?;
            self.environment = Some(parsed);
        }
        if let Some(email) = lookup(ENV_EMAIL) {
            self.email = Some(email);
        }
        Ok(self)
    }

    pub fn environment(&self) -> Environment {
        self.environment.unwrap_or_default()
    }

    /// Configured API base URL, or the default for the environment
    pub fn api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| self.environment().default_api_url().to_string())
    }

    pub fn password_from_env() -> Option<String> {
        std::env::var(ENV_PASSWORD).ok().filter(|p| !p.is_empty())
    }
}

/// Locations of per-user authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPaths {
    base_dir: PathBuf,
}

impl AuthPaths {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `~/.seerpy`
    pub fn from_home() -> std::result::Result<Self, AuthError> {
        let home = dirs::home_dir().ok_or(AuthError::NoHomeDirectory)?;
        Ok(Self::new(home.join(SEER_DIR)))
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.base_dir.join(CREDENTIALS_FILE)
    }

    pub fn session_dir(&self) -> PathBuf {
        self.base_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.environment(), Environment::Production);
        assert_eq!(config.api_url(), "https://api.seermedical.com/api");
    }

    #[test]
    fn test_development_default_url() {
        let config = Config {
            environment: Some(Environment::Development),
            ..Default::default()
        };
        assert_eq!(config.api_url(), Environment::Development.default_api_url());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = Config {
            api_url: Some("https://file.example.com/api".into()),
            environment: Some(Environment::Production),
            email: Some("file@example.com".into()),
        }
        .with_overrides(lookup(&[
            (ENV_API_URL, "http://localhost:3000/api"),
            (ENV_ENVIRONMENT, "dev"),
            (ENV_EMAIL, ""),
        ]))
        .unwrap();

        assert_eq!(config.api_url(), "http://localhost:3000/api");
        assert_eq!(config.environment(), Environment::Development);
        assert_eq!(config.email.as_deref(), Some("file@example.com"));
    }

    #[test]
    fn test_bad_environment_override() {
        let err = Config::default()
            .with_overrides(lookup(&[(ENV_ENVIRONMENT, "staging")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_ENVIRONMENT));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"environment":"development","email":"me@example.com"}"#)
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.environment(), Environment::Development);
        assert_eq!(config.email.as_deref(), Some("me@example.com"));
        assert_eq!(config.api_url, None);
    }

    #[test]
    fn test_unparsable_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_auth_paths() {
        let paths = AuthPaths::new("/home/u/.seerpy");
        assert_eq!(paths.credentials_file(), PathBuf::from("/home/u/.seerpy/credentials"));
        assert_eq!(paths.session_dir(), PathBuf::from("/home/u/.seerpy"));
    }
}
