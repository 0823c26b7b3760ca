use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

pub const API_URL_ENV: &str = "SITEAUDIT_API_URL";
pub const TOKEN_ENV: &str = "SITEAUDIT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
    pub request_timeout_secs: u64,
    pub account_timeout_secs: u64,
    /// Session cache location. Defaults to the platform data dir.
    pub store_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".into(),
            api_token: None,
            poll_interval_secs: 5,
            max_attempts: 60,
            request_timeout_secs: 30,
            account_timeout_secs: 10,
            store_path: None,
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            bail!("apiBaseUrl must not be empty");
        }
        if self.max_attempts == 0 {
            bail!("maxAttempts must be at least 1");
        }
        if self.request_timeout_secs == 0 || self.account_timeout_secs == 0 {
            bail!("request timeouts must be greater than zero");
        }
        Ok(())
    }

    pub fn resolved_store_path(&self) -> PathBuf {
        if let Some(path) = &self.store_path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join("siteaudit"))
            .unwrap_or_else(|| PathBuf::from(".siteaudit"))
            .join("session.sqlite3")
    }

    /// Applies `SITEAUDIT_API_URL` / `SITEAUDIT_TOKEN` style overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|value| !value.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(TOKEN_ENV).filter(|value| !value.trim().is_empty()) {
            self.api_token = Some(token);
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow!("no config directory on this platform"))?;
        Ok(dir.join("siteaudit").join("settings.json"))
    }

    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring invalid settings in {}: {err}", path.display());
                Settings::default()
            })
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings as stored on disk.
    pub fn settings(&self) -> Settings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Stored settings with environment overrides applied.
    pub fn effective(&self) -> Settings {
        let mut settings = self.settings();
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings
    }

    pub fn update_api_token(&self, token: Option<String>) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        guard.api_token = token.filter(|value| !value.trim().is_empty());
        self.persist(&guard)
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.settings();

        assert_eq!(settings.poll_interval(), Duration::from_secs(5));
        assert_eq!(settings.max_attempts, 60);
        assert_eq!(settings.account_timeout_secs, 10);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"apiBaseUrl": "https://audit.example.com", "maxAttempts": 3}"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().settings();
        assert_eq!(settings.api_base_url, "https://audit.example.com");
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.poll_interval_secs, 5);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(SettingsStore::new(path).unwrap().settings(), Settings::default());
    }

    #[test]
    fn token_update_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store.update_api_token(Some("tok_123".into())).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.settings().api_token.as_deref(), Some("tok_123"));
    }

    #[test]
    fn overrides_replace_url_and_token() {
        let mut settings = Settings::default();
        settings.apply_overrides(|key| match key {
            API_URL_ENV => Some("https://staging.example.com".into()),
            TOKEN_ENV => Some(String::new()),
            _ => None,
        });

        assert_eq!(settings.api_base_url, "https://staging.example.com");
        assert_eq!(settings.api_token, None);
    }

    #[test]
    fn zero_attempts_is_invalid() {
        let settings = Settings {
            max_attempts: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
        assert!(Settings::default().validate().is_ok());
    }
}
