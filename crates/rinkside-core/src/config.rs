//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend endpoint, the public API key, the last used
//! email and the team the coach was working with.
//!
//! Configuration is stored at `~/.config/rinkside/config.json`; the
//! `RINKSIDE_BACKEND_URL` and `RINKSIDE_ANON_KEY` environment variables
//! take precedence over the file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "rinkside";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_BACKEND_URL: &str = "RINKSIDE_BACKEND_URL";
pub const ENV_ANON_KEY: &str = "RINKSIDE_ANON_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub backend_url: Option<String>,
    /// Public (anon) API key sent with every request
    pub anon_key: Option<String>,
    pub last_email: Option<String>,
    pub active_team_id: Option<Uuid>,
    #[serde(default)]
    pub offline_mode: bool,
    #[serde(default)]
    pub encrypt_cache: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Environment values win over the file; blank values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_blank(ENV_BACKEND_URL) {
            self.backend_url = Some(url);
        }
        if let Some(key) = non_blank(ENV_ANON_KEY) {
            self.anon_key = Some(key);
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Backend URL and key, or an error naming what is missing
    pub fn backend(&self) -> Result<(String, String)> {
        let url = self.backend_url.clone().ok_or_else(|| {
            anyhow::anyhow!("Backend URL not configured (set {})", ENV_BACKEND_URL)
        })?;
        let key = self.anon_key.clone().ok_or_else(|| {
            anyhow::anyhow!("API key not configured (set {})", ENV_ANON_KEY)
        })?;
        Ok((url, key))
    }

    /// Root cache directory, shared by every account on this machine
    pub fn base_cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Per-account cache directory
    pub fn cache_dir(&self, user_id: Option<Uuid>) -> Result<PathBuf> {
        let mut path = Self::base_cache_dir()?;
        if let Some(user_id) = user_id {
            path = path.join(user_id.to_string());
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides() {
        let mut config = Config {
            backend_url: Some("https://old.example.co".to_string()),
            anon_key: Some("old-key".to_string()),
            ..Default::default()
        };
        config.apply_env_overrides(|key| match key {
            ENV_BACKEND_URL => Some("https://new.example.co".to_string()),
            ENV_ANON_KEY => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.backend_url.as_deref(), Some("https://new.example.co"));
        assert_eq!(config.anon_key.as_deref(), Some("old-key"));
    }

    #[test]
    fn test_backend_requires_both_values() {
        let config = Config {
            backend_url: Some("https://x.example.co".to_string()),
            ..Default::default()
        };
        let err = config.backend().unwrap_err();
        assert!(err.to_string().contains(ENV_ANON_KEY));
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let config: Config = serde_json::from_str(r#"{"last_email":"coach@rinkside.app"}"#).unwrap();
        assert!(!config.offline_mode);
        assert!(!config.encrypt_cache);
        assert_eq!(config.last_email.as_deref(), Some("coach@rinkside.app"));
    }
}
