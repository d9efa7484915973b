use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Buffer time before expiry to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Check if the session will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        let refresh_at = self.expires_at - Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES);
        Utc::now() > refresh_at
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }
}

pub struct Session {
    dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, data: None }
    }

    /// Load session from disk.
    /// Expired sessions are still loaded when they carry a refresh token;
    /// returns whether the access token is currently usable.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            let data: SessionData = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;

            let usable = !data.is_expired();
            if usable || !data.refresh_token.is_empty() {
                self.data = Some(data);
            }
            return Ok(usable);
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if session exists
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.access_token.as_str())
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.data.as_ref().map(|d| d.user_id)
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(expires_in_minutes: i64) -> SessionData {
        SessionData {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            user_id: Uuid::new_v4(),
            email: "coach@rinkside.app".to_string(),
            expires_at: Utc::now() + Duration::minutes(expires_in_minutes),
        }
    }

    #[test]
    fn test_expiry_and_refresh_window() {
        let fresh = data(60);
        assert!(!fresh.is_expired());
        assert!(!fresh.needs_refresh());

        let soon = data(3);
        assert!(!soon.is_expired());
        assert!(soon.needs_refresh());

        let expired = data(-1);
        assert!(expired.is_expired());
        assert_eq!(expired.minutes_until_expiry(), 0);
    }

    #[test]
    fn test_save_load_clear() {
        let dir = std::env::temp_dir().join(format!("rinkside-session-{}", Uuid::new_v4()));
        let mut session = Session::new(dir.clone());
        session.update(data(60));
        session.save().unwrap();

        let mut loaded = Session::new(dir.clone());
        assert!(loaded.load().unwrap());
        assert_eq!(loaded.token(), Some("token"));
        assert!(loaded.is_valid());

        loaded.clear().unwrap();
        let mut empty = Session::new(dir.clone());
        assert!(!empty.load().unwrap());
        assert!(empty.data.is_none());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_expired_session_kept_for_refresh() {
        let dir = std::env::temp_dir().join(format!("rinkside-session-{}", Uuid::new_v4()));
        let mut session = Session::new(dir.clone());
        session.update(data(-10));
        session.save().unwrap();

        let mut loaded = Session::new(dir.clone());
        assert!(!loaded.load().unwrap());
        assert!(loaded.data.is_some());
        assert!(!loaded.is_valid());
        let _ = std::fs::remove_dir_all(dir);
    }
}
