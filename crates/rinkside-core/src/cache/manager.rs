use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Player, RegularSeason, Team, Tryout, TryoutRegistration};
use crate::services::seasons::RosterEntry;

use super::CacheCipher;

/// Consider cache stale after 1 hour.
/// Rosters change a few times a week at most during a season.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew (negative age)
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
    cipher: Option<CacheCipher>,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            cipher: None,
        })
    }

    /// Cache whose files are sealed with the given cipher
    pub fn encrypted(cache_dir: PathBuf, cipher: CacheCipher) -> Result<Self> {
        let mut manager = Self::new(cache_dir)?;
        manager.cipher = Some(cipher);
        Ok(manager)
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        let ext = if self.cipher.is_some() { "enc" } else { "json" };
        self.cache_dir.join(format!("{}.{}", name, ext))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;
        let contents = match self.cipher {
            Some(ref cipher) => cipher
                .decrypt(&raw)
                .with_context(|| format!("Failed to decrypt cache file: {}", name))?,
            None => raw,
        };

        let cached: CachedData<T> = serde_json::from_slice(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let mut contents = serde_json::to_vec_pretty(&cached)?;
        if let Some(ref cipher) = self.cipher {
            contents = cipher.encrypt(&contents)?;
        }
        std::fs::write(self.cache_path(name), contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        debug!(cache = name, "Saved cache");
        Ok(())
    }

    // ===== Teams =====

    pub fn load_teams(&self) -> Result<Option<CachedData<Vec<Team>>>> {
        self.load("teams")
    }

    pub fn save_teams(&self, teams: &[Team]) -> Result<()> {
        self.save("teams", &teams)
    }

    // ===== Players =====

    pub fn load_players(&self) -> Result<Option<CachedData<Vec<Player>>>> {
        self.load("players")
    }

    pub fn save_players(&self, players: &[Player]) -> Result<()> {
        self.save("players", &players)
    }

    // ===== Tryouts =====

    pub fn load_tryouts(&self, team_id: Uuid) -> Result<Option<CachedData<Vec<Tryout>>>> {
        self.load(&format!("tryouts_{}", team_id))
    }

    pub fn save_tryouts(&self, team_id: Uuid, tryouts: &[Tryout]) -> Result<()> {
        self.save(&format!("tryouts_{}", team_id), &tryouts)
    }

    pub fn load_registrations(
        &self,
        tryout_id: Uuid,
    ) -> Result<Option<CachedData<Vec<TryoutRegistration>>>> {
        self.load(&format!("registrations_{}", tryout_id))
    }

    pub fn save_registrations(&self, tryout_id: Uuid, registrations: &[TryoutRegistration]) -> Result<()> {
        self.save(&format!("registrations_{}", tryout_id), &registrations)
    }

    // ===== Seasons =====

    pub fn load_seasons(&self, team_id: Uuid) -> Result<Option<CachedData<Vec<RegularSeason>>>> {
        self.load(&format!("seasons_{}", team_id))
    }

    pub fn save_seasons(&self, team_id: Uuid, seasons: &[RegularSeason]) -> Result<()> {
        self.save(&format!("seasons_{}", team_id), &seasons)
    }

    pub fn load_roster(&self, season_id: Uuid) -> Result<Option<CachedData<Vec<RosterEntry>>>> {
        self.load(&format!("roster_{}", season_id))
    }

    pub fn save_roster(&self, season_id: Uuid, roster: &[RosterEntry]) -> Result<()> {
        self.save(&format!("roster_{}", season_id), &roster)
    }

    /// Drop cached files for a team that no longer exists
    pub fn forget_team(&self, team_id: Uuid) -> Result<()> {
        for name in [format!("tryouts_{}", team_id), format!("seasons_{}", team_id)] {
            let path = self.cache_path(&name);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove cache file: {}", name))?;
            }
        }
        Ok(())
    }

    // ===== Cache Age Information =====

    /// Helper to load cache and log errors without failing
    fn load_age<T>(&self, name: &str, loader: impl FnOnce() -> Result<Option<CachedData<T>>>) -> Option<String> {
        match loader() {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        CacheAges {
            teams: self.load_age("teams", || self.load_teams()),
            players: self.load_age("players", || self.load_players()),
        }
    }

    /// Helper to check staleness and log errors without failing
    fn is_cache_stale<T>(&self, name: &str, loader: impl FnOnce() -> Result<Option<CachedData<T>>>) -> bool {
        match loader() {
            Ok(Some(cached)) => cached.is_stale(),
            Ok(None) => true,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for staleness check");
                true
            }
        }
    }

    pub fn any_stale(&self) -> bool {
        self.is_cache_stale("teams", || self.load_teams())
            || self.is_cache_stale("players", || self.load_players())
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub teams: Option<String>,
    pub players: Option<String>,
}

impl CacheAges {
    pub fn last_updated(&self) -> String {
        self.teams
            .clone()
            .or_else(|| self.players.clone())
            .unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("rinkside-cache-{}", Uuid::new_v4()))
    }

    fn team(name: &str) -> Team {
        Team {
            id: Uuid::new_v4(),
            coach_id: Uuid::new_v4(),
            name: name.to_string(),
            age_group: Some("U14".to_string()),
            level: None,
            season_year: None,
            description: None,
            logo_url: None,
            created_at: None,
        }
    }

    #[test]
    fn test_age_display() {
        let mut cached = CachedData::new(1);
        assert_eq!(cached.age_display(), "just now");
        cached.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");
        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");
        cached.cached_at = Utc::now() - Duration::hours(72);
        assert_eq!(cached.age_display(), "3d ago");
        cached.cached_at = Utc::now() + Duration::minutes(10);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale());
    }

    #[test]
    fn test_save_and_load_teams() {
        let dir = temp_dir();
        let cache = CacheManager::new(dir.clone()).unwrap();
        assert!(cache.load_teams().unwrap().is_none());
        assert!(cache.any_stale());

        cache.save_teams(&[team("Wolves")]).unwrap();
        let loaded = cache.load_teams().unwrap().unwrap();
        assert_eq!(loaded.data[0].name, "Wolves");
        assert_eq!(cache.get_cache_ages().last_updated(), "just now");
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_encrypted_cache_is_not_plaintext() {
        let dir = temp_dir();
        let key = CacheCipher::generate_key();
        let cache = CacheManager::encrypted(dir.clone(), CacheCipher::from_key(&key).unwrap()).unwrap();
        cache.save_teams(&[team("Icehawks")]).unwrap();

        let raw = std::fs::read(dir.join("teams.enc")).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("Icehawks"));
        assert_eq!(cache.load_teams().unwrap().unwrap().data[0].name, "Icehawks");

        let wrong = CacheManager::encrypted(dir.clone(), CacheCipher::from_key(&[9u8; 32]).unwrap()).unwrap();
        assert!(wrong.load_teams().is_err());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_forget_team() {
        let dir = temp_dir();
        let cache = CacheManager::new(dir.clone()).unwrap();
        let team_id = Uuid::new_v4();
        cache.save_tryouts(team_id, &[]).unwrap();
        assert!(cache.load_tryouts(team_id).unwrap().is_some());
        cache.forget_team(team_id).unwrap();
        assert!(cache.load_tryouts(team_id).unwrap().is_none());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_cache_ages_last_updated_empty() {
        assert_eq!(CacheAges::default().last_updated(), "never");
    }
}
