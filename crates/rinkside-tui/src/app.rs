//! Application state management for rinkside.
//!
//! This module contains the core `App` struct: UI state, cached data, the
//! session, and coordination with the background refresh task.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Datelike, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use rinkside_core::api::ApiClient;
use rinkside_core::auth::{CredentialStore, Session};
use rinkside_core::cache::{CacheAges, CacheCipher, CacheManager};
use rinkside_core::config::Config;
use rinkside_core::models::{
    Coach, Player, PlayerSortColumn, RegularSeason, Team, Tryout, TryoutRegistration,
};
use rinkside_core::services::seasons::{self, RosterEntry};
use rinkside_core::services::tryouts::{self, SeasonDraft, Selection};
use rinkside_core::services::{coach, players, teams};
use rinkside_core::store::Store;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

const ENV_EMAIL: &str = "RINKSIDE_EMAIL";
const ENV_PASSWORD: &str = "RINKSIDE_PASSWORD";

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Teams,
    Tryouts,
    Roster,
    Players,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Teams, Tab::Tryouts, Tab::Roster, Tab::Players];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Teams => "Teams",
            Tab::Tryouts => "Tryouts",
            Tab::Roster => "Roster",
            Tab::Players => "Players",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Teams => Tab::Tryouts,
            Tab::Tryouts => Tab::Roster,
            Tab::Roster => Tab::Players,
            Tab::Players => Tab::Teams,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Teams => Tab::Players,
            Tab::Tryouts => Tab::Teams,
            Tab::Roster => Tab::Tryouts,
            Tab::Players => Tab::Roster,
        }
    }
}

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    ConfirmingCompleteTryout,
    ConfirmingDeleteTeam,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from the background refresh task to the main loop.
#[derive(Debug)]
pub(crate) enum RefreshResult {
    Coach(Coach),
    Teams(Vec<Team>),
    Players(Vec<Player>),
    /// Tryouts of a team (team_id, tryouts)
    Tryouts(Uuid, Vec<Tryout>),
    /// Registrations of a tryout (tryout_id, registrations)
    Registrations(Uuid, Vec<TryoutRegistration>),
    /// Seasons of a team (team_id, seasons)
    Seasons(Uuid, Vec<RegularSeason>),
    /// Roster of a season (season_id, roster)
    Roster(Uuid, Vec<RosterEntry>),
    RefreshComplete,
    Error(String),
}

/// Helper to send refresh results, logging any channel errors
async fn send_result(tx: &mpsc::Sender<RefreshResult>, result: RefreshResult) {
    if let Err(e) = tx.send(result).await {
        error!(error = %e, "Failed to send refresh result - channel closed");
    }
}

/// Fetch everything the tabs show for one coach and stream it back.
///
/// Per-team loads run concurrently; a failure in one area is reported as
/// `RefreshResult::Error` and the rest still loads.
pub(crate) async fn fetch_all<S: Store>(
    store: &S,
    user_id: Uuid,
    email: &str,
    tx: &mpsc::Sender<RefreshResult>,
) {
    info!("Background refresh task started");

    let profile = coach::profile_from_email(user_id, email);
    let coach = match coach::ensure_coach_profile(store, profile).await {
        Ok((coach, _)) => coach,
        Err(e) => {
            send_result(tx, RefreshResult::Error(format!("Coach profile: {}", e))).await;
            send_result(tx, RefreshResult::RefreshComplete).await;
            return;
        }
    };
    let coach_id = coach.id;
    send_result(tx, RefreshResult::Coach(coach)).await;

    let (teams_res, players_res) = tokio::join!(
        teams::teams_for_coach(store, coach_id),
        players::players_for_coach(store, coach_id),
    );

    match players_res {
        Ok(list) => send_result(tx, RefreshResult::Players(list)).await,
        Err(e) => send_result(tx, RefreshResult::Error(format!("Players: {}", e))).await,
    }

    match teams_res {
        Ok(list) => {
            let team_ids: Vec<Uuid> = list.iter().map(|t| t.id).collect();
            send_result(tx, RefreshResult::Teams(list)).await;
            let loads: Vec<_> = team_ids
                .into_iter()
                .map(|team_id| fetch_team(store, team_id, tx))
                .collect();
            futures::future::join_all(loads).await;
        }
        Err(e) => send_result(tx, RefreshResult::Error(format!("Teams: {}", e))).await,
    }

    send_result(tx, RefreshResult::RefreshComplete).await;
    info!("Background refresh task completed");
}

/// Tryouts with their registrations, and seasons with the newest roster
async fn fetch_team<S: Store>(store: &S, team_id: Uuid, tx: &mpsc::Sender<RefreshResult>) {
    match tryouts::tryouts_for_team(store, team_id).await {
        Ok(list) => {
            let tryout_ids: Vec<Uuid> = list.iter().map(|t| t.id).collect();
            send_result(tx, RefreshResult::Tryouts(team_id, list)).await;
            for tryout_id in tryout_ids {
                match tryouts::registrations(store, tryout_id).await {
                    Ok(regs) => send_result(tx, RefreshResult::Registrations(tryout_id, regs)).await,
                    Err(e) => {
                        send_result(tx, RefreshResult::Error(format!("Registrations: {}", e))).await
                    }
                }
            }
        }
        Err(e) => send_result(tx, RefreshResult::Error(format!("Tryouts: {}", e))).await,
    }

    match seasons::seasons_for_team(store, team_id).await {
        Ok(list) => {
            let newest = list.first().map(|s| s.id);
            send_result(tx, RefreshResult::Seasons(team_id, list)).await;
            if let Some(season_id) = newest {
                match seasons::season_roster(store, season_id, None).await {
                    Ok(roster) => send_result(tx, RefreshResult::Roster(season_id, roster)).await,
                    Err(e) => send_result(tx, RefreshResult::Error(format!("Roster: {}", e))).await,
                }
            }
        }
        Err(e) => send_result(tx, RefreshResult::Error(format!("Seasons: {}", e))).await,
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    /// Where settings are written; `None` means the standard location
    pub config_path: Option<PathBuf>,
    pub session: Session,
    pub api: ApiClient,
    pub cache: CacheManager,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,
    pub search_query: String,
    pub player_sort_column: PlayerSortColumn,
    pub player_sort_ascending: bool,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Selection indices
    pub team_selection: usize,
    pub tryout_selection: usize,
    pub registration_selection: usize,
    pub roster_selection: usize,
    pub player_selection: usize,

    // Cached data
    pub coach: Option<Coach>,
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
    /// Tryouts keyed by team id
    pub tryouts: HashMap<Uuid, Vec<Tryout>>,
    /// Registrations keyed by tryout id
    pub registrations: HashMap<Uuid, Vec<TryoutRegistration>>,
    /// Seasons keyed by team id, newest first
    pub seasons: HashMap<Uuid, Vec<RegularSeason>>,
    /// Rosters keyed by season id
    pub rosters: HashMap<Uuid, Vec<RosterEntry>>,

    // Background task channel
    refresh_rx: mpsc::Receiver<RefreshResult>,
    refresh_tx: mpsc::Sender<RefreshResult>,
    pub refreshing: bool,

    pub status_message: Option<String>,
    pub cache_ages: CacheAges,

    /// When true, only cached data is shown and edits are disabled
    pub offline_mode: bool,
}

impl App {
    /// Create a new application instance from the saved config and session
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        let (backend_url, anon_key) = config.backend()?;

        let base_dir = Config::base_cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        let mut session = Session::new(base_dir);
        let load_result = session.load();
        debug!(?load_result, has_data = session.data.is_some(), "Session loaded");

        let mut api = ApiClient::new(&backend_url, &anon_key)?;
        if let Some(ref data) = session.data {
            if !data.is_expired() {
                api.set_token(data.access_token.clone());
            }
        }

        let cache = open_cache(&config, session.user_id())?;
        Ok(Self::from_parts(config, session, api, cache))
    }

    /// Assemble an app from already-built services
    pub fn from_parts(config: Config, session: Session, api: ApiClient, cache: CacheManager) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = std::env::var(ENV_EMAIL)
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();
        let login_password = std::env::var(ENV_PASSWORD).unwrap_or_default();
        let offline_mode = config.offline_mode;

        Self {
            config,
            config_path: None,
            session,
            api,
            cache,

            state: AppState::Normal,
            current_tab: Tab::Teams,
            focus: Focus::List,
            search_query: String::new(),
            player_sort_column: PlayerSortColumn::Name,
            player_sort_ascending: true,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,

            team_selection: 0,
            tryout_selection: 0,
            registration_selection: 0,
            roster_selection: 0,
            player_selection: 0,

            coach: None,
            teams: Vec::new(),
            players: Vec::new(),
            tryouts: HashMap::new(),
            registrations: HashMap::new(),
            seasons: HashMap::new(),
            rosters: HashMap::new(),

            refresh_rx: rx,
            refresh_tx: tx,
            refreshing: false,

            status_message: None,
            cache_ages: CacheAges::default(),
            offline_mode,
        }
    }

    fn save_config(&self) -> Result<()> {
        match &self.config_path {
            Some(path) => self.config.save_to(path),
            None => self.config.save(),
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Whether a usable session exists, refreshing it first when it is close
    /// to expiry.
    pub async fn is_authenticated(&mut self) -> bool {
        let Some(data) = self.session.data.clone() else {
            return false;
        };
        if !data.needs_refresh() {
            return true;
        }
        if self.offline_mode {
            return !data.is_expired();
        }
        match self.api.refresh_session(&data).await {
            Ok(fresh) => {
                self.api.set_token(fresh.access_token.clone());
                self.session.update(fresh);
                if let Err(e) = self.session.save() {
                    warn!(error = %e, "Failed to save refreshed session");
                }
                info!("Session refreshed");
                true
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed");
                false
            }
        }
    }

    /// Fill the password from the keychain when the email has one stored
    fn fill_stored_password(&mut self) {
        if self.login_password.is_empty() && CredentialStore::has_credentials(&self.login_email) {
            if let Ok(password) = CredentialStore::get_password(&self.login_email) {
                self.login_password = password;
            }
        }
    }

    /// Interactive login for the command-line tools
    pub async fn login_interactive(&mut self) -> Result<()> {
        if self.is_authenticated().await {
            return Ok(());
        }
        eprintln!("\n=== Rinkside Login ===\n");

        let email = match self.login_email.trim() {
            "" => prompt_email(None)?,
            known => prompt_email(Some(known))?,
        };
        let password = if !self.login_password.is_empty() {
            self.login_password.clone()
        } else if CredentialStore::has_credentials(&email) {
            eprint!("Use stored password? [Y/n]: ");
            io::stderr().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if input.trim().eq_ignore_ascii_case("n") {
                rpassword::prompt_password("Password: ")?
            } else {
                CredentialStore::get_password(&email)?
            }
        } else {
            rpassword::prompt_password("Password: ")?
        };

        eprintln!("\nAuthenticating...");
        self.login_email = email;
        self.login_password = password;
        self.attempt_login().await?;
        eprintln!("Login successful!\n");
        Ok(())
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let email = self.login_email.trim().to_lowercase();
        let password = self.login_password.clone();

        if email.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return Err(anyhow::anyhow!("Email and password required"));
        }
        self.login_error = None;

        match self.api.sign_in(&email, &password).await {
            Ok(session_data) => {
                if let Err(e) = CredentialStore::store(&email, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }

                let user_id = session_data.user_id;
                self.config.last_email = Some(email);
                if let Err(e) = self.save_config() {
                    warn!(error = %e, "Failed to save config");
                }

                self.api.set_token(session_data.access_token.clone());
                self.session.update(session_data);
                if let Err(e) = self.session.save() {
                    warn!(error = %e, "Failed to save session");
                }

                match open_cache(&self.config, Some(user_id)) {
                    Ok(cache) => self.cache = cache,
                    Err(e) => warn!(error = %e, "Failed to open account cache"),
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!("Login successful");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(login_error_message(&e));
                Err(e)
            }
        }
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.fill_stored_password();
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Load everything available from the cache
    pub fn load_from_cache(&mut self) {
        if let Ok(Some(cached)) = self.cache.load_teams() {
            self.teams = cached.data;
        }
        if let Ok(Some(cached)) = self.cache.load_players() {
            self.players = cached.data;
        }

        for team in &self.teams {
            if let Ok(Some(cached)) = self.cache.load_tryouts(team.id) {
                for tryout in &cached.data {
                    if let Ok(Some(regs)) = self.cache.load_registrations(tryout.id) {
                        self.registrations.insert(tryout.id, regs.data);
                    }
                }
                self.tryouts.insert(team.id, cached.data);
            }
            if let Ok(Some(cached)) = self.cache.load_seasons(team.id) {
                if let Some(season) = cached.data.first() {
                    if let Ok(Some(roster)) = self.cache.load_roster(season.id) {
                        self.rosters.insert(season.id, roster.data);
                    }
                }
                self.seasons.insert(team.id, cached.data);
            }
        }

        if let Some(active) = self.config.active_team_id {
            if let Some(index) = self.teams.iter().position(|t| t.id == active) {
                self.team_selection = index;
            }
        }
        self.cache_ages = self.cache.get_cache_ages();
    }

    pub fn is_cache_stale(&self) -> bool {
        self.cache.any_stale()
    }

    // =========================================================================
    // Background Data Refresh
    // =========================================================================

    /// Spawn a background task to refresh all data
    pub fn refresh_all_background(&mut self) {
        if self.offline_mode {
            self.status_message = Some("Offline - showing cached data".to_string());
            return;
        }
        if self.refreshing {
            return;
        }
        let Some(data) = self.session.data.as_ref() else {
            warn!("No session available for refresh");
            return;
        };
        let user_id = data.user_id;
        let email = data.email.clone();
        let store = self.api.with_token(data.access_token.clone());
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            fetch_all(&store, user_id, &email, &tx).await;
        });

        self.refreshing = true;
        self.status_message = Some("Refreshing data...".to_string());
    }

    /// Drain finished background results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.refresh_rx.try_recv() {
            self.process_refresh_result(result);
        }
    }

    pub(crate) fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Coach(coach) => {
                self.coach = Some(coach);
            }
            RefreshResult::Teams(data) => {
                if let Err(e) = self.cache.save_teams(&data) {
                    warn!(error = %e, "Failed to cache teams");
                }
                self.teams = data;
                if let Some(active) = self.config.active_team_id {
                    if let Some(index) = self.teams.iter().position(|t| t.id == active) {
                        self.team_selection = index;
                    }
                }
                self.clamp_selections();
                self.cache_ages = self.cache.get_cache_ages();
            }
            RefreshResult::Players(data) => {
                if let Err(e) = self.cache.save_players(&data) {
                    warn!(error = %e, "Failed to cache players");
                }
                self.players = data;
                self.clamp_selections();
                self.cache_ages = self.cache.get_cache_ages();
            }
            RefreshResult::Tryouts(team_id, data) => {
                if let Err(e) = self.cache.save_tryouts(team_id, &data) {
                    warn!(error = %e, "Failed to cache tryouts");
                }
                self.tryouts.insert(team_id, data);
                self.clamp_selections();
            }
            RefreshResult::Registrations(tryout_id, data) => {
                if let Err(e) = self.cache.save_registrations(tryout_id, &data) {
                    warn!(error = %e, "Failed to cache registrations");
                }
                self.registrations.insert(tryout_id, data);
            }
            RefreshResult::Seasons(team_id, data) => {
                if let Err(e) = self.cache.save_seasons(team_id, &data) {
                    warn!(error = %e, "Failed to cache seasons");
                }
                self.seasons.insert(team_id, data);
            }
            RefreshResult::Roster(season_id, data) => {
                if let Err(e) = self.cache.save_roster(season_id, &data) {
                    warn!(error = %e, "Failed to cache roster");
                }
                self.rosters.insert(season_id, data);
                self.clamp_selections();
            }
            RefreshResult::RefreshComplete => {
                self.refreshing = false;
                if !self
                    .status_message
                    .as_deref()
                    .is_some_and(|m| m.starts_with("Error"))
                {
                    self.status_message = None;
                }
            }
            RefreshResult::Error(msg) => {
                error!(error = %msg, "Refresh error");
                self.status_message = Some(format!("Error: {}", msg));
            }
        }
    }

    /// Toggle offline mode and persist the choice
    pub fn toggle_offline(&mut self) {
        self.offline_mode = !self.offline_mode;
        self.config.offline_mode = self.offline_mode;
        if let Err(e) = self.save_config() {
            warn!(error = %e, "Failed to save config");
        }
        if self.offline_mode {
            info!("Entering offline mode");
            self.status_message = Some("Offline mode - edits disabled".to_string());
        } else {
            info!("Leaving offline mode");
            self.status_message = None;
            self.refresh_all_background();
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selected_team(&self) -> Option<&Team> {
        self.teams.get(self.team_selection)
    }

    /// Tryouts of the selected team
    pub fn team_tryouts(&self) -> &[Tryout] {
        self.selected_team()
            .and_then(|t| self.tryouts.get(&t.id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn selected_tryout(&self) -> Option<&Tryout> {
        self.team_tryouts().get(self.tryout_selection)
    }

    /// Registrations of the selected tryout
    pub fn tryout_registrations(&self) -> &[TryoutRegistration] {
        self.selected_tryout()
            .and_then(|t| self.registrations.get(&t.id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Newest season of the selected team
    pub fn current_season(&self) -> Option<&RegularSeason> {
        self.selected_team()
            .and_then(|t| self.seasons.get(&t.id))
            .and_then(|s| s.first())
    }

    pub fn current_roster(&self) -> &[RosterEntry] {
        self.current_season()
            .and_then(|s| self.rosters.get(&s.id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn player_name(&self, player_id: Uuid) -> String {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .map(|p| p.full_name())
            .unwrap_or_else(|| "Unknown player".to_string())
    }

    /// Players matching the search, in the chosen sort order
    pub fn get_sorted_players(&self) -> Vec<&Player> {
        let mut list = players::search(&self.players, &self.search_query);
        let (column, ascending) = (self.player_sort_column, self.player_sort_ascending);
        list.sort_by(|a, b| players::compare_players(a, b, column, ascending));
        list
    }

    /// Same column flips direction; a new column sorts ascending
    pub fn toggle_player_sort(&mut self, column: PlayerSortColumn) {
        if self.player_sort_column == column {
            self.player_sort_ascending = !self.player_sort_ascending;
        } else {
            self.player_sort_column = column;
            self.player_sort_ascending = true;
        }
        self.player_selection = 0;
    }

    /// Make a team the active one (persisted across runs)
    pub fn select_team(&mut self, index: usize) {
        if index >= self.teams.len() {
            return;
        }
        self.team_selection = index;
        self.tryout_selection = 0;
        self.registration_selection = 0;
        self.roster_selection = 0;
        let team_id = self.teams[index].id;
        if self.config.active_team_id != Some(team_id) {
            self.config.active_team_id = Some(team_id);
            if let Err(e) = self.save_config() {
                warn!(error = %e, "Failed to save active team");
            }
        }
    }

    /// Keep every selection inside its list after data changes
    pub fn clamp_selections(&mut self) {
        fn clamp(sel: &mut usize, len: usize) {
            *sel = (*sel).min(len.saturating_sub(1));
        }
        // Team first: the tryout and roster lists depend on the selected team
        let teams = self.teams.len();
        clamp(&mut self.team_selection, teams);

        let tryouts = self.team_tryouts().len();
        clamp(&mut self.tryout_selection, tryouts);
        let registrations = self.tryout_registrations().len();
        let roster = self.current_roster().len();
        let players = self.get_sorted_players().len();

        clamp(&mut self.registration_selection, registrations);
        clamp(&mut self.roster_selection, roster);
        clamp(&mut self.player_selection, players);
    }

    // =========================================================================
    // Actions
    // =========================================================================

    fn ensure_online(&mut self) -> bool {
        if self.offline_mode {
            self.status_message = Some("Offline - edits disabled".to_string());
            return false;
        }
        true
    }

    /// Ask for confirmation before completing the selected tryout
    pub fn request_complete_tryout(&mut self) {
        match self.selected_tryout() {
            Some(t) if t.status.is_closed() => {
                self.status_message = Some(format!("Tryout is already {}", t.status));
            }
            Some(_) => self.state = AppState::ConfirmingCompleteTryout,
            None => self.status_message = Some("No tryout selected".to_string()),
        }
    }

    /// Name used for the season created by completing a tryout
    pub fn completion_season_name(&self) -> String {
        let team = self.selected_team().map(|t| t.name.as_str()).unwrap_or("Team");
        tryouts::default_season_name(team, Utc::now().year())
    }

    /// Complete the selected tryout into a new season of every active registrant
    pub async fn complete_selected_tryout(&mut self) {
        self.state = AppState::Normal;
        if !self.ensure_online() {
            return;
        }
        let Some(tryout) = self.selected_tryout().cloned() else {
            return;
        };
        let draft = SeasonDraft {
            name: self.completion_season_name(),
            start_date: Utc::now().date_naive(),
            end_date: None,
        };

        match tryouts::complete_tryout(&self.api, tryout.id, draft, Selection::AllActive).await {
            Ok(outcome) => {
                info!(
                    tryout_id = %tryout.id,
                    season_id = %outcome.season.id,
                    migrated = outcome.migrated,
                    "Tryout completed"
                );
                self.status_message = Some(format!(
                    "Created {} with {} players ({} cancelled skipped)",
                    outcome.season.name, outcome.migrated, outcome.skipped_cancelled
                ));
                self.current_tab = Tab::Roster;
                self.refresh_all_background();
            }
            Err(e) => {
                error!(error = %e, "Failed to complete tryout");
                self.status_message = Some(format!("Error: {}", e));
            }
        }
    }

    pub fn request_delete_team(&mut self) {
        if self.selected_team().is_some() {
            self.state = AppState::ConfirmingDeleteTeam;
        }
    }

    /// Delete the selected team with everything that hangs off it
    pub async fn delete_selected_team(&mut self) {
        self.state = AppState::Normal;
        if !self.ensure_online() {
            return;
        }
        let Some(team) = self.selected_team().cloned() else {
            return;
        };

        match teams::delete_team(&self.api, team.id).await {
            Ok(report) => {
                if let Err(e) = self.cache.forget_team(team.id) {
                    warn!(error = %e, "Failed to clear cached team data");
                }
                self.forget_team_locally(team.id);
                if let Err(e) = self.cache.save_teams(&self.teams) {
                    warn!(error = %e, "Failed to cache teams");
                }
                self.status_message = Some(deleted_team_message(&team.name, &report));
            }
            Err(e) => {
                error!(error = %e, "Failed to delete team");
                self.status_message = Some(format!("Error: {}", e));
            }
        }
    }

    /// Drop a team and its dependent data from memory
    pub fn forget_team_locally(&mut self, team_id: Uuid) {
        self.teams.retain(|t| t.id != team_id);
        if let Some(removed) = self.tryouts.remove(&team_id) {
            for tryout in removed {
                self.registrations.remove(&tryout.id);
            }
        }
        if let Some(removed) = self.seasons.remove(&team_id) {
            for season in removed {
                self.rosters.remove(&season.id);
            }
        }
        if self.config.active_team_id == Some(team_id) {
            self.config.active_team_id = None;
        }
        self.clamp_selections();
    }

    /// Advance the selected registration to its next status
    pub async fn cycle_registration_status(&mut self) {
        if !self.ensure_online() {
            return;
        }
        let Some(tryout_id) = self.selected_tryout().map(|t| t.id) else {
            return;
        };
        let Some(reg) = self.tryout_registrations().get(self.registration_selection).cloned() else {
            return;
        };
        let next = reg.status.next();

        match tryouts::set_registration_status(&self.api, reg.id, next).await {
            Ok(updated) => {
                if let Some(list) = self.registrations.get_mut(&tryout_id) {
                    if let Some(slot) = list.iter_mut().find(|r| r.id == updated.id) {
                        *slot = updated;
                    }
                    if let Err(e) = self.cache.save_registrations(tryout_id, list) {
                        warn!(error = %e, "Failed to cache registrations");
                    }
                }
                self.status_message = Some(format!(
                    "{} is now {}",
                    self.player_name(reg.player_id),
                    next
                ));
            }
            Err(e) => self.status_message = Some(format!("Error: {}", e)),
        }
    }

    /// Advance the selected roster player to the next season status
    pub async fn cycle_roster_status(&mut self) {
        if !self.ensure_online() {
            return;
        }
        let Some(season_id) = self.current_season().map(|s| s.id) else {
            return;
        };
        let Some(entry) = self.current_roster().get(self.roster_selection).cloned() else {
            return;
        };
        let next = entry.status().next();

        match seasons::set_player_status(&self.api, season_id, entry.player.id, next).await {
            Ok(membership) => {
                if let Some(roster) = self.rosters.get_mut(&season_id) {
                    if let Some(slot) = roster.iter_mut().find(|e| e.player.id == entry.player.id) {
                        slot.membership = membership;
                    }
                    if let Err(e) = self.cache.save_roster(season_id, roster) {
                        warn!(error = %e, "Failed to cache roster");
                    }
                }
                self.status_message = Some(format!("{} is now {}", entry.player.full_name(), next));
            }
            Err(e) => self.status_message = Some(format!("Error: {}", e)),
        }
    }
}

/// Open the per-account cache, encrypted when configured
fn open_cache(config: &Config, user_id: Option<Uuid>) -> Result<CacheManager> {
    let dir = config
        .cache_dir(user_id)
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    if config.encrypt_cache {
        match CacheCipher::from_keychain() {
            Ok(cipher) => return CacheManager::encrypted(dir, cipher),
            Err(e) => warn!(error = %e, "Cache key unavailable, caching unencrypted"),
        }
    }
    CacheManager::new(dir)
}

/// Ask for an email on stderr, offering `default` when known
fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => eprint!("Email [{}]: ", d),
        None => eprint!("Email: "),
    }
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    Ok(match (input.is_empty(), default) {
        (true, Some(d)) => d.to_string(),
        _ => input.to_lowercase(),
    })
}

fn deleted_team_message(name: &str, report: &teams::CascadeReport) -> String {
    format!("Deleted {} ({} related rows)", name, report.total())
}

/// User-facing text for a failed sign-in
fn login_error_message(e: &anyhow::Error) -> String {
    let text = e.to_string().to_lowercase();
    if text.contains("unauthorized") || text.contains("invalid login") || text.contains("access denied") {
        "Invalid email or password".to_string()
    } else if text.contains("network") || text.contains("connect") {
        "Unable to connect to server. Check your internet connection.".to_string()
    } else if text.contains("timeout") || text.contains("timed out") {
        "Connection timed out. Please try again.".to_string()
    } else {
        format!("Login failed: {}", e)
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rinkside_core::models::{
        NewPlayer, NewRegularSeason, NewRegularSeasonPlayer, NewTeam, NewTryout,
        NewTryoutRegistration, RegistrationStatus, RegularSeasonPlayer, SeasonPlayerStatus,
        SeasonStatus, TryoutStatus,
    };
    use rinkside_core::store::{insert_one, MemoryStore};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rinkside-app-{}-{}", name, Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub(crate) fn empty_app(name: &str) -> App {
        let dir = temp_dir(name);
        let api = ApiClient::new("http://localhost:54321", "anon").unwrap();
        let cache = CacheManager::new(dir.join("cache")).unwrap();
        let mut app = App::from_parts(Config::default(), Session::new(dir.clone()), api, cache);
        app.config_path = Some(dir.join("config.json"));
        app.login_password.clear();
        app
    }

    pub(crate) fn team(name: &str) -> Team {
        Team {
            id: Uuid::new_v4(),
            coach_id: Uuid::new_v4(),
            name: name.to_string(),
            age_group: Some("U12".to_string()),
            level: None,
            season_year: None,
            description: None,
            logo_url: None,
            created_at: None,
        }
    }

    fn tryout(team_id: Uuid, status: TryoutStatus) -> Tryout {
        Tryout {
            id: Uuid::new_v4(),
            team_id,
            name: "Spring Evaluations".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 4, 5).unwrap(),
            end_date: None,
            location: None,
            max_players: None,
            status,
            description: None,
            created_at: None,
        }
    }

    async fn drain(rx: &mut mpsc::Receiver<RefreshResult>) -> Vec<RefreshResult> {
        let mut out = Vec::new();
        while let Some(result) = rx.recv().await {
            let done = matches!(result, RefreshResult::RefreshComplete);
            out.push(result);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_tab_next_prev_cycle() {
        for tab in Tab::ALL {
            assert_eq!(tab.next().prev(), tab);
        }
        assert_eq!(Tab::Players.next(), Tab::Teams);
        assert_eq!(Tab::Teams.prev(), Tab::Players);
    }

    #[test]
    fn test_input_char_limits() {
        assert!(can_add_email_char(0, 'a'));
        assert!(!can_add_email_char(0, ' '));
        assert!(!can_add_email_char(MAX_EMAIL_LENGTH, 'a'));
        assert!(can_add_password_char(0, ' '));
        assert!(!can_add_password_char(0, '\u{7}'));
        assert!(!can_add_password_char(MAX_PASSWORD_LENGTH, 'a'));
    }

    #[test]
    fn test_process_results_and_selection() {
        let mut app = empty_app("process");
        let wolves = team("Wolves");
        let bears = team("Bears");
        let t1 = tryout(bears.id, TryoutStatus::Upcoming);

        app.process_refresh_result(RefreshResult::Teams(vec![wolves.clone(), bears.clone()]));
        app.process_refresh_result(RefreshResult::Tryouts(bears.id, vec![t1.clone()]));
        assert!(app.team_tryouts().is_empty());

        app.select_team(1);
        assert_eq!(app.selected_team().map(|t| t.id), Some(bears.id));
        assert_eq!(app.config.active_team_id, Some(bears.id));
        assert_eq!(app.selected_tryout().map(|t| t.id), Some(t1.id));

        app.refreshing = true;
        app.process_refresh_result(RefreshResult::Error("Teams: boom".to_string()));
        app.process_refresh_result(RefreshResult::RefreshComplete);
        assert!(!app.refreshing);
        assert_eq!(app.status_message.as_deref(), Some("Error: Teams: boom"));

        app.forget_team_locally(bears.id);
        assert_eq!(app.teams.len(), 1);
        assert_eq!(app.team_selection, 0);
        assert!(app.tryouts.is_empty());
        assert_eq!(app.config.active_team_id, None);
    }

    #[test]
    fn test_clamp_selections_after_lists_shrink() {
        let mut app = empty_app("clamp");
        let wolves = team("Wolves");
        app.process_refresh_result(RefreshResult::Teams(vec![team("Bears"), wolves.clone()]));
        app.process_refresh_result(RefreshResult::Tryouts(
            wolves.id,
            vec![tryout(wolves.id, TryoutStatus::Upcoming), tryout(wolves.id, TryoutStatus::Active)],
        ));
        app.team_selection = 5;
        app.tryout_selection = 1;
        app.roster_selection = 3;
        app.player_selection = 7;

        app.clamp_selections();
        assert_eq!(app.team_selection, 1);
        assert_eq!(app.tryout_selection, 1);
        assert_eq!(app.roster_selection, 0);
        assert_eq!(app.player_selection, 0);

        app.process_refresh_result(RefreshResult::Tryouts(
            wolves.id,
            vec![tryout(wolves.id, TryoutStatus::Upcoming)],
        ));
        assert_eq!(app.tryout_selection, 0);
    }

    #[test]
    fn test_deleted_team_message_counts_every_dependent_row() {
        let report = teams::CascadeReport {
            registrations: 3,
            tryouts: 1,
            seasons: 1,
            ..Default::default()
        };
        assert_eq!(deleted_team_message("Wolves", &report), "Deleted Wolves (5 related rows)");
        assert_eq!(
            deleted_team_message("Bears", &teams::CascadeReport::default()),
            "Deleted Bears (0 related rows)"
        );
    }

    #[test]
    fn test_complete_request_rejects_closed_tryout() {
        let mut app = empty_app("complete");
        let wolves = team("Wolves");
        app.process_refresh_result(RefreshResult::Teams(vec![wolves.clone()]));
        app.process_refresh_result(RefreshResult::Tryouts(
            wolves.id,
            vec![tryout(wolves.id, TryoutStatus::Completed)],
        ));
        app.request_complete_tryout();
        assert_eq!(app.state, AppState::Normal);
        assert!(app.status_message.as_deref().unwrap_or("").contains("Completed"));

        app.process_refresh_result(RefreshResult::Tryouts(
            wolves.id,
            vec![tryout(wolves.id, TryoutStatus::Active)],
        ));
        app.request_complete_tryout();
        assert_eq!(app.state, AppState::ConfirmingCompleteTryout);
        assert!(app.completion_season_name().starts_with("Wolves "));
    }

    #[tokio::test]
    async fn test_offline_blocks_edits() {
        let mut app = empty_app("offline");
        app.offline_mode = true;
        app.process_refresh_result(RefreshResult::Teams(vec![team("Wolves")]));
        app.delete_selected_team().await;
        assert_eq!(app.teams.len(), 1);
        assert_eq!(app.status_message.as_deref(), Some("Offline - edits disabled"));

        app.refresh_all_background();
        assert!(!app.refreshing);
    }

    #[test]
    fn test_player_search_and_sort() {
        let mut app = empty_app("players");
        let make = |first: &str, last: &str, jersey: i32| Player {
            id: Uuid::new_v4(),
            coach_id: None,
            user_id: None,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: None,
            phone: None,
            date_of_birth: None,
            position: None,
            jersey_number: Some(jersey),
            shoots: None,
            parent_name: None,
            parent_email: None,
            parent_phone: None,
            notes: None,
            avatar_url: None,
            created_at: None,
        };
        app.process_refresh_result(RefreshResult::Players(vec![
            make("Zed", "Adams", 4),
            make("Amy", "Young", 19),
            make("Bo", "Adler", 2),
        ]));

        let names: Vec<String> = app.get_sorted_players().iter().map(|p| p.last_name.clone()).collect();
        assert_eq!(names, vec!["Adams", "Adler", "Young"]);

        app.toggle_player_sort(PlayerSortColumn::Jersey);
        let jerseys: Vec<Option<i32>> = app.get_sorted_players().iter().map(|p| p.jersey_number).collect();
        assert_eq!(jerseys, vec![Some(2), Some(4), Some(19)]);
        app.toggle_player_sort(PlayerSortColumn::Jersey);
        assert_eq!(app.get_sorted_players()[0].jersey_number, Some(19));

        app.search_query = "ad".to_string();
        assert_eq!(app.get_sorted_players().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_streams_coach_data() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let (coach, _) = coach::ensure_coach_profile(&store, coach::profile_from_email(user_id, "pat.kane@club.org"))
            .await
            .unwrap();

        let team: Team = insert_one(&store, &NewTeam {
            coach_id: coach.id,
            name: "Wolves".to_string(),
            age_group: None,
            level: None,
            season_year: None,
            description: None,
        })
        .await
        .unwrap();
        let player: Player = insert_one(&store, &NewPlayer {
            coach_id: Some(coach.id),
            first_name: "Ada".to_string(),
            last_name: "Ames".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        let tryout: Tryout = insert_one(&store, &NewTryout {
            team_id: team.id,
            name: "Fall Tryouts".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 6).unwrap(),
            end_date: None,
            location: None,
            max_players: None,
            status: TryoutStatus::Upcoming,
            description: None,
        })
        .await
        .unwrap();
        let _: TryoutRegistration = insert_one(&store, &NewTryoutRegistration {
            tryout_id: tryout.id,
            player_id: player.id,
            status: RegistrationStatus::Pending,
            jersey_number: None,
            notes: None,
        })
        .await
        .unwrap();
        let season: RegularSeason = insert_one(&store, &NewRegularSeason {
            team_id: team.id,
            tryout_id: Some(tryout.id),
            name: "Wolves 2025 Season".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            end_date: None,
            status: SeasonStatus::Active,
        })
        .await
        .unwrap();
        let _: RegularSeasonPlayer = insert_one(&store, &NewRegularSeasonPlayer {
            season_id: season.id,
            player_id: player.id,
            jersey_number: Some(9),
            position: None,
            status: SeasonPlayerStatus::Active,
        })
        .await
        .unwrap();

        let (tx, mut rx) = mpsc::channel(64);
        fetch_all(&store, user_id, "pat.kane@club.org", &tx).await;
        let results = drain(&mut rx).await;

        let mut app = empty_app("fetch");
        for result in results {
            app.process_refresh_result(result);
        }
        assert_eq!(app.coach.as_ref().map(|c| c.id), Some(coach.id));
        assert_eq!(app.teams.len(), 1);
        assert_eq!(app.players.len(), 1);
        assert_eq!(app.team_tryouts().len(), 1);
        assert_eq!(app.tryout_registrations().len(), 1);
        assert_eq!(app.current_season().map(|s| s.id), Some(season.id));
        assert_eq!(app.current_roster()[0].jersey_number(), Some(9));
        assert!(app.status_message.is_none());

        // the cache now holds what was fetched
        let mut reloaded = App::from_parts(
            Config::default(),
            Session::new(temp_dir("reload")),
            ApiClient::new("http://localhost:54321", "anon").unwrap(),
            app.cache,
        );
        reloaded.load_from_cache();
        assert_eq!(reloaded.teams.len(), 1);
        assert_eq!(reloaded.current_roster().len(), 1);
    }
}
