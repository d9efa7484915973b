//! Regular seasons: rosters, player availability and the game schedule.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    Game, GameStatus, NewGame, NewRegularSeasonPlayer, Player, Position, RegularSeason,
    RegularSeasonPlayer, SeasonPlayerStatus, SeasonStatus,
};
use crate::store::{insert_one, select_one, Query, Record, Store};
use crate::utils::cmp_ignore_case;
use crate::validation::{self, ValidationError, ValidationErrors};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeasonError {
    #[error("Season not found: {0}")]
    NotFound(Uuid),

    #[error("Season has ended")]
    Completed,

    #[error("Player is already on this roster")]
    AlreadyOnRoster,

    #[error("Jersey #{0} is already taken on this roster")]
    JerseyTaken(i32),

    #[error("Player is not on this roster")]
    NotOnRoster,

    #[error("Game not found: {0}")]
    GameNotFound(Uuid),
}

/// A rostered player: the season membership joined with the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub membership: RegularSeasonPlayer,
    pub player: Player,
}

impl RosterEntry {
    pub fn status(&self) -> SeasonPlayerStatus {
        self.membership.status
    }

    /// Season jersey, falling back to the player's usual number
    pub fn jersey_number(&self) -> Option<i32> {
        self.membership.jersey_number.or(self.player.jersey_number)
    }

    pub fn position(&self) -> Option<Position> {
        self.membership.position.or(self.player.position)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub active: usize,
    pub injured: usize,
    pub suspended: usize,
    pub total: usize,
}

pub fn count_statuses(roster: &[RosterEntry]) -> StatusCounts {
    let mut counts = StatusCounts {
        total: roster.len(),
        ..Default::default()
    };
    for entry in roster {
        match entry.status() {
            SeasonPlayerStatus::Active => counts.active += 1,
            SeasonPlayerStatus::Injured => counts.injured += 1,
            SeasonPlayerStatus::Suspended => counts.suspended += 1,
        }
    }
    counts
}

/// Win/loss record over completed games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeasonRecord {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub goals_for: i64,
    pub goals_against: i64,
}

impl SeasonRecord {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    pub fn goal_differential(&self) -> i64 {
        self.goals_for - self.goals_against
    }
}

impl std::fmt::Display for SeasonRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.wins, self.losses, self.ties)
    }
}

pub fn season_record(games: &[Game]) -> SeasonRecord {
    let mut record = SeasonRecord::default();
    for game in games.iter().filter(|g| g.status == GameStatus::Completed) {
        let (Some(us), Some(them)) = (game.team_score, game.opponent_score) else {
            continue;
        };
        match us.cmp(&them) {
            Ordering::Greater => record.wins += 1,
            Ordering::Less => record.losses += 1,
            Ordering::Equal => record.ties += 1,
        }
        record.goals_for += us as i64;
        record.goals_against += them as i64;
    }
    record
}

// ===== Seasons =====

pub async fn get_season<S: Store>(store: &S, season_id: Uuid) -> Result<RegularSeason> {
    select_one(store, Query::new().eq("id", season_id))
        .await
        .context("Failed to load season")?
        .ok_or_else(|| SeasonError::NotFound(season_id).into())
}

async fn get_open_season<S: Store>(store: &S, season_id: Uuid) -> Result<RegularSeason> {
    let season = get_season(store, season_id).await?;
    if season.status == SeasonStatus::Completed {
        return Err(SeasonError::Completed.into());
    }
    Ok(season)
}

/// Seasons of a team, newest first
pub async fn seasons_for_team<S: Store>(store: &S, team_id: Uuid) -> Result<Vec<RegularSeason>> {
    store
        .select(&Query::new().eq("team_id", team_id).order_by("start_date", false))
        .await
        .with_context(|| format!("Failed to load seasons for team {}", team_id))
}

/// Close a season. The end date defaults to today.
pub async fn end_season<S: Store>(
    store: &S,
    season_id: Uuid,
    end_date: Option<NaiveDate>,
) -> Result<RegularSeason> {
    let season = get_open_season(store, season_id).await?;
    let end_date = end_date.unwrap_or_else(|| Utc::now().date_naive());
    validation::date_range("end_date", season.start_date, Some(end_date))?;

    let mut rows: Vec<RegularSeason> = store
        .update(
            &Query::new().eq("id", season_id),
            json!({ "status": SeasonStatus::Completed, "end_date": end_date }),
        )
        .await
        .context("Failed to end season")?;
    info!(season_id = %season_id, "Season ended");
    rows.pop().ok_or_else(|| SeasonError::NotFound(season_id).into())
}

// ===== Roster =====

/// Players on a season roster, optionally limited to one status.
/// Sorted by jersey number (unnumbered last), then last name.
pub async fn season_roster<S: Store>(
    store: &S,
    season_id: Uuid,
    status: Option<SeasonPlayerStatus>,
) -> Result<Vec<RosterEntry>> {
    let mut query = Query::new().eq("season_id", season_id);
    if let Some(status) = status {
        query = query.eq("status", status);
    }
    let memberships: Vec<RegularSeasonPlayer> = store
        .select(&query)
        .await
        .context("Failed to load season roster")?;
    if memberships.is_empty() {
        return Ok(Vec::new());
    }

    let players: Vec<Player> = store
        .select(&Query::new().is_in("id", memberships.iter().map(|m| m.player_id)))
        .await
        .context("Failed to load rostered players")?;
    let mut by_id: HashMap<Uuid, Player> = players.into_iter().map(|p| (p.id, p)).collect();

    let mut roster: Vec<RosterEntry> = memberships
        .into_iter()
        .filter_map(|membership| {
            let player = by_id.remove(&membership.player_id)?;
            Some(RosterEntry { membership, player })
        })
        .collect();

    roster.sort_by(|a, b| {
        let jersey = match (a.jersey_number(), b.jersey_number()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        jersey
            .then_with(|| cmp_ignore_case(&a.player.last_name, &b.player.last_name))
            .then_with(|| cmp_ignore_case(&a.player.first_name, &b.player.first_name))
    });
    Ok(roster)
}

pub async fn add_player<S: Store>(
    store: &S,
    season_id: Uuid,
    player_id: Uuid,
    jersey_number: Option<i32>,
    position: Option<Position>,
) -> Result<RegularSeasonPlayer> {
    if let Some(n) = jersey_number {
        validation::jersey_number("jersey_number", n)?;
    }
    get_open_season(store, season_id).await?;

    let existing: Vec<RegularSeasonPlayer> = store
        .select(&Query::new().eq("season_id", season_id))
        .await
        .context("Failed to load season roster")?;
    if existing.iter().any(|m| m.player_id == player_id) {
        return Err(SeasonError::AlreadyOnRoster.into());
    }
    if let Some(n) = jersey_number {
        if existing.iter().any(|m| m.jersey_number == Some(n)) {
            return Err(SeasonError::JerseyTaken(n).into());
        }
    }

    let new = NewRegularSeasonPlayer {
        season_id,
        player_id,
        status: SeasonPlayerStatus::Active,
        jersey_number,
        position,
    };
    insert_one(store, &new).await.context("Failed to add player to roster")
}

fn membership_query(season_id: Uuid, player_id: Uuid) -> Query {
    Query::new()
        .eq("season_id", season_id)
        .eq("player_id", player_id)
}

pub async fn set_player_status<S: Store>(
    store: &S,
    season_id: Uuid,
    player_id: Uuid,
    status: SeasonPlayerStatus,
) -> Result<RegularSeasonPlayer> {
    let mut rows: Vec<RegularSeasonPlayer> = store
        .update(&membership_query(season_id, player_id), json!({ "status": status }))
        .await
        .context("Failed to update player status")?;
    rows.pop().ok_or_else(|| SeasonError::NotOnRoster.into())
}

pub async fn remove_player<S: Store>(store: &S, season_id: Uuid, player_id: Uuid) -> Result<()> {
    let removed = store
        .delete(RegularSeasonPlayer::TABLE, &membership_query(season_id, player_id))
        .await
        .context("Failed to remove player from roster")?;
    if removed == 0 {
        return Err(SeasonError::NotOnRoster.into());
    }
    Ok(())
}

// ===== Games =====

/// Games of a season in date order
pub async fn games_for_season<S: Store>(store: &S, season_id: Uuid) -> Result<Vec<Game>> {
    store
        .select(&Query::new().eq("season_id", season_id).order_by("game_date", true))
        .await
        .context("Failed to load games")
}

pub async fn schedule_game<S: Store>(store: &S, mut new: NewGame) -> Result<Game> {
    new.opponent = new.opponent.trim().to_string();
    validation::name("opponent", &new.opponent)?;
    get_open_season(store, new.season_id).await?;
    new.status = GameStatus::Scheduled;
    insert_one(store, &new).await.context("Failed to schedule game")
}

/// Record a final score and mark the game completed
pub async fn record_result<S: Store>(
    store: &S,
    game_id: Uuid,
    team_score: i32,
    opponent_score: i32,
) -> Result<Game> {
    let mut errors = ValidationErrors::new();
    for (field, score) in [("team_score", team_score), ("opponent_score", opponent_score)] {
        if score < 0 {
            errors.check(Err(ValidationError::new(field, "must not be negative")));
        }
    }
    errors.into_result()?;

    let mut rows: Vec<Game> = store
        .update(
            &Query::new().eq("id", game_id),
            json!({
                "team_score": team_score,
                "opponent_score": opponent_score,
                "status": GameStatus::Completed,
            }),
        )
        .await
        .context("Failed to record game result")?;
    rows.pop().ok_or_else(|| SeasonError::GameNotFound(game_id).into())
}
