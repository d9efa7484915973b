//! Tryout lifecycle: scheduling, registration and completion into a season.
//!
//! A tryout moves `upcoming -> active -> completed`, or to `cancelled` from
//! either open state. Completion creates the regular season, carries every
//! non-cancelled (and, when given, selected) registration onto its roster and
//! closes the tryout.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    NewRegularSeason, NewRegularSeasonPlayer, NewTryout, NewTryoutRegistration, Player, Position,
    RegistrationStatus, RegularSeason, RegularSeasonPlayer, SeasonPlayerStatus, SeasonStatus,
    Tryout, TryoutRegistration, TryoutStatus,
};
use crate::store::{insert_one, select_one, Query, Record, Store};
use crate::validation;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TryoutError {
    #[error("Tryout not found: {0}")]
    NotFound(Uuid),

    #[error("Tryout is {0} and can no longer be changed")]
    Closed(TryoutStatus),

    #[error("Cannot move a tryout from {from} to {to}")]
    InvalidTransition { from: TryoutStatus, to: TryoutStatus },

    #[error("Player is already registered for this tryout")]
    AlreadyRegistered,

    #[error("Tryout is full ({0} players)")]
    Full(i32),

    #[error("Registration not found: {0}")]
    RegistrationNotFound(Uuid),
}

/// Registration counts by status, for tryouts and camps alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSummary {
    pub total: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub cancelled: usize,
}

pub type TryoutSummary = RegistrationSummary;

impl RegistrationSummary {
    /// Registrations that still hold a spot
    pub fn active(&self) -> usize {
        self.confirmed + self.pending
    }
}

pub fn summarize_statuses(statuses: impl IntoIterator<Item = RegistrationStatus>) -> RegistrationSummary {
    let mut summary = RegistrationSummary::default();
    for status in statuses {
        summary.total += 1;
        match status {
            RegistrationStatus::Confirmed => summary.confirmed += 1,
            RegistrationStatus::Pending => summary.pending += 1,
            RegistrationStatus::Cancelled => summary.cancelled += 1,
        }
    }
    summary
}

pub fn summarize(registrations: &[TryoutRegistration]) -> TryoutSummary {
    summarize_statuses(registrations.iter().map(|r| r.status))
}

/// Player ids grouped by registration status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedPlayers {
    pub confirmed: Vec<Uuid>,
    pub pending: Vec<Uuid>,
    pub cancelled: Vec<Uuid>,
}

pub fn classify(registrations: &[TryoutRegistration]) -> ClassifiedPlayers {
    let mut out = ClassifiedPlayers::default();
    for reg in registrations {
        let bucket = match reg.status {
            RegistrationStatus::Confirmed => &mut out.confirmed,
            RegistrationStatus::Pending => &mut out.pending,
            RegistrationStatus::Cancelled => &mut out.cancelled,
        };
        bucket.push(reg.player_id);
    }
    out
}

/// Name suggested for the season a tryout turns into
pub fn default_season_name(team_name: &str, year: i32) -> String {
    format!("{} {} Season", team_name.trim(), year)
}

// ===== Queries =====

pub async fn get_tryout<S: Store>(store: &S, tryout_id: Uuid) -> Result<Tryout> {
    select_one(store, Query::new().eq("id", tryout_id))
        .await
        .context("Failed to load tryout")?
        .ok_or_else(|| TryoutError::NotFound(tryout_id).into())
}

/// Tryouts of a team, newest first
pub async fn tryouts_for_team<S: Store>(store: &S, team_id: Uuid) -> Result<Vec<Tryout>> {
    store
        .select(&Query::new().eq("team_id", team_id).order_by("start_date", false))
        .await
        .with_context(|| format!("Failed to load tryouts for team {}", team_id))
}

pub async fn registrations<S: Store>(store: &S, tryout_id: Uuid) -> Result<Vec<TryoutRegistration>> {
    store
        .select(&Query::new().eq("tryout_id", tryout_id).order_by("created_at", true))
        .await
        .with_context(|| format!("Failed to load registrations for tryout {}", tryout_id))
}

// ===== Mutations =====

pub async fn create_tryout<S: Store>(store: &S, mut new: NewTryout) -> Result<Tryout> {
    new.name = new.name.trim().to_string();
    new.status = TryoutStatus::Upcoming;
    new.validate()?;
    let tryout: Tryout = insert_one(store, &new).await.context("Failed to create tryout")?;
    info!(tryout_id = %tryout.id, team_id = %tryout.team_id, "Created tryout");
    Ok(tryout)
}

/// Register a player, reviving a cancelled registration rather than adding
/// a second row for the same player.
pub async fn register_player<S: Store>(
    store: &S,
    tryout_id: Uuid,
    player_id: Uuid,
    jersey_number: Option<i32>,
) -> Result<TryoutRegistration> {
    if let Some(n) = jersey_number {
        validation::jersey_number("jersey_number", n)?;
    }
    let tryout = get_tryout(store, tryout_id).await?;
    if tryout.status.is_closed() {
        return Err(TryoutError::Closed(tryout.status).into());
    }

    let existing = registrations(store, tryout_id).await?;
    if existing
        .iter()
        .any(|r| r.player_id == player_id && !r.status.is_cancelled())
    {
        return Err(TryoutError::AlreadyRegistered.into());
    }
    if let Some(max) = tryout.max_players {
        if summarize(&existing).active() >= max.max(0) as usize {
            return Err(TryoutError::Full(max).into());
        }
    }

    if let Some(cancelled) = existing.iter().find(|r| r.player_id == player_id) {
        let mut patch = json!({ "status": RegistrationStatus::Pending });
        if let Some(n) = jersey_number {
            patch["jersey_number"] = json!(n);
        }
        let mut rows: Vec<TryoutRegistration> = store
            .update(&Query::new().eq("id", cancelled.id), patch)
            .await
            .context("Failed to reactivate registration")?;
        debug!(registration_id = %cancelled.id, "Reactivated cancelled registration");
        return rows
            .pop()
            .ok_or_else(|| TryoutError::RegistrationNotFound(cancelled.id).into());
    }

    let new = NewTryoutRegistration {
        tryout_id,
        player_id,
        status: RegistrationStatus::Pending,
        jersey_number,
        notes: None,
    };
    insert_one(store, &new).await.context("Failed to register player")
}

pub async fn set_registration_status<S: Store>(
    store: &S,
    registration_id: Uuid,
    status: RegistrationStatus,
) -> Result<TryoutRegistration> {
    let mut rows: Vec<TryoutRegistration> = store
        .update(
            &Query::new().eq("id", registration_id),
            json!({ "status": status }),
        )
        .await
        .context("Failed to update registration status")?;
    rows.pop()
        .ok_or_else(|| TryoutError::RegistrationNotFound(registration_id).into())
}

async fn transition<S: Store>(store: &S, tryout_id: Uuid, to: TryoutStatus) -> Result<Tryout> {
    let tryout = get_tryout(store, tryout_id).await?;
    let allowed = matches!(
        (tryout.status, to),
        (TryoutStatus::Upcoming, TryoutStatus::Active)
            | (TryoutStatus::Upcoming, TryoutStatus::Cancelled)
            | (TryoutStatus::Active, TryoutStatus::Cancelled)
    );
    if !allowed {
        return Err(TryoutError::InvalidTransition {
            from: tryout.status,
            to,
        }
        .into());
    }
    let mut rows: Vec<Tryout> = store
        .update(&Query::new().eq("id", tryout_id), json!({ "status": to }))
        .await
        .context("Failed to update tryout status")?;
    info!(tryout_id = %tryout_id, from = %tryout.status, to = %to, "Tryout status changed");
    rows.pop().ok_or_else(|| TryoutError::NotFound(tryout_id).into())
}

pub async fn start_tryout<S: Store>(store: &S, tryout_id: Uuid) -> Result<Tryout> {
    transition(store, tryout_id, TryoutStatus::Active).await
}

pub async fn cancel_tryout<S: Store>(store: &S, tryout_id: Uuid) -> Result<Tryout> {
    transition(store, tryout_id, TryoutStatus::Cancelled).await
}

// ===== Completion =====

/// Season details entered when completing a tryout.
#[derive(Debug, Clone)]
pub struct SeasonDraft {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Which registered players make the team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Everyone whose registration is not cancelled
    #[default]
    AllActive,
    /// Only these players, and only if their registration is not cancelled
    Only(Vec<Uuid>),
}

impl Selection {
    fn includes(&self, player_id: Uuid) -> bool {
        match self {
            Selection::AllActive => true,
            Selection::Only(ids) => ids.contains(&player_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub season: RegularSeason,
    pub migrated: usize,
    pub skipped_cancelled: usize,
    pub skipped_unselected: usize,
}

/// Turn a tryout into a regular season.
///
/// Steps, in order: load and check the tryout, validate the draft, insert the
/// season, bulk-insert the roster, mark the tryout completed. A failed roster
/// insert deletes the new season before the error is returned.
pub async fn complete_tryout<S: Store>(
    store: &S,
    tryout_id: Uuid,
    draft: SeasonDraft,
    selection: Selection,
) -> Result<CompletionOutcome> {
    let tryout = get_tryout(store, tryout_id).await?;
    if tryout.status.is_closed() {
        return Err(TryoutError::Closed(tryout.status).into());
    }

    let new_season = NewRegularSeason {
        team_id: tryout.team_id,
        tryout_id: Some(tryout.id),
        name: draft.name.trim().to_string(),
        start_date: draft.start_date,
        end_date: draft.end_date,
        status: SeasonStatus::Active,
    };
    new_season.validate()?;

    let regs = registrations(store, tryout_id).await?;
    let mut skipped_cancelled = 0;
    let mut skipped_unselected = 0;
    let mut kept: Vec<&TryoutRegistration> = Vec::new();
    for reg in &regs {
        if reg.status.is_cancelled() {
            skipped_cancelled += 1;
        } else if !selection.includes(reg.player_id) {
            skipped_unselected += 1;
        } else if !kept.iter().any(|k| k.player_id == reg.player_id) {
            kept.push(reg);
        }
    }

    let positions: HashMap<Uuid, Option<Position>> = if kept.is_empty() {
        HashMap::new()
    } else {
        let players: Vec<Player> = store
            .select(&Query::new().is_in("id", kept.iter().map(|r| r.player_id)))
            .await
            .context("Failed to load selected players")?;
        players.into_iter().map(|p| (p.id, p.position)).collect()
    };

    let season: RegularSeason = insert_one(store, &new_season)
        .await
        .context("Failed to create season")?;

    let roster: Vec<NewRegularSeasonPlayer> = kept
        .iter()
        .map(|reg| NewRegularSeasonPlayer {
            season_id: season.id,
            player_id: reg.player_id,
            status: SeasonPlayerStatus::Active,
            jersey_number: reg.jersey_number,
            position: positions.get(&reg.player_id).copied().flatten(),
        })
        .collect();

    if !roster.is_empty() {
        if let Err(e) = store.insert::<RegularSeasonPlayer, _>(&roster).await {
            warn!(season_id = %season.id, error = %e, "Roster insert failed, removing season");
            if let Err(cleanup) = store
                .delete(RegularSeason::TABLE, &Query::new().eq("id", season.id))
                .await
            {
                warn!(season_id = %season.id, error = %cleanup, "Failed to remove orphaned season");
            }
            return Err(e.context("Failed to add players to the new season"));
        }
    }

    store
        .update::<Tryout>(
            &Query::new().eq("id", tryout_id),
            json!({ "status": TryoutStatus::Completed }),
        )
        .await
        .context("Season created but the tryout could not be marked completed")?;

    info!(
        tryout_id = %tryout_id,
        season_id = %season.id,
        migrated = roster.len(),
        skipped_cancelled = skipped_cancelled,
        skipped_unselected = skipped_unselected,
        "Completed tryout"
    );

    Ok(CompletionOutcome {
        season,
        migrated: roster.len(),
        skipped_cancelled,
        skipped_unselected,
    })
}
