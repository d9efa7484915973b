//! Player profiles: CRUD, search, sorting and the deletion cascade.

use std::cmp::Ordering;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    CampRegistration, EvaluationScore, NewPlayer, Player, PlayerEvaluation, PlayerPost,
    PlayerSortColumn, PostComment, PostLike, RegularSeasonPlayer, TryoutRegistration,
};
use crate::store::{insert_one, select_one, Query, Record, Store};
use crate::utils::{cmp_ignore_case, contains_ignore_case};

use super::{collect_ids, delete_in};

/// Rows removed by `delete_player`, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlayerCascadeReport {
    pub evaluation_scores: u64,
    pub evaluations: u64,
    pub tryout_registrations: u64,
    pub season_rows: u64,
    pub camp_registrations: u64,
    pub likes: u64,
    pub comments: u64,
    pub posts: u64,
}

/// Trim text fields and lowercase emails before validation
fn normalize(mut new: NewPlayer) -> NewPlayer {
    let clean = |v: Option<String>| {
        v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    };
    new.first_name = new.first_name.trim().to_string();
    new.last_name = new.last_name.trim().to_string();
    new.email = clean(new.email).map(|e| e.to_lowercase());
    new.parent_email = clean(new.parent_email).map(|e| e.to_lowercase());
    new.phone = clean(new.phone);
    new.parent_phone = clean(new.parent_phone);
    new.parent_name = clean(new.parent_name);
    new.notes = clean(new.notes);
    new
}

pub async fn get_player<S: Store>(store: &S, player_id: Uuid) -> Result<Player> {
    select_one(store, Query::new().eq("id", player_id))
        .await
        .context("Failed to load player")?
        .ok_or_else(|| anyhow!("Player not found: {}", player_id))
}

/// Players created by a coach, by last then first name
pub async fn players_for_coach<S: Store>(store: &S, coach_id: Uuid) -> Result<Vec<Player>> {
    store
        .select(
            &Query::new()
                .eq("coach_id", coach_id)
                .order_by("last_name", true)
                .order_by("first_name", true),
        )
        .await
        .context("Failed to load players")
}

pub async fn create_player<S: Store>(store: &S, new: NewPlayer) -> Result<Player> {
    let new = normalize(new);
    new.validate()?;
    let player: Player = insert_one(store, &new).await.context("Failed to create player")?;
    info!(player_id = %player.id, "Created player");
    Ok(player)
}

/// Replace a player's editable fields; the creating coach never changes.
pub async fn update_player<S: Store>(store: &S, player_id: Uuid, changes: NewPlayer) -> Result<Player> {
    let changes = normalize(changes);
    changes.validate()?;
    let mut patch = serde_json::to_value(&changes)?;
    if let Some(map) = patch.as_object_mut() {
        map.remove("coach_id");
    }
    let mut rows: Vec<Player> = store
        .update(&Query::new().eq("id", player_id), patch)
        .await
        .context("Failed to update player")?;
    rows.pop().ok_or_else(|| anyhow!("Player not found: {}", player_id))
}

/// Players whose name or email contains `term`, ignoring case.
/// An empty term matches everyone.
pub fn search<'a>(players: &'a [Player], term: &str) -> Vec<&'a Player> {
    let term = term.trim();
    players
        .iter()
        .filter(|p| {
            term.is_empty()
                || contains_ignore_case(&p.full_name(), term)
                || contains_ignore_case(&p.display_name(), term)
                || p.email
                    .as_deref()
                    .map(|e| contains_ignore_case(e, term))
                    .unwrap_or(false)
        })
        .collect()
}

/// Ordering of two players on a sort column
pub fn compare_players(a: &Player, b: &Player, column: PlayerSortColumn, ascending: bool) -> Ordering {
    let ord = match column {
        PlayerSortColumn::Name => cmp_ignore_case(&a.last_name, &b.last_name)
            .then_with(|| cmp_ignore_case(&a.first_name, &b.first_name)),
        PlayerSortColumn::Position => a.position_display().cmp(&b.position_display()),
        PlayerSortColumn::Jersey => a.jersey_number.cmp(&b.jersey_number),
        PlayerSortColumn::Age => a.date_of_birth.cmp(&b.date_of_birth).reverse(),
    };
    if ascending {
        ord
    } else {
        ord.reverse()
    }
}

pub fn sort_players(players: &mut [Player], column: PlayerSortColumn, ascending: bool) {
    players.sort_by(|a, b| compare_players(a, b, column, ascending));
}

/// Delete a player and every row that references them.
pub async fn delete_player<S: Store>(store: &S, player_id: Uuid) -> Result<PlayerCascadeReport> {
    get_player(store, player_id).await?;
    let mut report = PlayerCascadeReport::default();
    let by_player = Query::new().eq("player_id", player_id);

    let evaluations: Vec<PlayerEvaluation> = store
        .select(&by_player)
        .await
        .context("Failed to load player evaluations")?;
    let evaluation_ids = collect_ids(&evaluations, |e| e.id);
    report.evaluation_scores =
        delete_in(store, EvaluationScore::TABLE, "evaluation_id", &evaluation_ids).await?;
    report.evaluations = delete_in(store, PlayerEvaluation::TABLE, "id", &evaluation_ids).await?;

    report.tryout_registrations = store.delete(TryoutRegistration::TABLE, &by_player).await?;
    report.season_rows = store.delete(RegularSeasonPlayer::TABLE, &by_player).await?;
    report.camp_registrations = store.delete(CampRegistration::TABLE, &by_player).await?;

    report.likes = store.delete(PostLike::TABLE, &by_player).await?;
    report.comments = store.delete(PostComment::TABLE, &by_player).await?;

    let posts: Vec<PlayerPost> = store
        .select(&by_player)
        .await
        .context("Failed to load player posts")?;
    let post_ids = collect_ids(&posts, |p| p.id);
    report.likes += delete_in(store, PostLike::TABLE, "post_id", &post_ids).await?;
    report.comments += delete_in(store, PostComment::TABLE, "post_id", &post_ids).await?;
    report.posts = delete_in(store, PlayerPost::TABLE, "id", &post_ids).await?;

    store
        .delete(Player::TABLE, &Query::new().eq("id", player_id))
        .await
        .context("Failed to delete player")?;
    info!(player_id = %player_id, "Deleted player");
    Ok(report)
}
