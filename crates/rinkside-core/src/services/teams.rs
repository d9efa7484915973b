//! Team management and the team deletion cascade.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::api::storage::{self, MEDIA_BUCKET};
use crate::models::{
    EvaluationScore, Game, NewTeam, PlayerEvaluation, RegularSeason, RegularSeasonPlayer, Team,
    Tryout, TryoutRegistration,
};
use crate::store::{insert_one, select_one, ObjectStore, Query, Record, Store};
use crate::validation::ValidationError;

use super::{collect_ids, delete_in};

/// Rows removed by `delete_team`, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub evaluation_scores: u64,
    pub evaluations: u64,
    pub registrations: u64,
    pub tryouts: u64,
    pub games: u64,
    pub season_players: u64,
    pub seasons: u64,
}

impl CascadeReport {
    pub fn total(&self) -> u64 {
        self.evaluation_scores
            + self.evaluations
            + self.registrations
            + self.tryouts
            + self.games
            + self.season_players
            + self.seasons
    }
}

pub async fn get_team<S: Store>(store: &S, team_id: Uuid) -> Result<Team> {
    select_one(store, Query::new().eq("id", team_id))
        .await
        .context("Failed to load team")?
        .ok_or_else(|| anyhow!("Team not found: {}", team_id))
}

/// Teams a coach owns, by name
pub async fn teams_for_coach<S: Store>(store: &S, coach_id: Uuid) -> Result<Vec<Team>> {
    store
        .select(&Query::new().eq("coach_id", coach_id).order_by("name", true))
        .await
        .context("Failed to load teams")
}

pub async fn create_team<S: Store>(store: &S, mut new: NewTeam) -> Result<Team> {
    new.name = new.name.trim().to_string();
    new.validate()?;
    let team: Team = insert_one(store, &new).await.context("Failed to create team")?;
    info!(team_id = %team.id, name = %team.name, "Created team");
    Ok(team)
}

/// Replace a team's editable fields; the owning coach never changes.
pub async fn update_team<S: Store>(store: &S, team_id: Uuid, mut changes: NewTeam) -> Result<Team> {
    changes.name = changes.name.trim().to_string();
    changes.validate()?;
    let patch = json!({
        "name": changes.name,
        "age_group": changes.age_group,
        "level": changes.level,
        "season_year": changes.season_year,
        "description": changes.description,
    });
    let mut rows: Vec<Team> = store
        .update(&Query::new().eq("id", team_id), patch)
        .await
        .context("Failed to update team")?;
    rows.pop().ok_or_else(|| anyhow!("Team not found: {}", team_id))
}

/// Delete evaluations tied to `column` in `ids` together with their scores.
async fn delete_evaluations<S: Store>(
    store: &S,
    column: &str,
    ids: &[Uuid],
    report: &mut CascadeReport,
) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let evaluations: Vec<PlayerEvaluation> = store
        .select(&Query::new().is_in(column, ids.iter().copied()))
        .await
        .context("Failed to load evaluations")?;
    let evaluation_ids = collect_ids(&evaluations, |e| e.id);
    report.evaluation_scores +=
        delete_in(store, EvaluationScore::TABLE, "evaluation_id", &evaluation_ids).await?;
    report.evaluations += delete_in(store, PlayerEvaluation::TABLE, "id", &evaluation_ids).await?;
    Ok(())
}

/// Delete a team and everything that hangs off it.
///
/// Tryout side first (evaluations, registrations, tryouts), then the season
/// side (games, evaluations, season players, seasons), then the team row.
pub async fn delete_team<S: Store>(store: &S, team_id: Uuid) -> Result<CascadeReport> {
    let team = get_team(store, team_id).await?;
    let mut report = CascadeReport::default();

    let tryouts: Vec<Tryout> = store
        .select(&Query::new().eq("team_id", team_id))
        .await
        .context("Failed to load team tryouts")?;
    let tryout_ids = collect_ids(&tryouts, |t| t.id);
    delete_evaluations(store, "tryout_id", &tryout_ids, &mut report).await?;
    report.registrations =
        delete_in(store, TryoutRegistration::TABLE, "tryout_id", &tryout_ids).await?;
    report.tryouts = delete_in(store, Tryout::TABLE, "id", &tryout_ids).await?;

    let seasons: Vec<RegularSeason> = store
        .select(&Query::new().eq("team_id", team_id))
        .await
        .context("Failed to load team seasons")?;
    let season_ids = collect_ids(&seasons, |s| s.id);
    report.games = delete_in(store, Game::TABLE, "season_id", &season_ids).await?;
    delete_evaluations(store, "season_id", &season_ids, &mut report).await?;
    report.season_players =
        delete_in(store, RegularSeasonPlayer::TABLE, "season_id", &season_ids).await?;
    report.seasons = delete_in(store, RegularSeason::TABLE, "id", &season_ids).await?;

    store
        .delete(Team::TABLE, &Query::new().eq("id", team_id))
        .await
        .with_context(|| format!("Dependents removed but team {} could not be deleted", team_id))?;

    info!(
        team_id = %team_id,
        name = %team.name,
        dependents = report.total(),
        "Deleted team"
    );
    Ok(report)
}

/// Upload a logo image and point the team at it
pub async fn upload_team_logo<S: Store + ObjectStore>(
    store: &S,
    team_id: Uuid,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<Team> {
    storage::check_image(content_type, bytes.len())?;
    let path = storage::object_path("teams", team_id, content_type)
        .ok_or_else(|| ValidationError::new("file", "unsupported image type"))?;
    let url = store.upload_object(MEDIA_BUCKET, &path, bytes, content_type).await?;

    let mut rows: Vec<Team> = store
        .update(&Query::new().eq("id", team_id), json!({ "logo_url": url }))
        .await
        .context("Failed to save team logo")?;
    rows.pop().ok_or_else(|| anyhow!("Team not found: {}", team_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        GameStatus, NewGame, NewPlayerEvaluation, NewEvaluationScore, NewRegularSeason,
        NewRegularSeasonPlayer, RegistrationStatus, SeasonPlayerStatus, SeasonStatus,
    };
    use crate::services::fixtures::{self, date};
    use crate::store::MemoryStore;
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_and_update_team() {
        let store = MemoryStore::new();
        let coach = Uuid::new_v4();
        let team = create_team(
            &store,
            NewTeam {
                coach_id: coach,
                name: "  Wolves ".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(team.name, "Wolves");

        let updated = update_team(
            &store,
            team.id,
            NewTeam {
                coach_id: Uuid::new_v4(),
                name: "Timber Wolves".to_string(),
                level: Some("AAA".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Timber Wolves");
        assert_eq!(updated.coach_id, coach);

        let invalid = create_team(&store, NewTeam { coach_id: coach, ..Default::default() }).await;
        assert!(invalid.is_err());
        assert_eq!(teams_for_coach(&store, coach).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_team_cascade() {
        let store = MemoryStore::new();
        let coach = Uuid::new_v4();
        let team = fixtures::team(&store, coach, "Wolves").await;
        let other = fixtures::team(&store, coach, "Bears").await;
        let player = fixtures::player(&store, coach, "Ada", "Ames").await;

        let tryout = fixtures::tryout(&store, team.id, None).await;
        let kept_tryout = fixtures::tryout(&store, other.id, None).await;
        fixtures::registration(&store, tryout.id, player.id, RegistrationStatus::Confirmed, None).await;
        fixtures::registration(&store, kept_tryout.id, player.id, RegistrationStatus::Pending, None).await;

        let season: RegularSeason = insert_one(
            &store,
            &NewRegularSeason {
                team_id: team.id,
                tryout_id: Some(tryout.id),
                name: "Wolves 2025 Season".to_string(),
                start_date: date(2025, 10, 1),
                end_date: None,
                status: SeasonStatus::Active,
            },
        )
        .await
        .unwrap();
        let _: RegularSeasonPlayer = insert_one(
            &store,
            &NewRegularSeasonPlayer {
                season_id: season.id,
                player_id: player.id,
                status: SeasonPlayerStatus::Active,
                jersey_number: None,
                position: None,
            },
        )
        .await
        .unwrap();
        let _: Game = insert_one(
            &store,
            &NewGame {
                season_id: season.id,
                opponent: "Flyers".to_string(),
                game_date: Utc::now(),
                location: None,
                is_home: true,
                status: GameStatus::Scheduled,
            },
        )
        .await
        .unwrap();
        for (tryout_id, season_id) in [(Some(tryout.id), None), (None, Some(season.id))] {
            let evaluation: PlayerEvaluation = insert_one(
                &store,
                &NewPlayerEvaluation {
                    player_id: player.id,
                    evaluator_id: coach,
                    tryout_id,
                    season_id,
                    overall_score: Some(7.5),
                    notes: None,
                },
            )
            .await
            .unwrap();
            let _: EvaluationScore = insert_one(
                &store,
                &NewEvaluationScore {
                    evaluation_id: evaluation.id,
                    criteria_id: Uuid::new_v4(),
                    score: 7,
                    notes: None,
                },
            )
            .await
            .unwrap();
        }

        let report = delete_team(&store, team.id).await.unwrap();
        assert_eq!(
            report,
            CascadeReport {
                evaluation_scores: 2,
                evaluations: 2,
                registrations: 1,
                tryouts: 1,
                games: 1,
                season_players: 1,
                seasons: 1,
            }
        );
        assert_eq!(report.total(), 9);

        assert!(get_team(&store, team.id).await.is_err());
        assert_eq!(store.count(Team::TABLE), 1);
        assert_eq!(store.count(Tryout::TABLE), 1);
        assert_eq!(store.count(TryoutRegistration::TABLE), 1);
        assert_eq!(store.count(RegularSeason::TABLE), 0);
        assert_eq!(store.count(RegularSeasonPlayer::TABLE), 0);
        assert_eq!(store.count(Game::TABLE), 0);
        assert_eq!(store.count(PlayerEvaluation::TABLE), 0);
        assert_eq!(store.count(EvaluationScore::TABLE), 0);
    }

    #[tokio::test]
    async fn test_delete_team_without_dependents() {
        let store = MemoryStore::new();
        let team = fixtures::team(&store, Uuid::new_v4(), "Wolves").await;
        let report = delete_team(&store, team.id).await.unwrap();
        assert_eq!(report, CascadeReport::default());
        assert_eq!(store.count(Team::TABLE), 0);
        assert!(delete_team(&store, team.id).await.is_err());
    }

    #[tokio::test]
    async fn test_upload_team_logo() {
        let store = MemoryStore::new();
        let team = fixtures::team(&store, Uuid::new_v4(), "Wolves").await;
        let updated = upload_team_logo(&store, team.id, vec![0x89, 0x50], "image/png")
            .await
            .unwrap();
        let url = updated.logo_url.unwrap();
        assert!(url.starts_with("memory://media/teams/"));
        assert!(url.ends_with(".png"));

        let rejected = upload_team_logo(&store, team.id, vec![1, 2, 3], "image/tiff").await;
        assert!(rejected.is_err());
    }
}
