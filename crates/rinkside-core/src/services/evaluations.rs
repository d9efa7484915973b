//! Player evaluations against a coach's weighted criteria.
//!
//! Each score is normalized to a 0-10 scale (`score / max_score * 10`); the
//! overall score is the weight-averaged normalized score.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    EvaluationCriteria, EvaluationScore, NewEvaluationCriteria, NewEvaluationScore,
    NewPlayerEvaluation, PlayerEvaluation,
};
use crate::store::{insert_one, Query, Record, Store};
use crate::validation::{self, ValidationError, ValidationErrors};

use super::tryouts;

/// Largest `max_score` a criterion may use
pub const MAX_CRITERIA_SCORE: i32 = 100;

/// One criterion's score in an evaluation form
#[derive(Debug, Clone)]
pub struct ScoreInput {
    pub criteria_id: Uuid,
    pub score: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EvaluationDraft {
    pub player_id: Uuid,
    pub evaluator_id: Uuid,
    pub tryout_id: Option<Uuid>,
    pub season_id: Option<Uuid>,
    pub notes: Option<String>,
    pub scores: Vec<ScoreInput>,
}

/// A player's place in a tryout ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    pub player_id: Uuid,
    /// Mean overall score across evaluations, `None` if never evaluated
    pub average: Option<f64>,
    pub evaluations: usize,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weighted mean of normalized scores, rounded to two decimals.
/// `None` when no score has positive weight.
pub fn overall_score(
    scores: &[ScoreInput],
    criteria: &HashMap<Uuid, EvaluationCriteria>,
) -> Option<f64> {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for input in scores {
        let Some(c) = criteria.get(&input.criteria_id) else {
            continue;
        };
        if c.max_score <= 0 || c.weight <= 0.0 {
            continue;
        }
        weighted += input.score as f64 / c.max_score as f64 * 10.0 * c.weight;
        total_weight += c.weight;
    }
    if total_weight == 0.0 {
        None
    } else {
        Some(round2(weighted / total_weight))
    }
}

pub async fn criteria_for_coach<S: Store>(store: &S, coach_id: Uuid) -> Result<Vec<EvaluationCriteria>> {
    store
        .select(&Query::new().eq("coach_id", coach_id).order_by("name", true))
        .await
        .context("Failed to load evaluation criteria")
}

pub async fn create_criteria<S: Store>(
    store: &S,
    mut new: NewEvaluationCriteria,
) -> Result<EvaluationCriteria> {
    new.name = new.name.trim().to_string();
    let mut errors = ValidationErrors::new();
    errors.check(validation::name("name", &new.name));
    if !(1..=MAX_CRITERIA_SCORE).contains(&new.max_score) {
        errors.check(Err(ValidationError::new(
            "max_score",
            format!("must be between 1 and {}", MAX_CRITERIA_SCORE),
        )));
    }
    if !new.weight.is_finite() || new.weight <= 0.0 {
        errors.check(Err(ValidationError::new("weight", "must be greater than zero")));
    }
    errors.into_result()?;
    insert_one(store, &new).await.context("Failed to create criteria")
}

fn validate_scores(
    draft: &EvaluationDraft,
    criteria: &HashMap<Uuid, EvaluationCriteria>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if draft.scores.is_empty() {
        errors.check(Err(ValidationError::new("scores", "at least one score is required")));
    }
    let mut seen = HashSet::new();
    for input in &draft.scores {
        let field = format!("score[{}]", input.criteria_id);
        if !seen.insert(input.criteria_id) {
            errors.check(Err(ValidationError::new(field, "criteria scored twice")));
            continue;
        }
        match criteria.get(&input.criteria_id) {
            None => errors.check(Err(ValidationError::new(field, "unknown criteria"))),
            Some(c) if input.score < 0 || input.score > c.max_score => {
                errors.check(Err(ValidationError::new(
                    field,
                    format!("{} must be between 0 and {}", c.name, c.max_score),
                )))
            }
            Some(_) => {}
        }
    }
    errors.into_result()
}

/// Save an evaluation and its scores.
///
/// The evaluation row goes in first with the computed overall score; if the
/// score insert fails the evaluation row is deleted again.
pub async fn submit_evaluation<S: Store>(store: &S, draft: EvaluationDraft) -> Result<PlayerEvaluation> {
    let criteria_ids: Vec<Uuid> = draft.scores.iter().map(|s| s.criteria_id).collect();
    let criteria: HashMap<Uuid, EvaluationCriteria> = if criteria_ids.is_empty() {
        HashMap::new()
    } else {
        let rows: Vec<EvaluationCriteria> = store
            .select(&Query::new().is_in("id", criteria_ids))
            .await
            .context("Failed to load evaluation criteria")?;
        rows.into_iter().map(|c| (c.id, c)).collect()
    };
    validate_scores(&draft, &criteria)?;

    let new = NewPlayerEvaluation {
        player_id: draft.player_id,
        evaluator_id: draft.evaluator_id,
        tryout_id: draft.tryout_id,
        season_id: draft.season_id,
        overall_score: overall_score(&draft.scores, &criteria),
        notes: draft.notes.clone(),
    };
    let evaluation: PlayerEvaluation = insert_one(store, &new)
        .await
        .context("Failed to save evaluation")?;

    let scores: Vec<NewEvaluationScore> = draft
        .scores
        .iter()
        .map(|s| NewEvaluationScore {
            evaluation_id: evaluation.id,
            criteria_id: s.criteria_id,
            score: s.score,
            notes: s.notes.clone(),
        })
        .collect();
    if let Err(e) = store.insert::<EvaluationScore, _>(&scores).await {
        warn!(evaluation_id = %evaluation.id, error = %e, "Score insert failed, removing evaluation");
        if let Err(cleanup) = store
            .delete(PlayerEvaluation::TABLE, &Query::new().eq("id", evaluation.id))
            .await
        {
            warn!(evaluation_id = %evaluation.id, error = %cleanup, "Failed to remove orphaned evaluation");
        }
        return Err(e.context("Failed to save evaluation scores"));
    }

    info!(
        evaluation_id = %evaluation.id,
        player_id = %evaluation.player_id,
        overall = ?evaluation.overall_score,
        "Saved evaluation"
    );
    Ok(evaluation)
}

pub async fn evaluations_for_player<S: Store>(store: &S, player_id: Uuid) -> Result<Vec<PlayerEvaluation>> {
    store
        .select(&Query::new().eq("player_id", player_id).order_by("created_at", false))
        .await
        .context("Failed to load evaluations")
}

/// Rank a tryout's non-cancelled registrants by mean overall score.
/// Unevaluated players come last.
pub async fn rank_tryout<S: Store>(store: &S, tryout_id: Uuid) -> Result<Vec<RankedPlayer>> {
    let registrations = tryouts::registrations(store, tryout_id).await?;
    let evaluations: Vec<PlayerEvaluation> = store
        .select(&Query::new().eq("tryout_id", tryout_id))
        .await
        .context("Failed to load tryout evaluations")?;

    let mut ranked: Vec<RankedPlayer> = Vec::new();
    for reg in registrations.iter().filter(|r| !r.status.is_cancelled()) {
        if ranked.iter().any(|r| r.player_id == reg.player_id) {
            continue;
        }
        let scores: Vec<f64> = evaluations
            .iter()
            .filter(|e| e.player_id == reg.player_id)
            .filter_map(|e| e.overall_score)
            .collect();
        let average = if scores.is_empty() {
            None
        } else {
            Some(round2(scores.iter().sum::<f64>() / scores.len() as f64))
        };
        ranked.push(RankedPlayer {
            player_id: reg.player_id,
            average,
            evaluations: scores.len(),
        });
    }

    ranked.sort_by(|a, b| match (a.average, b.average) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegistrationStatus;
    use crate::services::fixtures;
    use crate::store::MemoryStore;

    async fn criteria(store: &MemoryStore, coach: Uuid, name: &str, max: i32, weight: f64) -> EvaluationCriteria {
        create_criteria(
            store,
            NewEvaluationCriteria {
                coach_id: coach,
                name: name.to_string(),
                description: None,
                category: Some("skills".to_string()),
                max_score: max,
                weight,
            },
        )
        .await
        .unwrap()
    }

    fn draft(player_id: Uuid, tryout_id: Option<Uuid>, scores: Vec<(Uuid, i32)>) -> EvaluationDraft {
        EvaluationDraft {
            player_id,
            evaluator_id: Uuid::new_v4(),
            tryout_id,
            season_id: None,
            notes: None,
            scores: scores
                .into_iter()
                .map(|(criteria_id, score)| ScoreInput { criteria_id, score, notes: None })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_create_criteria_validation() {
        let store = MemoryStore::new();
        let bad = create_criteria(
            &store,
            NewEvaluationCriteria {
                coach_id: Uuid::new_v4(),
                name: "Skating".to_string(),
                description: None,
                category: None,
                max_score: 0,
                weight: -1.0,
            },
        )
        .await
        .unwrap_err();
        let errors = bad.downcast_ref::<ValidationErrors>().unwrap();
        let fields: Vec<&str> = errors.0.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["max_score", "weight"]);
    }

    #[tokio::test]
    async fn test_weighted_overall_score() {
        let store = MemoryStore::new();
        let coach = Uuid::new_v4();
        let skating = criteria(&store, coach, "Skating", 10, 2.0).await;
        let shooting = criteria(&store, coach, "Shooting", 5, 1.0).await;
        let player = Uuid::new_v4();

        // (8/10*10*2 + 3/5*10*1) / 3 = (16 + 6) / 3 = 7.33
        let evaluation = submit_evaluation(&store, draft(player, None, vec![(skating.id, 8), (shooting.id, 3)]))
            .await
            .unwrap();
        assert_eq!(evaluation.overall_score, Some(7.33));
        assert_eq!(store.count(EvaluationScore::TABLE), 2);
    }

    #[tokio::test]
    async fn test_submit_evaluation_rejects_bad_scores() {
        let store = MemoryStore::new();
        let skating = criteria(&store, Uuid::new_v4(), "Skating", 10, 1.0).await;
        let player = Uuid::new_v4();

        for scores in [
            vec![],
            vec![(skating.id, 11)],
            vec![(skating.id, 5), (skating.id, 6)],
            vec![(Uuid::new_v4(), 5)],
        ] {
            let result = submit_evaluation(&store, draft(player, None, scores)).await;
            assert!(result.is_err());
        }
        assert_eq!(store.count(PlayerEvaluation::TABLE), 0);
    }

    #[tokio::test]
    async fn test_failed_scores_remove_evaluation() {
        let store = MemoryStore::new();
        let skating = criteria(&store, Uuid::new_v4(), "Skating", 10, 1.0).await;
        store.fail_inserts_into(EvaluationScore::TABLE);
        let result = submit_evaluation(&store, draft(Uuid::new_v4(), None, vec![(skating.id, 7)])).await;
        assert!(result.is_err());
        assert_eq!(store.count(PlayerEvaluation::TABLE), 0);
    }

    #[tokio::test]
    async fn test_rank_tryout() {
        let store = MemoryStore::new();
        let coach = Uuid::new_v4();
        let team = fixtures::team(&store, coach, "Wolves").await;
        let tryout = fixtures::tryout(&store, team.id, None).await;
        let skating = criteria(&store, coach, "Skating", 10, 1.0).await;
        let a = fixtures::player(&store, coach, "Ada", "Ames").await;
        let b = fixtures::player(&store, coach, "Ben", "Boyd").await;
        let c = fixtures::player(&store, coach, "Cy", "Cole").await;
        let d = fixtures::player(&store, coach, "Dee", "Dunn").await;
        for (p, status) in [
            (&a, RegistrationStatus::Confirmed),
            (&b, RegistrationStatus::Pending),
            (&c, RegistrationStatus::Confirmed),
            (&d, RegistrationStatus::Cancelled),
        ] {
            fixtures::registration(&store, tryout.id, p.id, status, None).await;
        }
        submit_evaluation(&store, draft(a.id, Some(tryout.id), vec![(skating.id, 6)])).await.unwrap();
        submit_evaluation(&store, draft(a.id, Some(tryout.id), vec![(skating.id, 8)])).await.unwrap();
        submit_evaluation(&store, draft(b.id, Some(tryout.id), vec![(skating.id, 9)])).await.unwrap();
        submit_evaluation(&store, draft(d.id, Some(tryout.id), vec![(skating.id, 10)])).await.unwrap();

        let ranked = rank_tryout(&store, tryout.id).await.unwrap();
        let order: Vec<Uuid> = ranked.iter().map(|r| r.player_id).collect();
        assert_eq!(order, vec![b.id, a.id, c.id]);
        assert_eq!(ranked[1].average, Some(7.0));
        assert_eq!(ranked[1].evaluations, 2);
        assert_eq!(ranked[2].average, None);
    }
}
