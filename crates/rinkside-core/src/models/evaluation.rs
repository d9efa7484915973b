use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

/// A scored skill, e.g. "Skating" out of 10.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EvaluationCriteria {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub max_score: i32,
    pub weight: f64,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for EvaluationCriteria {
    const TABLE: &'static str = "evaluation_criteria";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvaluationCriteria {
    pub coach_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub max_score: i32,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PlayerEvaluation {
    pub id: Uuid,
    pub player_id: Uuid,
    pub evaluator_id: Uuid,
    pub tryout_id: Option<Uuid>,
    pub season_id: Option<Uuid>,
    /// Weighted score on a 0-10 scale
    pub overall_score: Option<f64>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for PlayerEvaluation {
    const TABLE: &'static str = "player_evaluations";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlayerEvaluation {
    pub player_id: Uuid,
    pub evaluator_id: Uuid,
    pub tryout_id: Option<Uuid>,
    pub season_id: Option<Uuid>,
    pub overall_score: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EvaluationScore {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub criteria_id: Uuid,
    pub score: i32,
    pub notes: Option<String>,
}

impl Record for EvaluationScore {
    const TABLE: &'static str = "evaluation_scores";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvaluationScore {
    pub evaluation_id: Uuid,
    pub criteria_id: Uuid,
    pub score: i32,
    pub notes: Option<String>,
}
