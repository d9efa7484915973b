use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;
use crate::validation::{self, ValidationErrors};

use super::player::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum SeasonStatus {
    Active,
    Completed,
}

impl std::fmt::Display for SeasonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeasonStatus::Active => write!(f, "Active"),
            SeasonStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// Availability of a rostered player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum SeasonPlayerStatus {
    Active,
    Injured,
    Suspended,
}

impl SeasonPlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonPlayerStatus::Active => "active",
            SeasonPlayerStatus::Injured => "injured",
            SeasonPlayerStatus::Suspended => "suspended",
        }
    }

    /// Next status when cycling in the UI
    pub fn next(&self) -> Self {
        match self {
            SeasonPlayerStatus::Active => SeasonPlayerStatus::Injured,
            SeasonPlayerStatus::Injured => SeasonPlayerStatus::Suspended,
            SeasonPlayerStatus::Suspended => SeasonPlayerStatus::Active,
        }
    }
}

impl std::fmt::Display for SeasonPlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeasonPlayerStatus::Active => write!(f, "Active"),
            SeasonPlayerStatus::Injured => write!(f, "Injured"),
            SeasonPlayerStatus::Suspended => write!(f, "Suspended"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RegularSeason {
    pub id: Uuid,
    pub team_id: Uuid,
    /// Tryout this season was created from, if any
    pub tryout_id: Option<Uuid>,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: SeasonStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for RegularSeason {
    const TABLE: &'static str = "regular_seasons";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegularSeason {
    pub team_id: Uuid,
    pub tryout_id: Option<Uuid>,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: SeasonStatus,
}

impl NewRegularSeason {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validation::name("name", &self.name));
        errors.check(validation::date_range("end_date", self.start_date, self.end_date));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RegularSeasonPlayer {
    pub id: Uuid,
    pub season_id: Uuid,
    pub player_id: Uuid,
    pub status: SeasonPlayerStatus,
    pub jersey_number: Option<i32>,
    pub position: Option<Position>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for RegularSeasonPlayer {
    const TABLE: &'static str = "regular_season_players";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegularSeasonPlayer {
    pub season_id: Uuid,
    pub player_id: Uuid,
    pub status: SeasonPlayerStatus,
    pub jersey_number: Option<i32>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Game {
    pub id: Uuid,
    pub season_id: Uuid,
    pub opponent: String,
    pub game_date: DateTime<Utc>,
    pub location: Option<String>,
    pub is_home: bool,
    pub team_score: Option<i32>,
    pub opponent_score: Option<i32>,
    pub status: GameStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Game {
    const TABLE: &'static str = "games";
}

impl Game {
    /// "W 4-2", "L 1-3", "T 2-2"; `None` until a final score exists
    pub fn result_display(&self) -> Option<String> {
        if self.status != GameStatus::Completed {
            return None;
        }
        let (us, them) = (self.team_score?, self.opponent_score?);
        let letter = match us.cmp(&them) {
            std::cmp::Ordering::Greater => "W",
            std::cmp::Ordering::Less => "L",
            std::cmp::Ordering::Equal => "T",
        };
        Some(format!("{} {}-{}", letter, us, them))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGame {
    pub season_id: Uuid,
    pub opponent: String,
    pub game_date: DateTime<Utc>,
    pub location: Option<String>,
    pub is_home: bool,
    pub status: GameStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_result_display() {
        let mut game = Game {
            id: Uuid::nil(),
            season_id: Uuid::nil(),
            opponent: "Flyers".to_string(),
            game_date: Utc::now(),
            location: None,
            is_home: true,
            team_score: Some(4),
            opponent_score: Some(2),
            status: GameStatus::Scheduled,
            created_at: None,
        };
        assert_eq!(game.result_display(), None);
        game.status = GameStatus::Completed;
        assert_eq!(game.result_display().as_deref(), Some("W 4-2"));
        game.team_score = Some(2);
        assert_eq!(game.result_display().as_deref(), Some("T 2-2"));
    }

    #[test]
    fn test_season_player_status_cycle() {
        let s = SeasonPlayerStatus::Active;
        assert_eq!(s.next(), SeasonPlayerStatus::Injured);
        assert_eq!(s.next().next().next(), SeasonPlayerStatus::Active);
        assert_eq!(serde_json::to_string(&SeasonPlayerStatus::Suspended).unwrap(), "\"suspended\"");
    }
}
