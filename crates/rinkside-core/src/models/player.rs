use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;
use crate::validation::{self, ValidationErrors};

/// On-ice position.
/// Generic `Forward`/`Defense` cover rosters that don't track sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Center,
    LeftWing,
    RightWing,
    Forward,
    Defense,
    LeftDefense,
    RightDefense,
    Goalie,
}

impl Position {
    /// Parse free-form input: abbreviations ("LW", "D", "G") or names.
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "c" | "center" | "centre" => Some(Position::Center),
            "lw" | "leftwing" | "leftwinger" => Some(Position::LeftWing),
            "rw" | "rightwing" | "rightwinger" => Some(Position::RightWing),
            "f" | "fwd" | "forward" | "wing" | "winger" => Some(Position::Forward),
            "d" | "def" | "defense" | "defence" | "defenseman" | "defenceman" => {
                Some(Position::Defense)
            }
            "ld" | "leftdefense" | "leftdefence" => Some(Position::LeftDefense),
            "rd" | "rightdefense" | "rightdefence" => Some(Position::RightDefense),
            "g" | "goalie" | "goaltender" | "goalkeeper" | "goal" => Some(Position::Goalie),
            _ => None,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Position::Center => "C",
            Position::LeftWing => "LW",
            Position::RightWing => "RW",
            Position::Forward => "F",
            Position::Defense => "D",
            Position::LeftDefense => "LD",
            Position::RightDefense => "RD",
            Position::Goalie => "G",
        }
    }

    pub fn is_goalie(&self) -> bool {
        matches!(self, Position::Goalie)
    }

    pub fn is_defense(&self) -> bool {
        matches!(
            self,
            Position::Defense | Position::LeftDefense | Position::RightDefense
        )
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Center => write!(f, "Center"),
            Position::LeftWing => write!(f, "Left Wing"),
            Position::RightWing => write!(f, "Right Wing"),
            Position::Forward => write!(f, "Forward"),
            Position::Defense => write!(f, "Defense"),
            Position::LeftDefense => write!(f, "Left Defense"),
            Position::RightDefense => write!(f, "Right Defense"),
            Position::Goalie => write!(f, "Goalie"),
        }
    }
}

/// Which way a skater shoots (or a goalie catches).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "left" | "lefty" => Some(Handedness::Left),
            "r" | "right" | "righty" => Some(Handedness::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Player {
    pub id: Uuid,
    /// Coach who created the profile
    pub coach_id: Option<Uuid>,
    /// Auth user when the player has their own account (feed access)
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub position: Option<Position>,
    pub jersey_number: Option<i32>,
    pub shoots: Option<Handedness>,
    pub parent_name: Option<String>,
    pub parent_email: Option<String>,
    pub parent_phone: Option<String>,
    pub notes: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Player {
    const TABLE: &'static str = "players";
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// "Last, First" for sorted lists
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }

    /// Age in whole years as of `today`.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        self.date_of_birth.map(|dob| {
            let mut age = today.year() - dob.year();
            if (today.month(), today.day()) < (dob.month(), dob.day()) {
                age -= 1;
            }
            age
        })
    }

    pub fn age(&self) -> Option<i32> {
        self.age_on(Utc::now().date_naive())
    }

    /// Email used for duplicate detection, normalized
    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }

    pub fn position_display(&self) -> String {
        self.position
            .map(|p| p.abbreviation().to_string())
            .unwrap_or_else(|| "-".to_string())
    }

    pub fn jersey_display(&self) -> String {
        self.jersey_number
            .map(|n| format!("#{}", n))
            .unwrap_or_else(|| "-".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub coach_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub position: Option<Position>,
    pub jersey_number: Option<i32>,
    pub shoots: Option<Handedness>,
    pub parent_name: Option<String>,
    pub parent_email: Option<String>,
    pub parent_phone: Option<String>,
    pub notes: Option<String>,
}

impl NewPlayer {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validation::name("first_name", &self.first_name));
        errors.check(validation::name("last_name", &self.last_name));
        errors.check(validation::optional_email("email", self.email.as_deref()));
        errors.check(validation::optional_email("parent_email", self.parent_email.as_deref()));
        errors.check(validation::optional_phone("phone", self.phone.as_deref()));
        errors.check(validation::optional_phone("parent_phone", self.parent_phone.as_deref()));
        if let Some(n) = self.jersey_number {
            errors.check(validation::jersey_number("jersey_number", n));
        }
        if let Some(dob) = self.date_of_birth {
            if dob > Utc::now().date_naive() {
                errors.check(Err(validation::ValidationError::new(
                    "date_of_birth",
                    "must not be in the future",
                )));
            }
        }
        errors.into_result()
    }

    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }
}

/// Sortable columns on the players list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSortColumn {
    Name,
    Position,
    Jersey,
    Age,
}

impl PlayerSortColumn {
    pub fn next(&self) -> Self {
        match self {
            PlayerSortColumn::Name => PlayerSortColumn::Position,
            PlayerSortColumn::Position => PlayerSortColumn::Jersey,
            PlayerSortColumn::Jersey => PlayerSortColumn::Age,
            PlayerSortColumn::Age => PlayerSortColumn::Name,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlayerSortColumn::Name => "Name",
            PlayerSortColumn::Position => "Pos",
            PlayerSortColumn::Jersey => "#",
            PlayerSortColumn::Age => "Age",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(dob: Option<NaiveDate>) -> Player {
        Player {
            id: Uuid::nil(),
            coach_id: None,
            user_id: None,
            first_name: "Cale".to_string(),
            last_name: "Makar".to_string(),
            email: Some(" Cale@Example.COM ".to_string()),
            phone: None,
            date_of_birth: dob,
            position: Some(Position::Defense),
            jersey_number: Some(8),
            shoots: Some(Handedness::Right),
            parent_name: None,
            parent_email: None,
            parent_phone: None,
            notes: None,
            avatar_url: None,
            created_at: None,
        }
    }

    #[test]
    fn test_position_parse() {
        assert_eq!(Position::parse("LW"), Some(Position::LeftWing));
        assert_eq!(Position::parse("l.w."), Some(Position::LeftWing));
        assert_eq!(Position::parse("Defence"), Some(Position::Defense));
        assert_eq!(Position::parse("G"), Some(Position::Goalie));
        assert_eq!(Position::parse("right wing"), Some(Position::RightWing));
        assert_eq!(Position::parse("zamboni"), None);
    }

    #[test]
    fn test_position_serde() {
        let json = serde_json::to_string(&Position::LeftDefense).unwrap();
        assert_eq!(json, "\"left_defense\"");
        let parsed: Position = serde_json::from_str("\"goalie\"").unwrap();
        assert!(parsed.is_goalie());
    }

    #[test]
    fn test_age_on_birthday_boundary() {
        let p = player(NaiveDate::from_ymd_opt(2012, 6, 15));
        let day_before = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(p.age_on(day_before), Some(11));
        assert_eq!(p.age_on(birthday), Some(12));
        assert_eq!(player(None).age_on(birthday), None);
    }

    #[test]
    fn test_display_helpers() {
        let p = player(None);
        assert_eq!(p.display_name(), "Makar, Cale");
        assert_eq!(p.normalized_email().as_deref(), Some("cale@example.com"));
        assert_eq!(p.position_display(), "D");
        assert_eq!(p.jersey_display(), "#8");
    }

    #[test]
    fn test_new_player_validation() {
        let mut new = NewPlayer {
            first_name: "Quinn".to_string(),
            last_name: "Hughes".to_string(),
            jersey_number: Some(43),
            email: Some("quinn@example.com".to_string()),
            ..Default::default()
        };
        assert!(new.validate().is_ok());

        new.jersey_number = Some(143);
        new.parent_email = Some("not-an-email".to_string());
        let errors = new.validate().unwrap_err();
        let fields: Vec<&str> = errors.0.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["parent_email", "jersey_number"]);
    }
}
