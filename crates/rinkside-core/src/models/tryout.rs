use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;
use crate::validation::{self, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum TryoutStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

impl TryoutStatus {
    /// Completed and cancelled tryouts accept no further changes.
    pub fn is_closed(&self) -> bool {
        matches!(self, TryoutStatus::Completed | TryoutStatus::Cancelled)
    }
}

impl std::fmt::Display for TryoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TryoutStatus::Upcoming => write!(f, "Upcoming"),
            TryoutStatus::Active => write!(f, "Active"),
            TryoutStatus::Completed => write!(f, "Completed"),
            TryoutStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Status of a player's registration for a tryout or camp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RegistrationStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }

    /// Next status when cycling in the UI
    pub fn next(&self) -> Self {
        match self {
            RegistrationStatus::Pending => RegistrationStatus::Confirmed,
            RegistrationStatus::Confirmed => RegistrationStatus::Cancelled,
            RegistrationStatus::Cancelled => RegistrationStatus::Pending,
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Pending => write!(f, "Pending"),
            RegistrationStatus::Confirmed => write!(f, "Confirmed"),
            RegistrationStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Tryout {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub max_players: Option<i32>,
    pub status: TryoutStatus,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Tryout {
    const TABLE: &'static str = "tryouts";
}

impl Tryout {
    /// "Sep 06 - Sep 08, 2025" or a single date
    pub fn date_range_display(&self) -> String {
        match self.end_date {
            Some(end) if end != self.start_date => format!(
                "{} - {}",
                self.start_date.format("%b %d"),
                end.format("%b %d, %Y")
            ),
            _ => self.start_date.format("%b %d, %Y").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTryout {
    pub team_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub max_players: Option<i32>,
    pub status: TryoutStatus,
    pub description: Option<String>,
}

impl NewTryout {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validation::name("name", &self.name));
        errors.check(validation::date_range("end_date", self.start_date, self.end_date));
        if let Some(max) = self.max_players {
            errors.check(validation::positive("max_players", max as i64));
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TryoutRegistration {
    pub id: Uuid,
    pub tryout_id: Uuid,
    pub player_id: Uuid,
    pub status: RegistrationStatus,
    /// Pinnie number worn during the tryout
    pub jersey_number: Option<i32>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for TryoutRegistration {
    const TABLE: &'static str = "tryout_registrations";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTryoutRegistration {
    pub tryout_id: Uuid,
    pub player_id: Uuid,
    pub status: RegistrationStatus,
    pub jersey_number: Option<i32>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&TryoutStatus::Completed).unwrap(), "\"completed\"");
        let s: RegistrationStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert!(s.is_cancelled());
        assert!(serde_json::from_str::<RegistrationStatus>("\"kept\"").is_err());
    }

    #[test]
    fn test_new_tryout_validation() {
        let tryout = NewTryout {
            team_id: Uuid::nil(),
            name: "Fall Evaluations".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 6).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 9, 5),
            location: None,
            max_players: Some(0),
            status: TryoutStatus::Upcoming,
            description: None,
        };
        let errors = tryout.validate().unwrap_err();
        let fields: Vec<&str> = errors.0.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["end_date", "max_players"]);
    }

    #[test]
    fn test_date_range_display() {
        let mut tryout = Tryout {
            id: Uuid::nil(),
            team_id: Uuid::nil(),
            name: "Spring".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 6).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 9, 8),
            location: None,
            max_players: None,
            status: TryoutStatus::Upcoming,
            description: None,
            created_at: None,
        };
        assert_eq!(tryout.date_range_display(), "Sep 06 - Sep 08, 2025");
        tryout.end_date = None;
        assert_eq!(tryout.date_range_display(), "Sep 06, 2025");
    }
}
