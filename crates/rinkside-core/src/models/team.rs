use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;
use crate::validation::{self, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Team {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub name: String,
    /// Age bracket such as "U12" or "U15"
    pub age_group: Option<String>,
    /// Competitive tier such as "AAA", "AA" or "House"
    pub level: Option<String>,
    pub season_year: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Team {
    /// "Junior Oilers (U12 AA)"
    pub fn display_name(&self) -> String {
        let bracket: Vec<&str> = [self.age_group.as_deref(), self.level.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if bracket.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, bracket.join(" "))
        }
    }
}

impl Record for Team {
    const TABLE: &'static str = "teams";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTeam {
    pub coach_id: Uuid,
    pub name: String,
    pub age_group: Option<String>,
    pub level: Option<String>,
    pub season_year: Option<String>,
    pub description: Option<String>,
}

impl NewTeam {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validation::name("name", &self.name));
        if let Some(ref desc) = self.description {
            errors.check(validation::max_length("description", desc, 2000));
        }
        errors.into_result()
    }
}
