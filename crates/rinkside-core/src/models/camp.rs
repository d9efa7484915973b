use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;
use crate::validation::{self, ValidationError, ValidationErrors};

use super::tryout::RegistrationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum CampStatus {
    Open,
    Closed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Camp {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub capacity: Option<i32>,
    pub price: Option<f64>,
    pub status: CampStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Camp {
    const TABLE: &'static str = "camps";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCamp {
    pub coach_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub capacity: Option<i32>,
    pub price: Option<f64>,
    pub status: CampStatus,
}

impl NewCamp {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(validation::name("name", &self.name));
        errors.check(validation::date_range("end_date", self.start_date, self.end_date));
        if let Some(capacity) = self.capacity {
            errors.check(validation::positive("capacity", capacity as i64));
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                errors.check(Err(ValidationError::new("price", "must not be negative")));
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CampRegistration {
    pub id: Uuid,
    pub camp_id: Uuid,
    pub player_id: Uuid,
    pub status: RegistrationStatus,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for CampRegistration {
    const TABLE: &'static str = "camp_registrations";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampRegistration {
    pub camp_id: Uuid,
    pub player_id: Uuid,
    pub status: RegistrationStatus,
    pub notes: Option<String>,
}
