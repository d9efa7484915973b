use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

/// Who is signing up for early access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum WaitingListRole {
    Coach,
    Player,
    Parent,
    Organization,
}

impl WaitingListRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coach" => Some(WaitingListRole::Coach),
            "player" => Some(WaitingListRole::Player),
            "parent" => Some(WaitingListRole::Parent),
            "organization" | "organisation" | "org" => Some(WaitingListRole::Organization),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct WaitingListEntry {
    pub id: Uuid,
    pub email: String,
    pub role: WaitingListRole,
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for WaitingListEntry {
    const TABLE: &'static str = "waiting_list";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWaitingListEntry {
    pub email: String,
    pub role: WaitingListRole,
}
