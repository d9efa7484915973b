//! Seed rows for workflow tests.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    NewPlayer, NewTeam, NewTryout, NewTryoutRegistration, Player, RegistrationStatus, Team,
    Tryout, TryoutRegistration, TryoutStatus,
};
use crate::store::{insert_one, MemoryStore};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn team(store: &MemoryStore, coach_id: Uuid, name: &str) -> Team {
    let new = NewTeam {
        coach_id,
        name: name.to_string(),
        age_group: Some("U12".to_string()),
        ..Default::default()
    };
    insert_one(store, &new).await.unwrap()
}

pub async fn player(store: &MemoryStore, coach_id: Uuid, first: &str, last: &str) -> Player {
    let new = NewPlayer {
        coach_id: Some(coach_id),
        first_name: first.to_string(),
        last_name: last.to_string(),
        ..Default::default()
    };
    insert_one(store, &new).await.unwrap()
}

pub async fn tryout(store: &MemoryStore, team_id: Uuid, max_players: Option<i32>) -> Tryout {
    let new = NewTryout {
        team_id,
        name: "Fall Tryouts".to_string(),
        start_date: date(2025, 9, 6),
        end_date: Some(date(2025, 9, 8)),
        location: Some("Rink 2".to_string()),
        max_players,
        status: TryoutStatus::Upcoming,
        description: None,
    };
    insert_one(store, &new).await.unwrap()
}

pub async fn registration(
    store: &MemoryStore,
    tryout_id: Uuid,
    player_id: Uuid,
    status: RegistrationStatus,
    jersey_number: Option<i32>,
) -> TryoutRegistration {
    let new = NewTryoutRegistration {
        tryout_id,
        player_id,
        status,
        jersey_number,
        notes: None,
    };
    insert_one(store, &new).await.unwrap()
}
