//! Off-season camps and their signups.

use anyhow::{Context, Result};
use serde_json::json;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    Camp, CampRegistration, CampStatus, NewCamp, NewCampRegistration, RegistrationStatus,
};
use crate::store::{insert_one, select_one, Query, Store};

use super::tryouts::{summarize_statuses, RegistrationSummary};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CampError {
    #[error("Camp not found: {0}")]
    NotFound(Uuid),

    #[error("Camp is not open for registration")]
    NotOpen,

    #[error("Player is already registered for this camp")]
    AlreadyRegistered,

    #[error("Camp is full ({0} spots)")]
    Full(i32),
}

pub async fn get_camp<S: Store>(store: &S, camp_id: Uuid) -> Result<Camp> {
    select_one(store, Query::new().eq("id", camp_id))
        .await
        .context("Failed to load camp")?
        .ok_or_else(|| CampError::NotFound(camp_id).into())
}

pub async fn camps_for_coach<S: Store>(store: &S, coach_id: Uuid) -> Result<Vec<Camp>> {
    store
        .select(&Query::new().eq("coach_id", coach_id).order_by("start_date", false))
        .await
        .context("Failed to load camps")
}

pub async fn create_camp<S: Store>(store: &S, mut new: NewCamp) -> Result<Camp> {
    new.name = new.name.trim().to_string();
    new.status = CampStatus::Open;
    new.validate()?;
    let camp: Camp = insert_one(store, &new).await.context("Failed to create camp")?;
    info!(camp_id = %camp.id, "Created camp");
    Ok(camp)
}

pub async fn set_camp_status<S: Store>(store: &S, camp_id: Uuid, status: CampStatus) -> Result<Camp> {
    let mut rows: Vec<Camp> = store
        .update(&Query::new().eq("id", camp_id), json!({ "status": status }))
        .await
        .context("Failed to update camp status")?;
    rows.pop().ok_or_else(|| CampError::NotFound(camp_id).into())
}

pub async fn camp_registrations<S: Store>(store: &S, camp_id: Uuid) -> Result<Vec<CampRegistration>> {
    store
        .select(&Query::new().eq("camp_id", camp_id).order_by("created_at", true))
        .await
        .context("Failed to load camp registrations")
}

pub async fn register_for_camp<S: Store>(
    store: &S,
    camp_id: Uuid,
    player_id: Uuid,
    notes: Option<String>,
) -> Result<CampRegistration> {
    let camp = get_camp(store, camp_id).await?;
    if camp.status != CampStatus::Open {
        return Err(CampError::NotOpen.into());
    }

    let existing = camp_registrations(store, camp_id).await?;
    let active: Vec<&CampRegistration> =
        existing.iter().filter(|r| !r.status.is_cancelled()).collect();
    if active.iter().any(|r| r.player_id == player_id) {
        return Err(CampError::AlreadyRegistered.into());
    }
    if let Some(capacity) = camp.capacity {
        if active.len() >= capacity.max(0) as usize {
            return Err(CampError::Full(capacity).into());
        }
    }

    let new = NewCampRegistration {
        camp_id,
        player_id,
        status: RegistrationStatus::Pending,
        notes,
    };
    insert_one(store, &new).await.context("Failed to register for camp")
}

/// Registration counts for a camp, by status
pub async fn camp_summary<S: Store>(store: &S, camp_id: Uuid) -> Result<RegistrationSummary> {
    let registrations = camp_registrations(store, camp_id).await?;
    Ok(summarize_statuses(registrations.iter().map(|r| r.status)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::date;
    use crate::store::MemoryStore;

    async fn camp(store: &MemoryStore, capacity: Option<i32>) -> Camp {
        create_camp(
            store,
            NewCamp {
                coach_id: Uuid::new_v4(),
                name: "Summer Skills".to_string(),
                description: None,
                location: None,
                start_date: date(2025, 7, 7),
                end_date: Some(date(2025, 7, 11)),
                capacity,
                price: Some(250.0),
                status: CampStatus::Closed,
            },
        )
        .await
        .unwrap()
    }

    fn camp_error(err: &anyhow::Error) -> Option<&CampError> {
        err.downcast_ref::<CampError>()
    }

    #[tokio::test]
    async fn test_create_camp_validation() {
        let store = MemoryStore::new();
        let created = camp(&store, Some(2)).await;
        assert_eq!(created.status, CampStatus::Open);

        let invalid = create_camp(
            &store,
            NewCamp {
                coach_id: Uuid::new_v4(),
                name: "Bad".to_string(),
                description: None,
                location: None,
                start_date: date(2025, 7, 7),
                end_date: None,
                capacity: Some(0),
                price: Some(-5.0),
                status: CampStatus::Open,
            },
        )
        .await;
        assert!(invalid.is_err());
    }

    #[tokio::test]
    async fn test_register_capacity_and_duplicates() {
        let store = MemoryStore::new();
        let camp = camp(&store, Some(2)).await;
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let reg_a = register_for_camp(&store, camp.id, a, None).await.unwrap();
        let err = register_for_camp(&store, camp.id, a, None).await.unwrap_err();
        assert_eq!(camp_error(&err), Some(&CampError::AlreadyRegistered));

        register_for_camp(&store, camp.id, b, None).await.unwrap();
        let err = register_for_camp(&store, camp.id, c, None).await.unwrap_err();
        assert_eq!(camp_error(&err), Some(&CampError::Full(2)));

        store
            .update::<CampRegistration>(
                &Query::new().eq("id", reg_a.id),
                json!({ "status": RegistrationStatus::Cancelled }),
            )
            .await
            .unwrap();
        register_for_camp(&store, camp.id, c, None).await.unwrap();

        let summary = camp_summary(&store, camp.id).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.cancelled, 1);

        set_camp_status(&store, camp.id, CampStatus::Closed).await.unwrap();
        let err = register_for_camp(&store, camp.id, Uuid::new_v4(), None).await.unwrap_err();
        assert_eq!(camp_error(&err), Some(&CampError::NotOpen));
    }
}
