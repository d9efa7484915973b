//! Pre-launch waiting list.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::models::{NewWaitingListEntry, WaitingListEntry, WaitingListRole};
use crate::store::{insert_one, select_one, Query, Store};
use crate::validation::{self, ValidationError};

/// Signup counts by role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WaitingListStats {
    pub total: usize,
    pub coaches: usize,
    pub players: usize,
    pub parents: usize,
    pub organizations: usize,
}

impl WaitingListStats {
    pub fn from_entries(entries: &[WaitingListEntry]) -> Self {
        let mut stats = Self {
            total: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            match entry.role {
                WaitingListRole::Coach => stats.coaches += 1,
                WaitingListRole::Player => stats.players += 1,
                WaitingListRole::Parent => stats.parents += 1,
                WaitingListRole::Organization => stats.organizations += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupOutcome {
    pub already_registered: bool,
    pub stats: WaitingListStats,
}

/// Parse a role name from a signup form
pub fn parse_role(role: &str) -> Result<WaitingListRole, ValidationError> {
    WaitingListRole::parse(role).ok_or_else(|| {
        ValidationError::new("role", "must be one of coach, player, parent, organization")
    })
}

pub async fn waiting_list_stats<S: Store>(store: &S) -> Result<WaitingListStats> {
    let entries: Vec<WaitingListEntry> = store
        .select(&Query::new())
        .await
        .context("Failed to load waiting list")?;
    Ok(WaitingListStats::from_entries(&entries))
}

/// Add an email to the waiting list. Signing up twice is not an error;
/// the second attempt reports `already_registered`.
pub async fn join_waiting_list<S: Store>(
    store: &S,
    email: &str,
    role: WaitingListRole,
) -> Result<SignupOutcome> {
    let email = email.trim().to_lowercase();
    validation::email("email", &email)?;

    let existing: Option<WaitingListEntry> = select_one(store, Query::new().eq("email", &email))
        .await
        .context("Failed to check waiting list")?;
    let already_registered = existing.is_some();
    if !already_registered {
        let _: WaitingListEntry = insert_one(store, &NewWaitingListEntry { email, role })
            .await
            .context("Failed to join waiting list")?;
        info!(role = ?role, "Waiting list signup");
    }

    Ok(SignupOutcome {
        already_registered,
        stats: waiting_list_stats(store).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role(" Coach ").unwrap(), WaitingListRole::Coach);
        assert_eq!(parse_role("org").unwrap(), WaitingListRole::Organization);
        assert_eq!(parse_role("referee").unwrap_err().field, "role");
    }

    #[tokio::test]
    async fn test_join_normalizes_and_dedupes() {
        let store = MemoryStore::new();
        let first = join_waiting_list(&store, "  Coach@Rinkside.App ", WaitingListRole::Coach)
            .await
            .unwrap();
        assert!(!first.already_registered);
        assert_eq!(first.stats.total, 1);

        let again = join_waiting_list(&store, "coach@rinkside.app", WaitingListRole::Parent)
            .await
            .unwrap();
        assert!(again.already_registered);
        assert_eq!(again.stats, WaitingListStats { total: 1, coaches: 1, ..Default::default() });

        join_waiting_list(&store, "kid@rinkside.app", WaitingListRole::Player).await.unwrap();
        let stats = waiting_list_stats(&store).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.players, 1);
    }

    #[tokio::test]
    async fn test_join_rejects_bad_email() {
        let store = MemoryStore::new();
        let err = join_waiting_list(&store, "not-an-email", WaitingListRole::Coach)
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ValidationError>().unwrap().field, "email");
        assert_eq!(store.count("waiting_list"), 0);
    }
}
