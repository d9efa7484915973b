//! The signed-in coach's profile row.

use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

use crate::models::{Coach, NewCoach};
use crate::store::{insert_one, select_one, Query, Store};
use crate::validation;

/// Capitalize the first letter of each word
fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Profile for a new account, with a name guessed from the email
/// (`jane.doe@club.org` becomes Jane Doe).
pub fn profile_from_email(user_id: Uuid, email: &str) -> NewCoach {
    let email = email.trim().to_lowercase();
    let local = email.split('@').next().unwrap_or_default();
    let mut parts = local
        .split(|c: char| c == '.' || c == '_' || c == '-' || c == '+')
        .filter(|p| !p.is_empty());
    let first_name = parts.next().map(title_case).unwrap_or_else(|| "Coach".to_string());
    let last_name = parts.map(title_case).collect::<Vec<_>>().join(" ");

    NewCoach {
        user_id,
        first_name,
        last_name,
        email,
        phone: None,
        organization: None,
    }
}

/// Coach row for an auth user, if one exists
pub async fn find_coach<S: Store>(store: &S, user_id: Uuid) -> Result<Option<Coach>> {
    select_one(store, Query::new().eq("user_id", user_id))
        .await
        .context("Failed to load coach profile")
}

/// Find the coach row for `profile.user_id`, creating it from `profile`
/// when missing. Returns the row and whether it was created.
pub async fn ensure_coach_profile<S: Store>(store: &S, profile: NewCoach) -> Result<(Coach, bool)> {
    if let Some(coach) = find_coach(store, profile.user_id).await? {
        return Ok((coach, false));
    }
    validation::email("email", &profile.email)?;
    let coach: Coach = insert_one(store, &profile)
        .await
        .context("Failed to create coach profile")?;
    info!(coach_id = %coach.id, "Created coach profile");
    Ok((coach, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_profile_from_email() {
        let user = Uuid::new_v4();
        let p = profile_from_email(user, " JANE.doe@Club.org");
        assert_eq!(p.first_name, "Jane");
        assert_eq!(p.last_name, "Doe");
        assert_eq!(p.email, "jane.doe@club.org");

        let p = profile_from_email(user, "goalie@club.org");
        assert_eq!(p.first_name, "Goalie");
        assert_eq!(p.last_name, "");
    }

    #[tokio::test]
    async fn test_ensure_coach_profile_is_idempotent() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let (coach, created) = ensure_coach_profile(&store, profile_from_email(user, "sam.lee@club.org"))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(coach.full_name(), "Sam Lee");

        let (again, created) = ensure_coach_profile(&store, profile_from_email(user, "sam.lee@club.org"))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(again.id, coach.id);
        assert_eq!(store.count("coaches"), 1);
    }
}
