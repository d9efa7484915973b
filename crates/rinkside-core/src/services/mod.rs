//! Workflows over the `Store`.
//!
//! Each workflow is a short sequence of awaited store calls with validation
//! up front. There are no transactions; where a later step fails after an
//! earlier insert, the workflow deletes what it created and returns the
//! original error.
//!
//! - `tryouts`: tryout lifecycle and completion into a regular season
//! - `teams`: team CRUD and the deletion cascade
//! - `seasons`: rosters, games and season records
//! - `players`: player CRUD, search and the deletion cascade
//! - `evaluations`: criteria, weighted scoring and tryout rankings
//! - `camps`: camp signups with capacity limits
//! - `feed`: player posts, comments and likes
//! - `waiting_list`: pre-launch signups and statistics
//! - `coach`: the signed-in coach's profile

pub mod camps;
pub mod coach;
pub mod evaluations;
pub mod feed;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod players;
pub mod seasons;
pub mod teams;
pub mod tryouts;
pub mod waiting_list;

use anyhow::Result;
use tracing::debug;
use uuid::Uuid;

use crate::store::{Query, Store};

/// Ids of `rows`, deduplicated, in first-seen order
pub(crate) fn collect_ids<T>(rows: &[T], id: impl Fn(&T) -> Uuid) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = Vec::with_capacity(rows.len());
    for row in rows {
        let value = id(row);
        if !ids.contains(&value) {
            ids.push(value);
        }
    }
    ids
}

/// Delete rows of `table` whose `column` is one of `ids`.
/// An empty id set issues no request.
pub(crate) async fn delete_in<S: Store>(
    store: &S,
    table: &'static str,
    column: &str,
    ids: &[Uuid],
) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let removed = store
        .delete(table, &Query::new().is_in(column, ids.iter().copied()))
        .await?;
    debug!(table = table, count = removed, "Cascade delete");
    Ok(removed)
}
