//! Table access abstraction.
//!
//! Every workflow talks to the backend through the `Store` trait so the same
//! code runs against the hosted REST API (`ApiClient`) and, in tests, against
//! the in-process `MemoryStore`.

use std::future::Future;

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

#[cfg(any(test, feature = "memory-store"))]
pub mod memory;
pub mod query;

#[cfg(any(test, feature = "memory-store"))]
pub use memory::MemoryStore;
pub use query::{Filter, Query};

/// A row type backed by a table.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;
}

pub trait Store: Send + Sync {
    /// Fetch rows of `T` matching the query.
    fn select<T: Record>(&self, query: &Query) -> impl Future<Output = Result<Vec<T>>> + Send;

    /// Insert rows into `T::TABLE`, returning the stored representations.
    fn insert<T: Record, N: Serialize + Sync>(
        &self,
        rows: &[N],
    ) -> impl Future<Output = Result<Vec<T>>> + Send;

    /// Apply a JSON patch to every row matching the query.
    fn update<T: Record>(
        &self,
        query: &Query,
        patch: serde_json::Value,
    ) -> impl Future<Output = Result<Vec<T>>> + Send;

    /// Delete matching rows, returning how many were removed.
    fn delete(&self, table: &'static str, query: &Query) -> impl Future<Output = Result<u64>> + Send;
}

/// Binary object storage (images).
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `bucket/path` and return the object's public URL.
    fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn remove_object(&self, bucket: &str, path: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Fetch the first row matching the query, if any.
pub async fn select_one<T: Record, S: Store>(store: &S, query: Query) -> Result<Option<T>> {
    let mut rows: Vec<T> = store.select(&query.limit(1)).await?;
    Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
}

/// Insert a single row and return its stored representation.
pub async fn insert_one<T: Record, N: Serialize + Sync, S: Store>(store: &S, row: &N) -> Result<T> {
    let mut rows: Vec<T> = store.insert(std::slice::from_ref(row)).await?;
    if rows.is_empty() {
        return Err(anyhow::anyhow!("Insert into '{}' returned no row", T::TABLE));
    }
    Ok(rows.swap_remove(0))
}
