//! In-process `Store` with the REST API's filter semantics.
//!
//! Rows live as JSON objects per table. Inserts assign `id` and
//! `created_at` when the caller leaves them out, like the backend's column
//! defaults do.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{Filter, ObjectStore, Query, Record, Store};
use crate::api::storage;

/// URL scheme for objects held in memory
const MEMORY_URL_PREFIX: &str = "memory://";

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<&'static str, Vec<Value>>>,
    /// Tables whose inserts should fail, for exercising partial failures
    failing_inserts: Mutex<Vec<&'static str>>,
    /// Uploaded objects keyed by `bucket/path`
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future insert into `table` fail.
    pub fn fail_inserts_into(&self, table: &'static str) {
        if let Ok(mut failing) = self.failing_inserts.lock() {
            failing.push(table);
        }
    }

    /// Number of rows currently stored in a table.
    pub fn count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .map(|t| t.get(table).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Raw rows of a table, for assertions.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .map(|t| t.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Whether an object exists at `bucket/path`.
    pub fn has_object(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .lock()
            .map(|o| o.contains_key(&format!("{}/{}", bucket, path)))
            .unwrap_or(false)
    }

    /// Number of stored objects across all buckets.
    pub fn object_count(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<&'static str, Vec<Value>>>> {
        self.tables
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }

    fn select_values(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let tables = self.lock()?;
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches_all(r, &query.filters)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        if !query.order.is_empty() {
            rows.sort_by(|a, b| {
                for (column, ascending) in &query.order {
                    let ord = compare_values(a.get(column), b.get(column));
                    let ord = if *ascending { ord } else { ord.reverse() };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

fn matches_all(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches(row, f))
}

/// SQL comparison semantics: `neq` and `in` never match a null column.
fn matches(row: &Value, filter: &Filter) -> bool {
    let field = row.get(filter.column()).unwrap_or(&Value::Null);
    match filter {
        Filter::Eq(_, v) => !field.is_null() && values_equal(field, v),
        Filter::Neq(_, v) => !field.is_null() && !values_equal(field, v),
        Filter::In(_, values) => !field.is_null() && values.iter().any(|v| values_equal(field, v)),
        Filter::IsNull(_) => field.is_null(),
        Filter::ILike(_, pattern) => field
            .as_str()
            .map(|s| ilike(s, pattern))
            .unwrap_or(false),
    }
}

/// Numbers compare numerically, strings case-sensitively, like the
/// backend's typed columns.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::Number(y)) | (Value::Number(y), Value::String(x)) => {
            x.parse::<f64>().ok() == y.as_f64()
        }
        _ => a == b,
    }
}

fn ilike(value: &str, pattern: &str) -> bool {
    let value = value.to_lowercase();
    let pattern = pattern.to_lowercase();
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return value == pattern;
    }

    let mut rest = value.as_str();
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

/// Nulls sort last, as with `nullslast` ordering.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn decode<T: Record>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .with_context(|| format!("Failed to decode row from '{}'", T::TABLE))
        })
        .collect()
}

impl Store for MemoryStore {
    async fn select<T: Record>(&self, query: &Query) -> Result<Vec<T>> {
        decode(self.select_values(T::TABLE, query)?)
    }

    async fn insert<T: Record, N: Serialize + Sync>(&self, rows: &[N]) -> Result<Vec<T>> {
        let failing = self
            .failing_inserts
            .lock()
            .map(|f| f.contains(&T::TABLE))
            .unwrap_or(false);
        if failing {
            return Err(anyhow::anyhow!("insert into '{}' failed", T::TABLE));
        }

        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let mut object: Map<String, Value> = match serde_json::to_value(row)? {
                Value::Object(map) => map,
                other => return Err(anyhow::anyhow!("Row for '{}' is not an object: {}", T::TABLE, other)),
            };
            if object.get("id").map(Value::is_null).unwrap_or(true) {
                object.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
            }
            if object.get("created_at").map(Value::is_null).unwrap_or(true) {
                object.insert("created_at".to_string(), serde_json::to_value(Utc::now())?);
            }
            stored.push(Value::Object(object));
        }

        // Decode before committing so a bad row leaves the table untouched
        let decoded = decode::<T>(stored.clone())?;
        self.lock()?.entry(T::TABLE).or_default().extend(stored);
        Ok(decoded)
    }

    async fn update<T: Record>(&self, query: &Query, patch: Value) -> Result<Vec<T>> {
        query.ensure_filtered(T::TABLE)?;
        let Value::Object(patch) = patch else {
            return Err(anyhow::anyhow!("Patch for '{}' must be a JSON object", T::TABLE));
        };

        let mut tables = self.lock()?;
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(T::TABLE) {
            for row in rows.iter_mut().filter(|r| matches_all(r, &query.filters)) {
                if let Value::Object(map) = row {
                    for (k, v) in &patch {
                        map.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        drop(tables);
        decode(updated)
    }

    async fn delete(&self, table: &'static str, query: &Query) -> Result<u64> {
        query.ensure_filtered(table)?;
        let mut tables = self.lock()?;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !matches_all(r, &query.filters));
        Ok((before - rows.len()) as u64)
    }
}

impl ObjectStore for MemoryStore {
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        storage::check_image(content_type, bytes.len())?;
        let key = format!("{}/{}", bucket, path);
        self.objects
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?
            .insert(key.clone(), bytes);
        Ok(format!("{}{}", MEMORY_URL_PREFIX, key))
    }

    async fn remove_object(&self, bucket: &str, path: &str) -> Result<()> {
        self.objects
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?
            .remove(&format!("{}/{}", bucket, path));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Row {
        id: Uuid,
        name: String,
        status: Option<String>,
        number: Option<i32>,
    }

    impl Record for Row {
        const TABLE: &'static str = "rows";
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let rows = vec![
            json!({"name": "Gretzky", "status": "active", "number": 99}),
            json!({"name": "Lemieux", "status": "injured", "number": 66}),
            json!({"name": "Orr", "status": null, "number": 4}),
        ];
        let _: Vec<Row> = store.insert(&rows).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = seeded().await;
        let rows: Vec<Row> = store.select(&Query::new()).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| !r.id.is_nil()));
        assert!(store.rows("rows")[0].get("created_at").is_some());
    }

    #[tokio::test]
    async fn test_neq_skips_nulls() {
        let store = seeded().await;
        let rows: Vec<Row> = store
            .select(&Query::new().neq("status", "injured"))
            .await
            .unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Gretzky"]);
    }

    #[tokio::test]
    async fn test_order_and_limit() {
        let store = seeded().await;
        let rows: Vec<Row> = store
            .select(&Query::new().order_by("number", false).limit(2))
            .await
            .unwrap();
        let numbers: Vec<Option<i32>> = rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![Some(99), Some(66)]);
    }

    #[tokio::test]
    async fn test_ilike_and_in() {
        let store = seeded().await;
        let rows: Vec<Row> = store.select(&Query::new().ilike("name", "*EM*")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Lemieux");

        let rows: Vec<Row> = store
            .select(&Query::new().is_in("number", [4, 99]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = seeded().await;
        let updated: Vec<Row> = store
            .update(&Query::new().eq("name", "Orr"), json!({"status": "active"}))
            .await
            .unwrap();
        assert_eq!(updated[0].status.as_deref(), Some("active"));

        let removed = store
            .delete("rows", &Query::new().eq("status", "active"))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("rows"), 1);
    }

    #[tokio::test]
    async fn test_unfiltered_mutations_rejected() {
        let store = seeded().await;
        assert!(store.delete("rows", &Query::new()).await.is_err());
        let result: Result<Vec<Row>> = store.update(&Query::new(), json!({"status": "x"})).await;
        assert!(result.is_err());
        assert_eq!(store.count("rows"), 3);
    }

    #[test]
    fn test_ilike_patterns() {
        assert!(ilike("McDavid", "mc*"));
        assert!(ilike("McDavid", "*david"));
        assert!(ilike("McDavid", "*cDa*"));
        assert!(ilike("McDavid", "mcdavid"));
        assert!(!ilike("McDavid", "*x*"));
        assert!(ilike("coach@rinkside.app", "*@rinkside.app"));
    }
}
