//! In-memory data store.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::{Mutex, RwLock};

use parcelbase_core::{CoreError, Result};
use parcelbase_storage::{DataStore, Filter, SelectQuery};

/// In-memory [`DataStore`]: tables of JSON rows behind an async lock.
///
/// Inserts fill in `id`, `created_at` and `updated_at` when the caller leaves
/// them out, matching what the real backend does server-side.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    /// Errors to return from upcoming calls, in order. Test hook.
    queued_failures: Mutex<VecDeque<CoreError>>,
    /// Artificial latency applied to every call. Test hook.
    latency: RwLock<Option<Duration>>,
    select_calls: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of `table` with `rows`.
    pub async fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut tables = self.tables.write().await;
        tables.insert(table.to_string(), rows);
    }

    /// Queue an error to be returned by the next store call.
    ///
    /// Queued errors are consumed first-in-first-out, one per call, before
    /// any table access happens.
    pub async fn fail_next(&self, error: CoreError) {
        self.queued_failures.lock().await.push_back(error);
    }

    /// Apply `latency` to every subsequent call (`None` disables).
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }

    /// How many `select`/`select_one` calls have been issued.
    pub fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    async fn simulate(&self) -> Result<()> {
        if let Some(latency) = *self.latency.read().await {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = self.queued_failures.lock().await.pop_front() {
            return Err(error);
        }
        Ok(())
    }

    fn run_query(rows: &[Value], query: &SelectQuery) -> Vec<Value> {
        let mut matched: Vec<Value> = rows
            .iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();

        if let Some(order) = &query.order {
            matched.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.field), b.get(&order.field));
                if order.ascending { ord } else { ord.reverse() }
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        matched
    }
}

/// Total order over JSON scalars for sorting: null < bool < number < string.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering as O;
    let rank = |v: Option<&Value>| match v {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(_) => 4,
    };
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(O::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn now_rfc3339() -> Value {
    Value::String(
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
    )
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        let tables = self.tables.read().await;
        let rows = tables.get(&query.table).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Self::run_query(rows, query))
    }

    async fn select_one(&self, query: &SelectQuery) -> Result<Value> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        let tables = self.tables.read().await;
        let rows = tables.get(&query.table).map(Vec::as_slice).unwrap_or(&[]);
        let mut matched = Self::run_query(rows, query);
        match matched.len() {
            0 => Err(CoreError::not_found(
                query.table.clone(),
                describe_filters(&query.filters),
            )),
            1 => Ok(matched.swap_remove(0)),
            n => Err(CoreError::storage(format!(
                "expected a single row from {}, got {n}",
                query.table
            ))),
        }
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Value> {
        self.simulate().await?;
        let Some(object) = row.as_object_mut() else {
            return Err(CoreError::validation("insert row must be a JSON object"));
        };
        object
            .entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        object.entry("created_at").or_insert_with(now_rfc3339);
        object.entry("updated_at").or_insert_with(now_rfc3339);

        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, filters: &[Filter], changes: Value) -> Result<Vec<Value>> {
        self.simulate().await?;
        let Some(changes) = changes.as_object() else {
            return Err(CoreError::validation("update changes must be a JSON object"));
        };

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if !filters.iter().all(|f| f.matches(row)) {
                continue;
            }
            if let Some(object) = row.as_object_mut() {
                for (key, value) in changes {
                    object.insert(key.clone(), value.clone());
                }
                object.insert("updated_at".to_string(), now_rfc3339());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64> {
        self.simulate().await?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        let before = rows.len();
        rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok((before - rows.len()) as u64)
    }
}

fn describe_filters(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(|f| match f {
            Filter::Eq { field, value } => format!("{field}={value}"),
            Filter::Like { field, pattern } => format!("{field}~{pattern}"),
            Filter::In { field, .. } => format!("{field} in (..)"),
            Filter::IsNull { field } => format!("{field} is null"),
        })
        .collect::<Vec<_>>()
        .join(",")
}
