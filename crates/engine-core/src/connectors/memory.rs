//! In-process source and cache.
//!
//! Both honour the same contracts as the networked connectors and are used by
//! tests and dry runs. Each supports injecting failures so retry and
//! all-or-nothing behaviour can be exercised without live services.

use crate::{
    connectors::{
        cache::{CacheStore, Pipeline},
        source::RowSource,
    },
    error::{CacheError, SourceError},
};
use async_trait::async_trait;
use model::{
    core::value::Value,
    pagination::cursor::CursorType,
    records::row::RowData,
};
use std::{
    cmp::Ordering as CmpOrdering,
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::RwLock;

/// Decrements `counter` if positive and reports whether it did.
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Table held in memory, filtered by `column > cursor` like the configured
/// select query would be.
pub struct MemorySource {
    column: String,
    cursor_type: CursorType,
    limit: Option<usize>,
    rows: RwLock<Vec<RowData>>,
    failures: AtomicUsize,
    queried: RwLock<Vec<Value>>,
}

impl MemorySource {
    pub fn new(column: &str, cursor_type: CursorType) -> Self {
        MemorySource {
            column: column.to_string(),
            cursor_type,
            limit: None,
            rows: RwLock::new(Vec::new()),
            failures: AtomicUsize::new(0),
            queried: RwLock::new(Vec::new()),
        }
    }

    /// Caps each query result, standing in for the query's `LIMIT`.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub async fn extend(&self, rows: impl IntoIterator<Item = RowData>) {
        self.rows.write().await.extend(rows);
    }

    /// The next `n` queries fail with a query error.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Cursor parameters bound by every query so far.
    pub async fn queried_cursors(&self) -> Vec<Value> {
        self.queried.read().await.clone()
    }

    fn after_cursor(&self, row: &RowData, cursor: &Value) -> bool {
        match row.get(&self.column) {
            Some(value) => !matches!(
                self.cursor_type.compare(value, cursor),
                Ok(CmpOrdering::Less | CmpOrdering::Equal)
            ),
            // Rows the predicate cannot evaluate are passed through so the
            // caller sees them.
            None => true,
        }
    }
}

#[async_trait]
impl RowSource for MemorySource {
    async fn query(&self, _sql: &str, cursor: &Value) -> Result<Vec<RowData>, SourceError> {
        self.queried.write().await.push(cursor.clone());

        if take_failure(&self.failures) {
            return Err(SourceError::Query("injected query failure".into()));
        }

        let rows = self.rows.read().await;
        let matching = rows
            .iter()
            .filter(|row| self.after_cursor(row, cursor))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matching)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Hash map cache with atomic pipeline execution.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Value>>,
    read_failures: AtomicUsize,
    poisoned_key: RwLock<Option<String>>,
    execs: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache::default()
    }

    /// Stores a raw value outside of any pipeline, e.g. to seed a cursor.
    pub async fn put(&self, key: &str, value: impl Into<Value>) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.into());
    }

    pub async fn value(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// The next `n` reads fail.
    pub fn fail_next_reads(&self, n: usize) {
        self.read_failures.store(n, Ordering::SeqCst);
    }

    /// Any pipeline that writes `key` fails at that operation, after the
    /// earlier operations of the same pipeline were staged.
    pub async fn fail_on_key(&self, key: Option<&str>) {
        *self.poisoned_key.write().await = key.map(str::to_string);
    }

    /// Number of pipelines that executed successfully.
    pub fn exec_count(&self) -> usize {
        self.execs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if take_failure(&self.read_failures) {
            return Err(CacheError::Read {
                key: key.to_string(),
                source: "injected read failure".into(),
            });
        }

        Ok(self.entries.read().await.get(key).map(Value::as_text))
    }

    async fn exec(&self, pipeline: Pipeline) -> Result<(), CacheError> {
        let ops = pipeline.len();
        let poisoned = self.poisoned_key.read().await.clone();
        let mut entries = self.entries.write().await;
        let mut staged = Vec::with_capacity(ops);

        for op in pipeline.into_ops() {
            if poisoned.as_deref() == Some(op.key.as_str()) {
                return Err(CacheError::Exec {
                    ops,
                    source: format!("write to '{}' rejected", op.key).into(),
                });
            }
            staged.push(op);
        }

        for op in staged {
            entries.insert(op.key, op.value);
        }
        self.execs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
