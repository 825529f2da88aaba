use crate::{
    error::SyncError,
    execution::step::{LoopStep, next_step},
};
use engine_config::settings::validated::SyncSettings;
use engine_core::{
    connectors::{cache::CacheStore, source::RowSource},
    metrics::{Metrics, MetricsSnapshot},
    retry::Backoff,
};
use model::core::value::Value;
use serde::Serialize;
use std::{cmp::Ordering, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of a single successful iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    /// Rows fetched and projected.
    pub rows: usize,
    /// Cursor committed with the batch, `None` for an idle iteration.
    pub cursor: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub iterations: u64,
    /// Whether the loop stopped because cancellation was requested.
    pub cancelled: bool,
    pub metrics: MetricsSnapshot,
}

/// Polls the source for rows past the persisted cursor and writes their
/// projections plus the advanced cursor to the cache in one atomic batch.
pub struct Runner {
    settings: SyncSettings,
    source: Arc<dyn RowSource>,
    cache: Arc<dyn CacheStore>,
    metrics: Metrics,
}

impl Runner {
    pub fn new(
        settings: SyncSettings,
        source: Arc<dyn RowSource>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Runner {
            settings,
            source,
            cache,
            metrics: Metrics::new(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Runs until cancelled, until `max_iterations` is reached, or until a
    /// fatal error.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunSummary, SyncError> {
        info!(
            source = self.source.name(),
            cache = self.cache.name(),
            cursor_key = %self.settings.cursor_key,
            poll_delay = ?self.settings.poll_delay,
            "Starting sync loop."
        );

        let mut backoff = Backoff::new(self.settings.backoff.clone());
        let mut iteration = 0u64;
        let mut cancelled = false;

        loop {
            if cancel.is_cancelled() {
                info!("Cancellation requested. Stopping sync loop.");
                cancelled = true;
                break;
            }

            self.metrics.increment_iterations();
            let result = self.run_once().await;
            if let Err(e) = &result {
                self.metrics.increment_failures();
                warn!(iteration, error = %e, "Sync iteration failed.");
            }

            let delay = match next_step(iteration, result, &mut backoff, self.settings.poll_delay)
            {
                LoopStep::Sleep(delay) => delay,
                LoopStep::Recovered(delay) => {
                    info!("Error resolved, polling at regular interval.");
                    delay
                }
                LoopStep::Retry(delay) => {
                    self.metrics.increment_retries();
                    warn!(
                        delay = ?delay,
                        failures = backoff.consecutive_failures(),
                        "Error encountered during run, retrying after delay."
                    );
                    delay
                }
                LoopStep::Fail(e) => {
                    error!(iteration, error = %e, "Sync loop stopped.");
                    return Err(e);
                }
            };

            iteration += 1;
            if let Some(max) = self.settings.max_iterations
                && iteration >= max
            {
                debug!(iterations = iteration, "Reached iteration bound.");
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Cancellation requested. Stopping sync loop.");
                    cancelled = true;
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        Ok(RunSummary {
            iterations: iteration,
            cancelled,
            metrics: self.metrics.snapshot(),
        })
    }

    /// Executes one fetch/project/commit cycle starting from the persisted
    /// cursor.
    pub async fn run_once(&self) -> Result<IterationReport, SyncError> {
        let descriptor = &self.settings.cursor;
        let mut cursor = self.resolve_cursor().await?;

        debug!(cursor = %cursor, "Running db query.");
        let rows = self
            .source
            .query(&self.settings.select_query, &cursor)
            .await?;

        let mut pipeline = self.cache.pipeline();
        for row in &rows {
            let next = row
                .get(&descriptor.column)
                .filter(|value| !value.is_null())
                .ok_or_else(|| SyncError::MissingCursorColumn(descriptor.column.clone()))?;

            let ordering = descriptor
                .compare(&cursor, next)
                .map_err(SyncError::CursorComparison)?;
            if ordering == Ordering::Less {
                cursor = next.clone();
            }

            let key = self.settings.key.render(row);
            let value = self.settings.value.render_value(row);
            debug!(key = %key, value = %value, "Setting key.");
            pipeline.set(key, value);
        }

        let total = rows.len();
        if total == 0 {
            return Ok(IterationReport {
                rows: 0,
                cursor: None,
            });
        }

        info!(rows = total, "Processed rows.");
        if total == self.settings.batch_size {
            warn!(
                batch_size = self.settings.batch_size,
                "Batch size reached, consider incrementing the execution rate."
            );
        }

        let persisted = descriptor.format(&cursor);
        debug!(cursor = %persisted, "Setting cursor.");
        pipeline.set(self.settings.cursor_key.as_str(), persisted);
        self.cache.exec(pipeline).await?;

        self.metrics.increment_rows(total as u64);
        self.metrics.increment_batches();

        Ok(IterationReport {
            rows: total,
            cursor: Some(cursor),
        })
    }

    /// Persisted cursor converted to the declared type, or the configured
    /// default when nothing (or an empty string) is stored.
    pub async fn resolve_cursor(&self) -> Result<Value, SyncError> {
        let descriptor = &self.settings.cursor;
        let stored = self.cache.get(&self.settings.cursor_key).await?;

        match stored.as_deref() {
            None | Some("") => Ok(descriptor.default.clone()),
            Some(raw) => descriptor.convert(raw).map_err(|e| {
                SyncError::Configuration(format!(
                    "unable to convert cached cursor '{raw}' under '{}': {e}",
                    self.settings.cursor_key
                ))
            }),
        }
    }
}
