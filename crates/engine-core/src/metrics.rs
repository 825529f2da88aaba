use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    iterations: AtomicU64,
    rows_projected: AtomicU64,
    batches_committed: AtomicU64,
    failure_count: AtomicU64,
    retry_count: AtomicU64,
}

/// Counters shared between the sync loop and whoever observes it.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub iterations: u64,
    pub rows_projected: u64,
    pub batches_committed: u64,
    pub failure_count: u64,
    pub retry_count: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics::default()
    }

    pub fn increment_iterations(&self) {
        self.inner.iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rows(&self, count: u64) {
        self.inner.rows_projected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches(&self) {
        self.inner.batches_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.inner.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retries(&self) {
        self.inner.retry_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            iterations: self.inner.iterations.load(Ordering::Relaxed),
            rows_projected: self.inner.rows_projected.load(Ordering::Relaxed),
            batches_committed: self.inner.batches_committed.load(Ordering::Relaxed),
            failure_count: self.inner.failure_count.load(Ordering::Relaxed),
            retry_count: self.inner.retry_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = Metrics::new();
        let observer = metrics.clone();

        metrics.increment_rows(3);
        metrics.increment_batches();

        let snap = observer.snapshot();
        assert_eq!(snap.rows_projected, 3);
        assert_eq!(snap.batches_committed, 1);
        assert_eq!(snap.failure_count, 0);
    }
}
