use std::time::Duration;

/// Exponential backoff parameters applied between failing sync iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    /// Upper bound on the summed retry delays before giving up.
    /// `None` retries forever.
    pub max_elapsed: Option<Duration>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            max_interval: Duration::from_secs(60),
            max_elapsed: Some(Duration::from_secs(15 * 60)),
        }
    }
}

impl BackoffPolicy {
    pub fn new(
        initial_interval: Duration,
        multiplier: f64,
        max_interval: Duration,
        max_elapsed: Option<Duration>,
    ) -> Self {
        Self {
            initial_interval,
            multiplier: if multiplier < 1.0 { 1.0 } else { multiplier },
            max_interval: if max_interval.is_zero() {
                initial_interval
            } else {
                max_interval
            },
            max_elapsed,
        }
    }

    /// Delay before the retry following the `failures`-th consecutive failure.
    pub fn interval_for(&self, failures: u32) -> Duration {
        if self.initial_interval.is_zero() {
            return Duration::ZERO;
        }

        let exponent = failures.saturating_sub(1).min(64) as i32;
        let base_ms = self.initial_interval.as_millis() as f64;
        let delay_ms = base_ms * self.multiplier.powi(exponent);
        let capped = delay_ms.min(self.max_interval.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BackoffDecision {
    RetryAfter(Duration),
    Exhausted,
}

/// Loop-local backoff state. Created when the loop starts and reset after a
/// successful iteration.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    consecutive_failures: u32,
    elapsed: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            consecutive_failures: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn record_failure(&mut self) -> BackoffDecision {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let delay = self.policy.interval_for(self.consecutive_failures);
        let elapsed = self.elapsed.saturating_add(delay);

        if let Some(max) = self.policy.max_elapsed
            && elapsed > max
        {
            return BackoffDecision::Exhausted;
        }

        self.elapsed = elapsed;
        BackoffDecision::RetryAfter(delay)
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
        self.elapsed = Duration::ZERO;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }
}
