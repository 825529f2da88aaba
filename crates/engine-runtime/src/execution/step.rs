use crate::error::SyncError;
use engine_core::retry::{Backoff, BackoffDecision};
use std::time::Duration;

/// What the loop does after an iteration.
#[derive(Debug)]
pub enum LoopStep {
    /// Success in steady state; wait for the poll delay.
    Sleep(Duration),
    /// Success after one or more failures; backoff was reset.
    Recovered(Duration),
    /// Retryable failure; wait for the backoff delay and retry the same cursor.
    Retry(Duration),
    /// Stop the loop with this error.
    Fail(SyncError),
}

/// Decides the loop's next move from an iteration's outcome.
///
/// Iteration 0 fails fast. Later failures back off until the policy is
/// exhausted, unless the error is not retryable at all.
pub fn next_step<T>(
    iteration: u64,
    result: Result<T, SyncError>,
    backoff: &mut Backoff,
    poll_delay: Duration,
) -> LoopStep {
    let err = match result {
        Ok(_) if backoff.consecutive_failures() > 0 => {
            backoff.reset();
            return LoopStep::Recovered(poll_delay);
        }
        Ok(_) => return LoopStep::Sleep(poll_delay),
        Err(err) => err,
    };

    if iteration == 0 || !err.is_retryable() {
        return LoopStep::Fail(err);
    }

    match backoff.record_failure() {
        BackoffDecision::RetryAfter(delay) => LoopStep::Retry(delay),
        BackoffDecision::Exhausted => LoopStep::Fail(SyncError::BackoffExhausted {
            source: Box::new(err),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{error::SourceError, retry::BackoffPolicy};

    const POLL: Duration = Duration::from_secs(2);

    fn backoff() -> Backoff {
        Backoff::new(BackoffPolicy::new(
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(1),
            Some(Duration::from_millis(350)),
        ))
    }

    fn query_failure() -> Result<(), SyncError> {
        Err(SyncError::Source(SourceError::Other("connection reset".into())))
    }

    #[test]
    fn success_sleeps_for_poll_delay() {
        let mut backoff = backoff();
        assert!(matches!(
            next_step(3, Ok(()), &mut backoff, POLL),
            LoopStep::Sleep(d) if d == POLL
        ));
    }

    #[test]
    fn first_iteration_fails_fast() {
        let mut backoff = backoff();
        let step = next_step(0, query_failure(), &mut backoff, POLL);

        assert!(matches!(step, LoopStep::Fail(SyncError::Source(_))));
        assert_eq!(backoff.consecutive_failures(), 0);
    }

    #[test]
    fn later_failures_back_off_then_exhaust() {
        let mut backoff = backoff();

        assert!(matches!(
            next_step(1, query_failure(), &mut backoff, POLL),
            LoopStep::Retry(d) if d == Duration::from_millis(100)
        ));
        assert!(matches!(
            next_step(2, query_failure(), &mut backoff, POLL),
            LoopStep::Retry(d) if d == Duration::from_millis(200)
        ));
        assert!(matches!(
            next_step(3, query_failure(), &mut backoff, POLL),
            LoopStep::Fail(SyncError::BackoffExhausted { .. })
        ));
    }

    #[test]
    fn success_after_failure_recovers_and_resets() {
        let mut backoff = backoff();
        next_step(1, query_failure(), &mut backoff, POLL);

        assert!(matches!(
            next_step(2, Ok(()), &mut backoff, POLL),
            LoopStep::Recovered(d) if d == POLL
        ));
        assert_eq!(backoff.consecutive_failures(), 0);
        assert_eq!(backoff.elapsed(), Duration::ZERO);
    }

    #[test]
    fn configuration_error_is_fatal_after_first_iteration() {
        let mut backoff = backoff();
        let step = next_step::<()>(
            5,
            Err(SyncError::Configuration("corrupt cursor".into())),
            &mut backoff,
            POLL,
        );
        assert!(matches!(step, LoopStep::Fail(SyncError::Configuration(_))));
    }
}
