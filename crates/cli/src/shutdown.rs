use std::io;
use tokio::{signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Non-zero process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// At least one `test-conn` ping failed.
    PingFailed = 1,
    /// The loop stopped because SIGINT or SIGTERM arrived.
    Interrupted = 130,
}

impl ExitCode {
    pub fn exit(self) -> ! {
        std::process::exit(self as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopSignal {
    Interrupt,
    Terminate,
}

impl StopSignal {
    fn name(self) -> &'static str {
        match self {
            StopSignal::Interrupt => "SIGINT",
            StopSignal::Terminate => "SIGTERM",
        }
    }
}

#[cfg(unix)]
async fn next_stop_signal() -> io::Result<StopSignal> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    tokio::select! {
        interrupted = signal::ctrl_c() => interrupted.map(|_| StopSignal::Interrupt),
        _ = terminate.recv() => Ok(StopSignal::Terminate),
    }
}

#[cfg(not(unix))]
async fn next_stop_signal() -> io::Result<StopSignal> {
    signal::ctrl_c().await.map(|_| StopSignal::Interrupt)
}

/// Cancels `cancel` on the first SIGINT or SIGTERM.
///
/// The sync loop only observes the token between iterations and while
/// sleeping, so a batch that is being committed still lands with its cursor.
pub fn cancel_on_signal(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match next_stop_signal().await {
            Ok(stop) => {
                info!(
                    signal = stop.name(),
                    "Stop requested, finishing the current iteration"
                );
                cancel.cancel();
            }
            Err(e) => error!(error = %e, "Unable to listen for stop signals"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_stays_live_until_a_signal_arrives() {
        let cancel = CancellationToken::new();
        let listener = cancel_on_signal(cancel.clone());

        tokio::task::yield_now().await;

        assert!(!cancel.is_cancelled());
        listener.abort();
    }

    #[test]
    fn interrupted_exit_code_matches_sigint_convention() {
        assert_eq!(ExitCode::Interrupted as i32, 130);
        assert_eq!(ExitCode::PingFailed as i32, 1);
        assert_eq!(StopSignal::Terminate.name(), "SIGTERM");
    }
}
