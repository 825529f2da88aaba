use tracing::warn;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// Handle on the global log filter.
///
/// The subscriber is installed before the configuration is read so that
/// loading and validation logs are not lost. `RUST_LOG` takes precedence;
/// without it, logging starts at `info` and follows `debug: true` once the
/// config is known.
pub struct LogLevel {
    handle: Option<reload::Handle<EnvFilter, Registry>>,
}

impl LogLevel {
    pub fn install() -> Self {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            return LogLevel { handle: None };
        }

        let (filter, handle) = reload::Layer::new(config_filter(false));
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
        LogLevel {
            handle: Some(handle),
        }
    }

    pub fn apply_config(&self, debug: bool) {
        let Some(handle) = &self.handle else {
            return;
        };
        if let Err(e) = handle.reload(config_filter(debug)) {
            warn!(error = %e, "Unable to change the log level");
        }
    }
}

fn config_filter(debug: bool) -> EnvFilter {
    EnvFilter::new(if debug { "debug" } else { "info" })
}
