use crate::{
    commands::{Commands, ConfigArgs},
    conn::{ConnectionPinger, PostgresConnectionPinger, RedisConnectionPinger, connect_all},
    error::CliError,
    logging::LogLevel,
    shutdown::{ExitCode, cancel_on_signal},
};
use clap::Parser;
use engine_config::{env::EnvManager, loader, settings::Config};
use engine_core::connectors::cache::CacheStore;
use engine_runtime::execution::runner::Runner;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod commands;
mod conn;
mod error;
mod logging;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "cachesync",
    version = "0.1.0",
    about = "Write-behind worker that projects new database rows into Redis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let log_level = LogLevel::install();

    match cli.command {
        Commands::Run { args, once, json } => {
            let config = load_config(&args, &log_level)?;
            let cancel = CancellationToken::new();
            let listener = cancel_on_signal(cancel.clone());

            let (source, cache) = connect_all(&config).await?;
            let mut settings = config.sync_settings()?;
            if once {
                settings = settings.with_max_iterations(1);
            }

            let runner = Runner::new(settings, source, cache);
            let summary = runner.run(cancel).await?;
            listener.abort();
            output::print_summary(&summary, json)?;

            if summary.cancelled {
                info!("Exiting after requested shutdown");
                ExitCode::Interrupted.exit();
            }
        }
        Commands::TestConn { args } => {
            let config = load_config(&args, &log_level)?;
            let pingers: Vec<Box<dyn ConnectionPinger>> = vec![
                Box::new(PostgresConnectionPinger::from_config(&config)?),
                Box::new(RedisConnectionPinger::from_config(&config)),
            ];

            let mut failed = false;
            for pinger in &pingers {
                match pinger.ping().await {
                    Ok(()) => println!("{}: ok", pinger.service()),
                    Err(e) => {
                        error!(service = pinger.service(), error = %e, "Ping failed");
                        println!("{}: {e}", pinger.service());
                        failed = true;
                    }
                }
            }

            if failed {
                ExitCode::PingFailed.exit();
            }
        }
        Commands::Cursor { args } => {
            let config = load_config(&args, &log_level)?;
            let settings = config.sync_settings()?;
            let cache = RedisConnectionPinger::from_config(&config).connect().await?;

            match cache.get(&settings.cursor_key).await? {
                Some(raw) if !raw.is_empty() => println!("{raw}"),
                _ => println!("{} (default)", settings.cursor.format(&settings.cursor.default)),
            }
        }
    }

    Ok(())
}

/// Reads the env file (if any), the config file and the environment, then
/// applies the configured log level.
fn load_config(args: &ConfigArgs, log_level: &LogLevel) -> Result<Config, CliError> {
    let mut env = EnvManager::from_process();
    if let Some(path) = &args.env_file {
        env.load_from_file(path)?;
    }

    let (config, file_exists) = loader::load(Some(args.config.as_path()), &env)?;
    log_level.apply_config(config.debug);
    info!(
        path = %args.config.display(),
        file_exists,
        "Loaded configuration"
    );

    Ok(config)
}
