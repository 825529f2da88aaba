use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(long, default_value = "config.yml", help = "Config file path")]
    pub config: PathBuf,

    #[arg(
        long,
        help = "Load KEY=VALUE lines from this file before reading the config"
    )]
    pub env_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sync rows into the cache until interrupted
    Run {
        #[command(flatten)]
        args: ConfigArgs,

        #[arg(long, help = "Run a single iteration and exit")]
        once: bool,

        #[arg(long, help = "Print the run summary as JSON")]
        json: bool,
    },
    /// Ping the database and the cache
    TestConn {
        #[command(flatten)]
        args: ConfigArgs,
    },
    /// Print the persisted cursor, or the default when none is stored
    Cursor {
        #[command(flatten)]
        args: ConfigArgs,
    },
}
