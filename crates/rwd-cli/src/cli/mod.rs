//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use rwd_core::config::Config;

mod commands;

#[derive(Parser)]
#[command(name = "rwd")]
#[command(version = "0.1")]
#[command(about = "Watch and replay agent sessions from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the backend base URL from config
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Attach to a running session and follow it live
    Attach {
        /// The session to attach to
        #[arg(value_name = "SESSION_ID")]
        session_id: String,
    },

    /// Open a recorded session in time-travel replay mode
    Replay {
        /// The session to replay
        #[arg(value_name = "SESSION_ID")]
        session_id: String,
    },

    /// Inspect sessions known to the backend
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum SessionCommands {
    /// Lists sessions, most recent first
    List,
    /// Prints a recorded session as plain text
    Show {
        /// The session to print
        #[arg(value_name = "SESSION_ID")]
        session_id: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = Config::load().context("load config")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    // Held for the life of the process so buffered log lines flush on exit.
    let _log_guard = rwd_core::logging::init(config.log_filter.as_deref())?;

    match cli.command {
        Commands::Attach { session_id } => rwd_tui::run_live(&config, &session_id).await,

        Commands::Replay { session_id } => commands::replay::run(&config, &session_id).await,

        Commands::Sessions { command } => match command {
            SessionCommands::List => commands::sessions::list(&config).await,
            SessionCommands::Show { session_id } => {
                commands::sessions::show(&config, &session_id).await
            }
        },

        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
