//! File-based tracing setup.
//!
//! Nothing is logged unless RWD_LOG is set: the TUI owns the terminal, so
//! all diagnostics go to a file under ${RWD_HOME}/logs instead of stderr.

use std::fs::OpenOptions;

use anyhow::{Context, Result};
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::paths;

const LOG_FILE_NAME: &str = "rwd.log";
const DEFAULT_FILTER: &str = "rwd_core=info,rwd_tui=info,rwd=info";

/// Initializes file logging when RWD_LOG is set.
///
/// Returns the guard keeping the non-blocking writer alive; the caller must
/// hold it for the life of the process. Returns `None` (and installs no
/// subscriber) when RWD_LOG is unset.
///
/// Filter resolution: `RWD_LOG` value if it parses as an env-filter, then
/// `log_filter` from config, then a crate-level default.
pub fn init(config_filter: Option<&str>) -> Result<Option<WorkerGuard>> {
    let Ok(requested) = std::env::var("RWD_LOG") else {
        return Ok(None);
    };

    let filter = EnvFilter::try_new(&requested)
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let log_dir = paths::logs_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);
    // Log lines can quote session content; keep the file private.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        log_file_opts.mode(0o600);
    }
    let log_file = log_file_opts
        .open(log_dir.join(LOG_FILE_NAME))
        .with_context(|| format!("failed to open log file in {}", log_dir.display()))?;

    let (writer, guard) = non_blocking(log_file);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_ansi(false)
        .with_filter(filter);

    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(Some(guard))
}
