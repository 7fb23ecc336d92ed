use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::utils::app_paths::AppPaths;

/// Environment variable that overrides every other log level setting
pub const LOG_ENV_VAR: &str = "MASJID_LEDGER_LOG";

/// Filter directive for a `-v` count, falling back to the configured level
pub fn level_directive(config: &LoggingConfig, verbose: u8) -> String {
    match verbose {
        0 => config.level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber: compact output on stderr, plus a
/// timestamped log file when file logging is enabled.
///
/// Returns the log file path when one was opened.
pub fn init_tracing(config: &LoggingConfig, verbose: u8) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(level_directive(config, verbose)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let (file_layer, log_path) = if config.log_to_file {
        let log_dir = match &config.log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir.clone()
            }
            None => AppPaths::log_dir()?,
        };
        let log_path = log_dir.join(format!(
            "masjid_ledger_{}.log",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        let file = File::create(&log_path)
            .with_context(|| format!("Failed to create log file {:?}", log_path))?;

        let layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_target(true)
            .with_ansi(false);
        (Some(layer), Some(log_path))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    if let Some(path) = &log_path {
        tracing::info!(target: "config", "Logging to {}", path.display());
    }
    Ok(log_path)
}
