use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::data::table_state::DEFAULT_PAGE_SIZE;
use crate::utils::app_paths::AppPaths;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub table: TableConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows per page when a ledger is opened
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory exports are written to. Relative paths resolve against the
    /// working directory.
    pub output_dir: PathBuf,

    /// Label printed before totals in statements
    pub currency: String,

    /// Append the ledger's total line to exports
    pub include_totals: bool,

    /// Records per page of a statement export
    pub statement_page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. "info" or "masjid_ledger=debug"
    pub level: String,

    /// Also write logs to a file under the application log directory
    pub log_to_file: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
            currency: "Rs.".to_string(),
            include_totals: true,
            statement_page_size: 20,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            log_to_file: false,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load config from the default location, writing the defaults there on
    /// first run
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save_to(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {:?}", path))?;

        debug!(target: "config", "Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Read a config file if it exists, defaults otherwise. Never writes.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the commented template to `path`. An existing file is only
    /// replaced when `force` is set.
    pub fn write_template(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::create_default_with_comments())
            .with_context(|| format!("Failed to write config file {:?}", path))?;

        debug!(target: "config", "Wrote config template to {}", path.display());
        Ok(())
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {:?}", path))?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        Ok(AppPaths::config_dir()?.join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# masjid-ledger configuration
# Location: ~/.config/masjid-ledger/config.toml (Linux)
#           ~/Library/Application Support/masjid-ledger/config.toml (macOS)
#           %APPDATA%\masjid-ledger\config.toml (Windows)

[table]
# Rows per page when a ledger is opened
page_size = 10

[export]
# Where exported files are written (relative to the working directory)
output_dir = "exports"

# Label printed before totals in statements
currency = "Rs."

# Append the ledger total (income amount, invoice total due, ...) to exports
include_totals = true

# Records per page of a statement export
statement_page_size = 20

[logging]
# Filter directive; MASJID_LEDGER_LOG overrides it
# Examples: "warn", "info", "table=debug,export=info"
level = "warn"

# Also write a timestamped log file under the data directory
log_to_file = false
"#
        .to_string()
    }
}
