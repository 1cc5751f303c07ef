//! # Engine Configuration
//!
//! Terminal-level settings: where the database lives, which branch this
//! terminal operates in, printer routing and the log filter.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`COMANDA_*`)
//! 2. Config file (`comanda.toml`)
//! 3. Defaults (this file)
//!
//! Business settings (loyalty, commissions, currency) are not here: they are
//! a document in the store, shared by every terminal.
//!
//! ## Example `comanda.toml`
//! ```toml
//! [database]
//! path = "/var/lib/comanda/comanda.db"
//! max_connections = 5
//!
//! [branch]
//! id = "centro"
//! name = "Centro"
//!
//! [printers]
//! kitchen = "cocina"
//! bill = "caja"
//! receipt = "caja"
//!
//! [logging]
//! filter = "info,comanda=debug,sqlx=warn"
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use comanda_core::PrintJobType;
use comanda_db::DbConfig;

/// Default tracing filter.
pub const DEFAULT_LOG_FILTER: &str = "info,comanda=debug,sqlx=warn";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Could not determine the application directories")]
    NoProjectDirs,
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SQLite file. Defaults to the platform data directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchSection {
    pub id: String,
    pub name: String,
}

impl Default for BranchSection {
    fn default() -> Self {
        BranchSection {
            id: "main".to_string(),
            name: "Main".to_string(),
        }
    }
}

/// Printer name per job type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterSection {
    pub kitchen: String,
    pub bill: String,
    pub receipt: String,
    pub shift_report: String,
    pub production: String,
    pub transfer: String,
}

impl Default for PrinterSection {
    fn default() -> Self {
        PrinterSection {
            kitchen: "kitchen".to_string(),
            bill: "cashier".to_string(),
            receipt: "cashier".to_string(),
            shift_report: "cashier".to_string(),
            production: "kitchen".to_string(),
            transfer: "cashier".to_string(),
        }
    }
}

impl PrinterSection {
    /// Printer that receives jobs of the given type.
    pub fn for_job(&self, job_type: PrintJobType) -> &str {
        match job_type {
            PrintJobType::Command => &self.kitchen,
            PrintJobType::Bill => &self.bill,
            PrintJobType::Receipt => &self.receipt,
            PrintJobType::ShiftReport => &self.shift_report,
            PrintJobType::Production => &self.production,
            PrintJobType::Transfer => &self.transfer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

// =============================================================================
// Engine Config
// =============================================================================

/// Terminal configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub database: DatabaseSection,
    pub branch: BranchSection,
    pub printers: PrinterSection,
    pub logging: LoggingSection,
}

impl EngineConfig {
    /// Loads defaults, then the file at `path` (or the default location) if
    /// it exists, then `COMANDA_*` overrides, then validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().ok(),
        };

        let mut config = match path {
            Some(ref p) if p.exists() => {
                info!(path = %p.display(), "Loading config file");
                EngineConfig::from_file(p)?
            }
            _ => {
                debug!("No config file, using defaults");
                EngineConfig::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        EngineConfig::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies overrides from `lookup` (the process environment in
    /// production).
    ///
    /// - `COMANDA_DB_PATH`: database file
    /// - `COMANDA_DB_MAX_CONNECTIONS`: pool size
    /// - `COMANDA_BRANCH_ID`: operating branch
    /// - `COMANDA_LOG`: tracing filter
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("COMANDA_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(max) = lookup("COMANDA_DB_MAX_CONNECTIONS") {
            self.database.max_connections =
                max.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    field: "COMANDA_DB_MAX_CONNECTIONS".to_string(),
                    reason: format!("'{max}' is not a number"),
                })?;
        }
        if let Some(branch) = lookup("COMANDA_BRANCH_ID") {
            self.branch.id = branch;
        }
        if let Some(filter) = lookup("COMANDA_LOG") {
            self.logging.filter = filter;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.branch.id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "branch.id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let printers = [
            ("printers.kitchen", &self.printers.kitchen),
            ("printers.bill", &self.printers.bill),
            ("printers.receipt", &self.printers.receipt),
            ("printers.shift_report", &self.printers.shift_report),
            ("printers.production", &self.printers.production),
            ("printers.transfer", &self.printers.transfer),
        ];
        for (field, name) in printers {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "printer name must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Database file: the configured one or `<data dir>/comanda.db`.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("comanda.db")),
        }
    }

    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(self.database_path()?).max_connections(self.database.max_connections))
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("com", "comanda", "pos").ok_or(ConfigError::NoProjectDirs)
}

/// Platform config file location, e.g. `~/.config/pos/comanda.toml` on Linux.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.config_dir().join("comanda.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [branch]
            id = "centro"

            [printers]
            kitchen = "cocina"
            "#,
        )
        .unwrap();

        assert_eq!(config.branch.id, "centro");
        assert_eq!(config.branch.name, "Main");
        assert_eq!(config.printers.for_job(PrintJobType::Command), "cocina");
        assert_eq!(config.printers.for_job(PrintJobType::Receipt), "cashier");
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("COMANDA_DB_PATH", "/tmp/x.db"),
            ("COMANDA_BRANCH_ID", "norte"),
            ("COMANDA_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/x.db"));
        assert_eq!(config.branch.id, "norte");
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_bad_pool_size_override_is_rejected() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides(|k| (k == "COMANDA_DB_MAX_CONNECTIONS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_branch() {
        let mut config = EngineConfig::default();
        config.branch.id = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = EngineConfig::from_toml("[branch\nid=").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_explicit_file_falls_back_to_defaults() {
        let config = EngineConfig::load(Some(Path::new("/nonexistent/comanda.toml")));
        // Environment may carry overrides on a developer machine, so only
        // assert that loading succeeds.
        assert!(config.is_ok());
    }
}
