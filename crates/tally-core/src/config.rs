//! Configuration
//!
//! ## Resolution
//!
//! Each layer overrides the one before it:
//! 1. Embedded defaults (`config/tally.toml`, compiled into the binary)
//! 2. An override file: the explicit `--config` path, otherwise
//!    `~/.config/tally/tally.toml` when it exists
//! 3. Environment: `TALLY_DB`, `TALLY_RECURRING_SCHEDULE` (hours)
//!
//! Command-line flags are applied last by the binaries themselves.

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/tally.toml");

/// Environment variable overriding the database path
pub const ENV_DB: &str = "TALLY_DB";
/// Environment variable setting the scheduler interval in hours
pub const ENV_RECURRING_SCHEDULE: &str = "TALLY_RECURRING_SCHEDULE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Hours between automatic recurring runs; `None` disables the scheduler
    pub interval_hours: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub monthly: Option<Decimal>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerSettings,
    pub scheduler: SchedulerConfig,
    pub budget: BudgetConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: PathBuf::from("tally.db"),
            },
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            scheduler: SchedulerConfig::default(),
            budget: BudgetConfig::default(),
        }
    }
}

// Raw TOML shapes: every field optional so a file only names what it overrides

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    database: Option<RawDatabase>,
    server: Option<RawServer>,
    scheduler: Option<RawScheduler>,
    budget: Option<RawBudget>,
}

#[derive(Debug, Deserialize)]
struct RawDatabase {
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct RawScheduler {
    interval_hours: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawBudget {
    monthly: Option<Decimal>,
}

/// Default override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tally").join("tally.toml"))
}

/// Interpret a scheduler interval; zero means disabled
fn interval_from_hours(hours: u64) -> Option<u64> {
    (hours > 0).then_some(hours)
}

impl Config {
    /// Load with full resolution: embedded, override file, then environment
    ///
    /// An explicit `path` must exist. The default override location is only
    /// read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_toml(DEFAULT_CONFIG)?;

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                config.merge_file(path)?;
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    if default_path.exists() {
                        config.merge_file(&default_path)?;
                    }
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a complete config over the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config = Self::default();
        config.merge_toml(content)?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "Loading config override");
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        self.merge_toml(&content)
    }

    /// Overlay the fields present in `content`
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let raw: RawConfig = toml::from_str(content)?;

        if let Some(database) = raw.database {
            if let Some(path) = database.path {
                self.database.path = path;
            }
        }
        if let Some(server) = raw.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }
        if let Some(scheduler) = raw.scheduler {
            if let Some(hours) = scheduler.interval_hours {
                self.scheduler.interval_hours = interval_from_hours(hours);
            }
        }
        if let Some(budget) = raw.budget {
            if budget.monthly.is_some() {
                self.budget.monthly = budget.monthly;
            }
        }

        Ok(())
    }

    /// Apply environment overrides read through `get`
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = get(ENV_DB).filter(|p| !p.trim().is_empty()) {
            self.database.path = PathBuf::from(path);
        }

        if let Some(value) = get(ENV_RECURRING_SCHEDULE) {
            match value.trim().parse::<u64>() {
                Ok(hours) => self.scheduler.interval_hours = interval_from_hours(hours),
                Err(_) => warn!(
                    value = %value,
                    "Ignoring {}: expected a whole number of hours",
                    ENV_RECURRING_SCHEDULE
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, PathBuf::from("tally.db"));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.scheduler.interval_hours, None);
        assert_eq!(config.budget.monthly, None);
    }

    #[test]
    fn test_partial_override() {
        let mut config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        config
            .merge_toml(
                r#"
                [server]
                port = 8080

                [budget]
                monthly = "750.00"
                "#,
            )
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.budget.monthly, Some(dec!(750.00)));
        assert_eq!(config.database.path, PathBuf::from("tally.db"));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_toml("[server\nport = ");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            (ENV_DB, "/var/lib/tally/expenses.db"),
            (ENV_RECURRING_SCHEDULE, "24"),
        ]));
        assert_eq!(config.database.path, PathBuf::from("/var/lib/tally/expenses.db"));
        assert_eq!(config.scheduler.interval_hours, Some(24));

        // Zero disables, junk is ignored
        config.apply_env(env(&[(ENV_RECURRING_SCHEDULE, "0")]));
        assert_eq!(config.scheduler.interval_hours, None);
        config.scheduler.interval_hours = Some(6);
        config.apply_env(env(&[(ENV_RECURRING_SCHEDULE, "daily")]));
        assert_eq!(config.scheduler.interval_hours, Some(6));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tally.toml");
        fs::write(&path, "[scheduler]\ninterval_hours = 12\n").unwrap();

        let mut config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        config.merge_file(&path).unwrap();
        assert_eq!(config.scheduler.interval_hours, Some(12));

        let missing = Config::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(missing, Err(Error::Config(_))));
    }
}
