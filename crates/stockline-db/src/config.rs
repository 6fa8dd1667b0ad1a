//! # Engine Configuration
//!
//! Where the database lives and who the ledger says performed deductions.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKLINE_DB_PATH=/var/lib/stockline/stockline.db                  │
//! │     STOCKLINE_PERFORMED_BY=toast-sync                                  │
//! │     STOCKLINE_MAX_CONNECTIONS=8                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockline/stockline.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockline.stockline/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     stockline.db in the platform data dir, 5 connections, "pos-sync"   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/stockline/stockline.db"
//! max_connections = 8
//! busy_timeout_ms = 5000
//!
//! [deduction]
//! performed_by = "toast-sync"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use stockline_core::DEFAULT_PERFORMED_BY;

use crate::deduction::DeductionService;
use crate::error::{DbError, DbResult};
use crate::pool::{Database, DbConfig};

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `stockline.db` in the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a deduction waits for the write lock.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// `[deduction]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionSettings {
    /// Actor written to `performed_by` on ledger rows.
    #[serde(default = "default_performed_by")]
    pub performed_by: String,
}

fn default_performed_by() -> String {
    DEFAULT_PERFORMED_BY.to_string()
}

impl Default for DeductionSettings {
    fn default() -> Self {
        DeductionSettings {
            performed_by: default_performed_by(),
        }
    }
}

// =============================================================================
// Engine Config
// =============================================================================

/// Top-level configuration for an engine process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub deduction: DeductionSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else the platform default); a missing
    ///    file is not an error
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| DbError::Config(format!("{}: {}", path.display(), e)))?;
                config = Self::from_toml_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> DbResult<Self> {
        toml::from_str(contents).map_err(|e| DbError::Config(e.to_string()))
    }

    /// Checks values that would make the engine unusable.
    pub fn validate(&self) -> DbResult<()> {
        if self.database.max_connections == 0 {
            return Err(DbError::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.deduction.performed_by.trim().is_empty() {
            return Err(DbError::Config("performed_by must not be blank".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `STOCKLINE_*` overrides from `lookup`. Unparseable values are
    /// ignored with a warning.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("STOCKLINE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("STOCKLINE_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %max, "Ignoring invalid STOCKLINE_MAX_CONNECTIONS"),
            }
        }

        if let Some(actor) = lookup("STOCKLINE_PERFORMED_BY") {
            debug!(performed_by = %actor, "Overriding ledger actor from environment");
            self.deduction.performed_by = actor;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockline", "stockline")
            .map(|dirs| dirs.config_dir().join("stockline.toml"))
    }

    /// Database file to open.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .or_else(|| {
                directories::ProjectDirs::from("com", "stockline", "stockline")
                    .map(|dirs| dirs.data_dir().join("stockline.db"))
            })
            .unwrap_or_else(|| PathBuf::from("stockline.db"))
    }

    /// Pool configuration derived from the `[database]` section.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    /// Opens the database, creating the parent directory when needed.
    pub async fn connect(&self) -> DbResult<Database> {
        let path = self.database_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DbError::Config(format!("{}: {}", parent.display(), e)))?;
        }
        Database::new(self.db_config()).await
    }

    /// Deduction service recording the configured actor.
    pub fn deduction_service(&self, db: &Database) -> DeductionService {
        db.deductions_as(self.deduction.performed_by.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();

        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.deduction.performed_by, "pos-sync");
        assert!(config.validate().is_ok());
        assert!(config.database_path().ends_with("stockline.db"));
    }

    #[test]
    fn test_parse_partial_file() {
        let config = EngineConfig::from_toml_str(
            r#"
            [database]
            path = "/tmp/bar.db"

            [deduction]
            performed_by = "toast-sync"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path(), PathBuf::from("/tmp/bar.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.deduction.performed_by, "toast-sync");

        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from("/tmp/bar.db"));
        assert_eq!(db.busy_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_malformed_file() {
        let err = EngineConfig::from_toml_str("[database]\nmax_connections = \"many\"").unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("STOCKLINE_DB_PATH", "/srv/stockline.db"),
            ("STOCKLINE_MAX_CONNECTIONS", "12"),
            ("STOCKLINE_PERFORMED_BY", "square-sync"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, Some(PathBuf::from("/srv/stockline.db")));
        assert_eq!(config.database.max_connections, 12);
        assert_eq!(config.deduction.performed_by, "square-sync");
    }

    #[test]
    fn test_invalid_override_ignored() {
        let mut config = EngineConfig::default();
        config.apply_overrides(|key| {
            (key == "STOCKLINE_MAX_CONNECTIONS").then(|| "lots".to_string())
        });

        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_validate() {
        let mut config = EngineConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.deduction.performed_by = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("stockline-{}.toml", uuid::Uuid::new_v4()));
        let config = EngineConfig::load(Some(path)).unwrap();

        // Environment may override, but the result is always valid
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_connect_and_service() {
        let dir = std::env::temp_dir().join(format!("stockline-{}", uuid::Uuid::new_v4()));
        let mut config = EngineConfig::default();
        config.database.path = Some(dir.join("nested").join("stockline.db"));
        config.deduction.performed_by = "test-runner".to_string();

        let db = config.connect().await.unwrap();
        assert!(db.health_check().await);
        assert_eq!(config.deduction_service(&db).performed_by(), "test-runner");

        db.close().await;
        let _ = std::fs::remove_dir_all(dir);
    }
}
