//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.migration-linter.toml` in current directory
//! 4. `~/.config/migration-linter/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [linter]
//! database = "django.db.backends.postgresql"
//! sql_analyser = "postgresql"          # overrides the database engine
//! exclude_migration_tests = ["CREATE_INDEX"]
//! warnings_as_errors = ["RUNPYTHON_REVERSIBLE"]
//! all_warnings_as_errors = false
//! include_apps = ["library"]
//! exclude_apps = []
//! ignore_name = ["0001_initial"]
//! ignore_name_contains = "squashed"
//! include_name = []
//! quiet = ["ok", "ignore"]
//! no_cache = false
//! cache_path = "/tmp/migration-linter"
//!
//! [analysers]
//! legacy = "migration_linter::rules::MySql"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `MIGRATION_LINTER_DATABASE` | Database engine identifier |
//! | `MIGRATION_LINTER_SQL_ANALYSER` | Explicit analyser name |

use std::{
    env, fs,
    path::{Path, PathBuf}
};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    error::{AppResult, config_error},
    selector::{CustomAnalyser, CustomMapping}
};

/// Local configuration file name
pub const LOCAL_CONFIG_FILE: &str = ".migration-linter.toml";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub linter:    LinterConfig,
    /// Custom analyser name to `module::Name` rule set path
    #[serde(default)]
    pub analysers: IndexMap<String, String>
}

/// Output categories that can be silenced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QuietLevel {
    Ok,
    Ignore,
    Warning,
    Error
}

/// Linter configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LinterConfig {
    pub database:                Option<String>,
    pub sql_analyser:            Option<String>,
    #[serde(default)]
    pub exclude_migration_tests: Vec<String>,
    #[serde(default)]
    pub warnings_as_errors:      Vec<String>,
    #[serde(default)]
    pub all_warnings_as_errors:  bool,
    #[serde(default)]
    pub include_apps:            Vec<String>,
    #[serde(default)]
    pub exclude_apps:            Vec<String>,
    #[serde(default)]
    pub ignore_name:             Vec<String>,
    pub ignore_name_contains:    Option<String>,
    #[serde(default)]
    pub include_name:            Vec<String>,
    pub include_name_contains:   Option<String>,
    #[serde(default)]
    pub quiet:                   Vec<QuietLevel>,
    #[serde(default)]
    pub no_cache:                bool,
    /// Cache directory; defaults to the user cache directory
    pub cache_path:              Option<PathBuf>
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file in current directory (.migration-linter.toml)
    /// 3. Config file in home directory
    ///    (~/.config/migration-linter/config.toml)
    /// 4. Default values
    pub fn load() -> AppResult<Self> {
        let home_config = env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("migration-linter")
                .join("config.toml")
        });
        let mut config = Self::load_files(home_config.as_deref(), Path::new(LOCAL_CONFIG_FILE))?;
        config.apply_env();
        Ok(config)
    }

    /// Load the first existing file, the local one taking precedence
    pub fn load_files(home_config: Option<&Path>, local_config: &Path) -> AppResult<Self> {
        if local_config.exists() {
            return Self::from_file(local_config);
        }
        match home_config {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| config_error(format!("Failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    /// Override with environment variables
    pub fn apply_env(&mut self) {
        if let Ok(database) = env::var("MIGRATION_LINTER_DATABASE") {
            self.linter.database = Some(database);
        }

        if let Ok(analyser) = env::var("MIGRATION_LINTER_SQL_ANALYSER") {
            self.linter.sql_analyser = Some(analyser);
        }
    }

    /// Custom analyser entries as selector input
    pub fn custom_mapping(&self) -> CustomMapping {
        self.analysers
            .iter()
            .map(|(name, path)| (name.clone(), CustomAnalyser::Reference(path.clone())))
            .collect()
    }
}
