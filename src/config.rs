use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub goals: GoalsConfig,
    pub limits: LimitsConfig,
    pub cache: CacheConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Revenue targets used by the monthly series and waiter attainment.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GoalsConfig {
    pub monthly_revenue: f64,
    pub waiter_daily: f64,
}

/// Advisory record-count thresholds. Nothing is enforced.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    pub warn_records: i64,
    pub max_records: i64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub stale_secs: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "marea_sales.db"

[goals]
monthly_revenue = 50000.0
waiter_daily = 2000.0

[limits]
warn_records = 25000
max_records = 30000

[cache]
stale_secs = 30

[log]
level = "info"
"#;

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "marea_sales.db".to_string(),
        }
    }
}

impl Default for GoalsConfig {
    fn default() -> Self {
        GoalsConfig {
            monthly_revenue: 50000.0,
            waiter_daily: 2000.0,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            warn_records: 25000,
            max_records: 30000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { stale_secs: 30 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Load configuration
///
/// Uses `path` when given, otherwise the embedded default. Runs before the
/// tracing subscriber exists, so it does not log.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            Config::from_toml(&contents)
        }
        None => Config::from_toml(DEFAULT_CONFIG),
    }
}

/// Resolves the database path. Relative paths are taken relative to the
/// directory of the config file, or the working directory without one.
pub fn get_database_path(config: &Config, config_path: Option<&Path>) -> PathBuf {
    let db_path = Path::new(&config.database.path);
    if db_path.is_absolute() {
        return db_path.to_path_buf();
    }
    match config_path.and_then(Path::parent) {
        Some(dir) => dir.join(db_path),
        None => db_path.to_path_buf(),
    }
}
