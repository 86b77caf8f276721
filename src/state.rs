use std::time::Duration;

use crate::cache::ReportCache;
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;

/// Everything a command needs: the store, the settings and the fetch cache.
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub cache: ReportCache,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Result<Self> {
        db.initialize()?;
        let cache = ReportCache::new(Duration::from_secs(config.cache.stale_secs));
        Ok(AppState { db, config, cache })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::new(Database::open_in_memory()?, config)
    }
}
