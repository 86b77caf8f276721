use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(path)?;
        tracing::info!("Opened sales database at {}", path.display());

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            -- One row per imported sales line
            CREATE TABLE IF NOT EXISTS sales_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fiscal_date DATE NOT NULL,
                point_of_sale TEXT NOT NULL,
                item_name TEXT NOT NULL,
                quantity REAL NOT NULL DEFAULT 0,
                unit_price REAL NOT NULL DEFAULT 0,
                discount REAL NOT NULL DEFAULT 0,
                service_charge REAL NOT NULL DEFAULT 0,
                total_value REAL NOT NULL DEFAULT 0,
                waiter_name TEXT,
                category TEXT,
                fallback_category TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_sales_data_fiscal_date
                ON sales_data (fiscal_date);

            CREATE INDEX IF NOT EXISTS idx_sales_data_dedup
                ON sales_data (fiscal_date, point_of_sale, item_name, total_value);
            ",
        )?;

        // Run migrations for existing databases (pass connection to avoid deadlock)
        Self::migrate_conn(&conn)?;

        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> Result<()> {
        let columns: Vec<String> = conn
            .prepare("PRAGMA table_info(sales_data)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        // Time of day arrived after the first exports
        if !columns.contains(&"fiscal_time".to_string()) {
            conn.execute("ALTER TABLE sales_data ADD COLUMN fiscal_time TEXT", [])?;
        }

        Ok(())
    }
}

pub trait DatabaseExt {
    fn db(&self) -> &Database;
}

impl DatabaseExt for crate::state::AppState {
    fn db(&self) -> &Database {
        &self.db
    }
}
