//! Fetch side of the sales store: filtered queries, counts and bulk writes.

use chrono::NaiveDate;
use rusqlite::{Connection, Row, ToSql};
use serde::Serialize;

use crate::analytics;
use crate::config::LimitsConfig;
use crate::db::Database;
use crate::error::Result;
use crate::models::{FilterOptions, FilterSpec, NewSalesLine, SalesLine};

const SELECT_SALES_LINE: &str = "SELECT id, fiscal_date, fiscal_time, point_of_sale, item_name, quantity,
        unit_price, discount, service_charge, total_value, waiter_name, category,
        fallback_category, created_at
     FROM sales_data WHERE 1=1";

fn row_to_sales_line(row: &Row<'_>) -> rusqlite::Result<SalesLine> {
    Ok(SalesLine {
        id: row.get(0)?,
        fiscal_date: row.get(1)?,
        fiscal_time: row.get(2)?,
        point_of_sale: row.get(3)?,
        item_name: row.get(4)?,
        quantity: row.get(5)?,
        unit_price: row.get(6)?,
        discount: row.get(7)?,
        service_charge: row.get(8)?,
        total_value: row.get(9)?,
        waiter_name: row.get(10)?,
        category: row.get(11)?,
        fallback_category: row.get(12)?,
        created_at: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
    })
}

/// Appends the filter's predicates as bound parameters.
fn append_filter_clauses(sql: &mut String, params: &mut Vec<Box<dyn ToSql>>, filter: &FilterSpec) {
    if let Some(range) = filter.date_range {
        if let Some(from) = range.from {
            sql.push_str(" AND fiscal_date >= ?");
            params.push(Box::new(from));
        }
        if let Some(to) = range.to {
            sql.push_str(" AND fiscal_date <= ?");
            params.push(Box::new(to));
        }
    }
    if !filter.categories.is_empty() {
        let placeholders = vec!["?"; filter.categories.len()].join(", ");
        sql.push_str(&format!(" AND category IN ({})", placeholders));
        for category in &filter.categories {
            params.push(Box::new(category.clone()));
        }
    }
    if let Some(waiter) = filter.waiter.as_only() {
        sql.push_str(" AND waiter_name = ?");
        params.push(Box::new(waiter.to_string()));
    }
    if let Some(pdv) = filter.point_of_sale.as_only() {
        sql.push_str(" AND point_of_sale = ?");
        params.push(Box::new(pdv.to_string()));
    }
}

pub fn query_conn(conn: &Connection, filter: &FilterSpec) -> Result<Vec<SalesLine>> {
    let mut sql = String::from(SELECT_SALES_LINE);
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    append_filter_clauses(&mut sql, &mut params_vec, filter);
    sql.push_str(" ORDER BY fiscal_date ASC, id ASC");

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let lines = stmt
        .query_map(params_refs.as_slice(), row_to_sales_line)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(lines)
}

/// All sales lines matching `filter`.
pub fn query(db: &Database, filter: &FilterSpec) -> Result<Vec<SalesLine>> {
    let conn = db.lock()?;
    let lines = query_conn(&conn, filter)?;
    tracing::debug!("Fetched {} sales lines", lines.len());
    Ok(lines)
}

pub fn count(db: &Database, filter: &FilterSpec) -> Result<i64> {
    let conn = db.lock()?;

    let mut sql = String::from("SELECT COUNT(*) FROM sales_data WHERE 1=1");
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    append_filter_clauses(&mut sql, &mut params_vec, filter);
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

    let total: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
    Ok(total)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CapacityStatus {
    Ok,
    Warning { count: i64, limit: i64 },
    OverLimit { count: i64, limit: i64 },
}

pub fn capacity_status(count: i64, limits: &LimitsConfig) -> CapacityStatus {
    if count >= limits.max_records {
        CapacityStatus::OverLimit {
            count,
            limit: limits.max_records,
        }
    } else if count > limits.warn_records {
        CapacityStatus::Warning {
            count,
            limit: limits.max_records,
        }
    } else {
        CapacityStatus::Ok
    }
}

/// Counts every stored record and logs an advisory when the store is close to
/// its operational limit. Never blocks anything.
pub fn check_capacity(db: &Database, limits: &LimitsConfig) -> Result<CapacityStatus> {
    let total = count(db, &FilterSpec::default())?;
    let status = capacity_status(total, limits);
    match status {
        CapacityStatus::Ok => {}
        CapacityStatus::Warning { count, limit } | CapacityStatus::OverLimit { count, limit } => {
            tracing::warn!(
                "You have {} records. The limit is {} records. Consider backing up old data.",
                count,
                limit
            );
        }
    }
    Ok(status)
}

pub fn filter_options(db: &Database) -> Result<FilterOptions> {
    let lines = query(db, &FilterSpec::default())?;
    Ok(analytics::filter_options(&lines))
}

/// Duplicate-detection tuple of the import contract.
pub fn exists_conn(conn: &Connection, line: &NewSalesLine) -> Result<bool> {
    let found: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sales_data
         WHERE fiscal_date = ?1 AND point_of_sale = ?2 AND item_name = ?3 AND total_value = ?4",
        rusqlite::params![line.fiscal_date, line.point_of_sale, line.item_name, line.total_value],
        |row| row.get(0),
    )?;
    Ok(found > 0)
}

pub fn insert_conn(conn: &Connection, line: &NewSalesLine) -> Result<i64> {
    conn.execute(
        "INSERT INTO sales_data (fiscal_date, fiscal_time, point_of_sale, item_name, quantity,
            unit_price, discount, service_charge, total_value, waiter_name, category, fallback_category)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            line.fiscal_date,
            line.fiscal_time,
            line.point_of_sale,
            line.item_name,
            line.quantity,
            line.unit_price,
            line.discount,
            line.service_charge,
            line.total_value,
            line.waiter_name,
            line.category,
            line.fallback_category,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_range(db: &Database, from: NaiveDate, to: NaiveDate) -> Result<usize> {
    let conn = db.lock()?;
    let deleted = conn.execute(
        "DELETE FROM sales_data WHERE fiscal_date >= ?1 AND fiscal_date <= ?2",
        rusqlite::params![from, to],
    )?;
    Ok(deleted)
}

pub fn delete_all(db: &Database) -> Result<usize> {
    let conn = db.lock()?;
    let deleted = conn.execute("DELETE FROM sales_data", [])?;
    Ok(deleted)
}
