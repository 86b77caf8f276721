//! JSON backup of a date range, restore and full reset.

use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::commands::{import, sales};
use crate::db::{Database, DatabaseExt};
use crate::error::{Error, Result};
use crate::models::{DateRange, FilterSpec, ImportSummary, NewSalesLine, SalesLine};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupOutcome {
    pub path: PathBuf,
    pub exported: usize,
    pub purged: usize,
}

pub fn backup_file_name(from: NaiveDate, to: NaiveDate) -> String {
    format!("marea-backup-{}_ate_{}.json", from, to)
}

pub fn export_range(db: &Database, from: NaiveDate, to: NaiveDate) -> Result<Vec<SalesLine>> {
    let filter = FilterSpec {
        date_range: Some(DateRange::new(from, to)),
        ..FilterSpec::default()
    };
    sales::query(db, &filter)
}

pub fn write_backup<W: Write>(records: &[SalesLine], writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Writes every record in `[from, to]` to a file in `dir` and, when `purge`
/// is set, deletes that range once the file is on disk.
pub fn backup_range(
    app: &AppState,
    from: NaiveDate,
    to: NaiveDate,
    dir: &Path,
    purge: bool,
) -> Result<BackupOutcome> {
    let records = export_range(app.db(), from, to)?;
    if records.is_empty() {
        return Err(Error::NothingToBackup);
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(backup_file_name(from, to));
    let file = File::create(&path)?;
    write_backup(&records, &file)?;
    file.sync_all()?;

    tracing::info!("Backed up {} records to {}", records.len(), path.display());

    let purged = if purge {
        let deleted = sales::delete_range(app.db(), from, to)?;
        app.cache.invalidate_all();
        tracing::info!("Purged {} records between {} and {}", deleted, from, to);
        deleted
    } else {
        0
    };

    Ok(BackupOutcome {
        path,
        exported: records.len(),
        purged,
    })
}

/// Parses a backup file. The top level must be a JSON array of sales lines.
pub fn read_backup<R: Read>(reader: R) -> Result<Vec<SalesLine>> {
    let value: serde_json::Value =
        serde_json::from_reader(reader).map_err(|e| Error::InvalidBackup(e.to_string()))?;
    if !value.is_array() {
        return Err(Error::InvalidBackup(
            "expected a JSON array of sales records".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| Error::InvalidBackup(e.to_string()))
}

/// Restores a backup through the import path, so records already present are
/// skipped and restoring twice is a no-op.
pub fn restore<R: Read>(app: &AppState, reader: R) -> Result<ImportSummary> {
    let records = read_backup(reader)?;
    if records.is_empty() {
        return Err(Error::InvalidBackup("backup contains no records".to_string()));
    }

    tracing::info!("Restoring {} records from backup", records.len());
    let lines: Vec<NewSalesLine> = records.into_iter().map(NewSalesLine::from).collect();
    let summary = import::import_lines(app, lines)?;
    app.cache.invalidate_all();
    Ok(summary)
}

pub fn reset(app: &AppState) -> Result<usize> {
    let deleted = sales::delete_all(app.db())?;
    app.cache.invalidate_all();
    tracing::warn!("Deleted all {} sales records", deleted);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_file_name() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            backup_file_name(from, to),
            "marea-backup-2024-01-01_ate_2024-03-31.json"
        );
    }

    #[test]
    fn test_read_backup_rejects_non_array() {
        let err = read_backup(r#"{"id": 1}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidBackup(_)));

        let err = read_backup("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidBackup(_)));
    }

    #[test]
    fn test_read_backup_empty_array() {
        let records = read_backup("[]".as_bytes()).unwrap();
        assert!(records.is_empty());
    }
}
