//! Spreadsheet import.
//!
//! Exports arrive with slightly different header names depending on the POS
//! version, so every field is looked up through [`COLUMN_ALIASES`]. For a
//! field with several matching headers the first non-empty cell in alias order
//! wins.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::commands::sales;
use crate::db::DatabaseExt;
use crate::error::{Error, Result};
use crate::models::{ImportSummary, NewSalesLine};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    FiscalDate,
    PointOfSale,
    ItemName,
    Quantity,
    UnitPrice,
    Discount,
    ServiceCharge,
    TotalValue,
    Waiter,
    FallbackCategory,
    Category,
}

pub const COLUMN_ALIASES: &[(Column, &[&str])] = &[
    (Column::FiscalDate, &["Data Fiscal", "data_fiscal"]),
    (
        Column::PointOfSale,
        &[
            "Nome PDV",
            "Nome PDV Lançamento",
            "nome_pdv",
            "nome_pdv_lancamento",
            "PDV",
            "Ponto de Venda",
        ],
    ),
    (Column::ItemName, &["Nome Item", "nome_item"]),
    (Column::Quantity, &["Quantidade", "quantidade"]),
    (Column::UnitPrice, &["Valor Produto", "valor_produto"]),
    (Column::Discount, &["Desconto", "desconto"]),
    (Column::ServiceCharge, &["Taxa Serviço", "tx_servico"]),
    (Column::TotalValue, &["Valor Total", "valor_total"]),
    (Column::Waiter, &["Atendente", "atendente"]),
    (Column::FallbackCategory, &["Grupo Fixo", "grupo_fixo"]),
    (Column::Category, &["Grupo", "grupo"]),
];

/// Header positions for each known column, in alias priority order.
#[derive(Debug, Default)]
pub struct HeaderMap {
    positions: HashMap<Column, Vec<usize>>,
}

impl HeaderMap {
    pub fn resolve(headers: &StringRecord) -> Self {
        let trimmed: Vec<&str> = headers.iter().map(str::trim).collect();
        let mut positions = HashMap::new();

        for (column, aliases) in COLUMN_ALIASES {
            let found: Vec<usize> = aliases
                .iter()
                .filter_map(|alias| trimmed.iter().position(|h| h == alias))
                .collect();
            if !found.is_empty() {
                positions.insert(*column, found);
            }
        }

        HeaderMap { positions }
    }

    pub fn has(&self, column: Column) -> bool {
        self.positions.contains_key(&column)
    }

    fn positions(&self, column: Column) -> &[usize] {
        self.positions.get(&column).map_or(&[], Vec::as_slice)
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: Column) -> Option<&'r str> {
        self.positions
            .get(&column)?
            .iter()
            .filter_map(|&i| record.get(i))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    fn text(&self, record: &StringRecord, column: Column) -> String {
        self.cell(record, column).unwrap_or_default().to_string()
    }

    fn optional_text(&self, record: &StringRecord, column: Column) -> Option<String> {
        self.cell(record, column).map(str::to_string)
    }

    fn number(&self, record: &StringRecord, column: Column) -> f64 {
        self.cell(record, column).map_or(0.0, parse_number)
    }
}

/// Accepts `1234.5`, `1234,5` and `1.234,50`. Anything else is 0.
pub fn parse_number(raw: &str) -> f64 {
    let raw = raw.trim().trim_start_matches("R$").trim();
    let normalized = if raw.contains(',') && raw.contains('.') {
        raw.replace('.', "").replace(',', ".")
    } else {
        raw.replace(',', ".")
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parses a fiscal date cell, keeping the time of day when there is one.
pub fn parse_fiscal_date(raw: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let raw = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some((dt.date(), Some(dt.time())));
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|date| (date, None))
}

/// Candidate lines read from a sheet, plus rows rejected while reading.
#[derive(Debug, Default)]
pub struct ParsedSheet {
    pub lines: Vec<NewSalesLine>,
    pub read: usize,
    pub rejected: usize,
}

/// Input formats the importer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Workbook,
}

impl SheetFormat {
    /// Picks the format from the file extension. Anything that is not a
    /// spreadsheet workbook is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("xlsx" | "xlsm" | "xls" | "xlsb" | "ods") => SheetFormat::Workbook,
            _ => SheetFormat::Csv,
        }
    }
}

fn parse_rows<I>(headers: &HeaderMap, records: I) -> Result<ParsedSheet>
where
    I: IntoIterator<Item = Result<StringRecord>>,
{
    if !headers.has(Column::PointOfSale) {
        tracing::warn!("No point-of-sale column found in sheet header");
    }

    let mut sheet = ParsedSheet::default();
    for (index, record) in records.into_iter().enumerate() {
        let record = record?;
        sheet.read += 1;
        let row = index + 1;

        let Some((fiscal_date, fiscal_time)) = headers
            .cell(&record, Column::FiscalDate)
            .and_then(parse_fiscal_date)
        else {
            tracing::warn!("Row {} skipped: fiscal date missing or unreadable", row);
            sheet.rejected += 1;
            continue;
        };

        sheet.lines.push(NewSalesLine {
            fiscal_date,
            fiscal_time,
            point_of_sale: headers.text(&record, Column::PointOfSale),
            item_name: headers.text(&record, Column::ItemName),
            quantity: headers.number(&record, Column::Quantity),
            unit_price: headers.number(&record, Column::UnitPrice),
            discount: headers.number(&record, Column::Discount),
            service_charge: headers.number(&record, Column::ServiceCharge),
            total_value: headers.number(&record, Column::TotalValue),
            waiter_name: headers.optional_text(&record, Column::Waiter),
            category: headers.optional_text(&record, Column::Category),
            fallback_category: headers.optional_text(&record, Column::FallbackCategory),
        });
    }

    Ok(sheet)
}

pub fn read_csv<R: Read>(reader: R, delimiter: u8) -> Result<ParsedSheet> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = HeaderMap::resolve(rdr.headers()?);
    parse_rows(&headers, rdr.records().map(|r| r.map_err(Error::from)))
}

fn format_date_time(date: NaiveDate, time: NaiveTime) -> String {
    if NaiveTime::from_hms_opt(0, 0, 0) == Some(time) {
        date.format("%Y-%m-%d").to_string()
    } else {
        format!("{} {}", date.format("%Y-%m-%d"), time.format("%H:%M:%S"))
    }
}

/// Converts an Excel serial day number (days since 1899-12-30) to a date
/// and, when the fraction is not zero, a time of day.
pub fn excel_serial_to_date_time(serial: f64) -> Option<(NaiveDate, NaiveTime)> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::days(serial.trunc() as i64))?;
    let seconds = (serial.fract() * 86_400.0).round() as u32;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds.min(86_399), 0)?;
    Some((date, time))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| format_date_time(d.date(), d.time()))
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Date columns may hold raw serial numbers when the cell carries no date
/// format.
fn date_cell_text(cell: &Data) -> String {
    let serial = match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        _ => None,
    };
    serial
        .and_then(excel_serial_to_date_time)
        .map(|(date, time)| format_date_time(date, time))
        .unwrap_or_else(|| cell_text(cell))
}

/// Reads the first sheet of a workbook (xlsx, xls, ods). The first row is the
/// header row.
pub fn read_workbook(bytes: &[u8]) -> Result<ParsedSheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Import("workbook has no sheets".to_string()))??;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(Error::Import("first sheet is empty".to_string()));
    };
    let headers = HeaderMap::resolve(&header_row.iter().map(cell_text).collect::<StringRecord>());
    let date_columns = headers.positions(Column::FiscalDate).to_vec();

    let records = rows.map(|row| {
        Ok(row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if date_columns.contains(&i) {
                    date_cell_text(cell)
                } else {
                    cell_text(cell)
                }
            })
            .collect::<StringRecord>())
    });
    parse_rows(&headers, records)
}

fn is_valid(line: &NewSalesLine) -> bool {
    !line.point_of_sale.trim().is_empty() && !line.item_name.trim().is_empty()
}

/// Validates, de-duplicates and stores candidate lines in one transaction.
///
/// Lines without a point of sale or item name are rejected. Lines whose
/// (fiscal date, point of sale, item, total) tuple is already stored are
/// skipped. The store is checked before anything is inserted, so identical
/// lines within one batch are separate sales and all of them are kept.
pub fn import_lines(app: &AppState, candidates: Vec<NewSalesLine>) -> Result<ImportSummary> {
    let mut summary = ImportSummary {
        read: candidates.len(),
        ..ImportSummary::default()
    };

    let mut valid = Vec::with_capacity(candidates.len());
    for (index, line) in candidates.into_iter().enumerate() {
        if is_valid(&line) {
            valid.push(line);
        } else {
            tracing::warn!("Line {} ignored: point of sale or item name is empty", index + 1);
            summary.rejected += 1;
        }
    }

    if valid.is_empty() {
        return Err(Error::Import(
            "no valid records found; check that the point-of-sale column is present and filled"
                .to_string(),
        ));
    }

    let mut conn = app.db().lock()?;
    let tx = conn.transaction()?;

    let mut fresh = Vec::with_capacity(valid.len());
    for line in &valid {
        if sales::exists_conn(&tx, line)? {
            summary.duplicates += 1;
        } else {
            fresh.push(line);
        }
    }
    for line in fresh {
        sales::insert_conn(&tx, line)?;
        summary.inserted += 1;
    }

    tx.commit()?;
    drop(conn);

    if summary.inserted > 0 {
        app.cache.invalidate_all();
    }

    tracing::info!(
        "Import finished: {} read, {} rejected, {} duplicates, {} inserted",
        summary.read,
        summary.rejected,
        summary.duplicates,
        summary.inserted
    );
    Ok(summary)
}

fn import_sheet(app: &AppState, sheet: ParsedSheet) -> Result<ImportSummary> {
    let mut summary = import_lines(app, sheet.lines)?;
    summary.read = sheet.read;
    summary.rejected += sheet.rejected;
    Ok(summary)
}

/// Reads a CSV export and imports it. Rows dropped while reading (bad date)
/// count as rejected.
pub fn import_csv<R: Read>(app: &AppState, reader: R, delimiter: u8) -> Result<ImportSummary> {
    import_sheet(app, read_csv(reader, delimiter)?)
}

/// Reads the first sheet of a workbook export and imports it.
pub fn import_workbook(app: &AppState, bytes: &[u8]) -> Result<ImportSummary> {
    import_sheet(app, read_workbook(bytes)?)
}
