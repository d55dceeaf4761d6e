//! Table decoding: downloaded bytes -> `RawRecord`s.
//!
//! The source is normally an Excel workbook, but a plain CSV export with the
//! same columns is accepted too. The format is sniffed from the content, not
//! from the URL, because download links rarely carry a file extension.
//!
//! Only the schema is enforced here (the `data` and `preco` columns must
//! exist); value validation belongs to the series normalizer.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use tracing::{debug, warn};

use crate::domain::{DATE_COLUMN, PRICE_COLUMN, RawCell, RawRecord};
use crate::error::AppError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const ODS_MIMETYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";

/// Container format detected from the downloaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Office Open XML workbook (zip container).
    Xlsx,
    /// OpenDocument spreadsheet (zip container with an ODF mimetype entry).
    Ods,
    /// Legacy Excel workbook (OLE container).
    Xls,
    Csv,
}

impl TableFormat {
    /// File extension used for the local cache artifact.
    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Xlsx => "xlsx",
            TableFormat::Ods => "ods",
            TableFormat::Xls => "xls",
            TableFormat::Csv => "csv",
        }
    }

    pub fn is_spreadsheet(self) -> bool {
        self != TableFormat::Csv
    }
}

/// Detect the table format from magic bytes.
pub fn sniff_format(bytes: &[u8]) -> Result<TableFormat, AppError> {
    if bytes.starts_with(ZIP_MAGIC) {
        // ODF stores an uncompressed `mimetype` entry first, so its value sits in the first local header.
        let head = &bytes[..bytes.len().min(128)];
        let is_ods = head.windows(ODS_MIMETYPE.len()).any(|w| w == ODS_MIMETYPE);
        return Ok(if is_ods { TableFormat::Ods } else { TableFormat::Xlsx });
    }
    if bytes.starts_with(OLE_MAGIC) {
        return Ok(TableFormat::Xls);
    }

    let Ok(text) = std::str::from_utf8(bytes) else {
        return Err(AppError::ingestion(
            "Downloaded content is neither a spreadsheet nor UTF-8 text.",
        ));
    };

    let head = text.trim_start_matches('\u{feff}').trim_start();
    if head.is_empty() {
        return Err(AppError::ingestion("Downloaded dataset is empty."));
    }
    // File-hosting links answer with an HTML page when the file is not public.
    if head.starts_with('<') {
        return Err(AppError::ingestion(
            "Downloaded content is an HTML page, not a table (is the link public?).",
        ));
    }
    Ok(TableFormat::Csv)
}

/// Sniff the format, then decode a table into raw `(data, preco)` rows.
pub fn decode_table(bytes: &[u8]) -> Result<Vec<RawRecord>, AppError> {
    decode_table_as(sniff_format(bytes)?, bytes)
}

/// Decode a table whose format is already known.
pub fn decode_table_as(format: TableFormat, bytes: &[u8]) -> Result<Vec<RawRecord>, AppError> {
    let records = if format.is_spreadsheet() {
        decode_spreadsheet(bytes)?
    } else {
        decode_csv(bytes)?
    };
    debug!(rows = records.len(), ?format, "decoded source table");
    Ok(records)
}

/// Column positions of the required fields.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    price: usize,
}

fn resolve_columns<'a>(headers: impl IntoIterator<Item = &'a str>) -> Result<Columns, AppError> {
    let header_map: HashMap<String, usize> = headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect();

    let date = *header_map
        .get(DATE_COLUMN)
        .ok_or_else(|| AppError::ingestion(format!("Missing required column: `{DATE_COLUMN}`")))?;
    let price = *header_map
        .get(PRICE_COLUMN)
        .ok_or_else(|| AppError::ingestion(format!("Missing required column: `{PRICE_COLUMN}`")))?;

    Ok(Columns { date, price })
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_lowercase()
}

fn decode_spreadsheet(bytes: &[u8]) -> Result<Vec<RawRecord>, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::ingestion(format!("Failed to open spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::ingestion("Spreadsheet has no worksheets."))?
        .map_err(|e| AppError::ingestion(format!("Failed to read first worksheet: {e}")))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| AppError::ingestion("Spreadsheet is empty (no header row)."))?;
    let header_names: Vec<String> = header.iter().map(|c| c.to_string()).collect();
    let columns = resolve_columns(header_names.iter().map(String::as_str))?;

    let records = rows
        .enumerate()
        .map(|(idx, row)| RawRecord {
            line: idx + 2,
            date: spreadsheet_cell(row.get(columns.date)),
            price: spreadsheet_cell(row.get(columns.price)),
        })
        .collect();

    Ok(records)
}

fn spreadsheet_cell(cell: Option<&Data>) -> RawCell {
    match cell {
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) => text_cell(s),
        Some(Data::Float(v)) => RawCell::Number(*v),
        Some(Data::Int(v)) => RawCell::Number(*v as f64),
        Some(Data::DateTime(dt)) => dt.as_datetime().map(RawCell::DateTime).unwrap_or(RawCell::Empty),
        _ => RawCell::Empty,
    }
}

fn decode_csv(bytes: &[u8]) -> Result<Vec<RawRecord>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::ingestion(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = resolve_columns(headers.iter())?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        match result {
            Ok(record) => records.push(RawRecord {
                line,
                date: record.get(columns.date).map(text_cell).unwrap_or(RawCell::Empty),
                price: record.get(columns.price).map(text_cell).unwrap_or(RawCell::Empty),
            }),
            Err(e) => {
                // Keep the row so the normalizer accounts for it as dropped.
                warn!(line, error = %e, "CSV parse error");
                records.push(RawRecord {
                    line,
                    date: RawCell::Empty,
                    price: RawCell::Empty,
                });
            }
        }
    }

    Ok(records)
}

fn text_cell(s: &str) -> RawCell {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        RawCell::Empty
    } else {
        RawCell::Text(trimmed.to_string())
    }
}
