use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use calamine::{open_workbook_auto, Data, Range, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::dates::{from_excel_serial, parse_date};
use super::model::{
    LicenseRecord, RawTable, RecordSet, COL_EMAIL, COL_EXPIRE_DATE, COL_FACULTY, COL_FULL_NAME,
    COL_LICENSE_NUMBER, COL_PHONE, COL_PROGRAM, COL_STUDENT_ID,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Conditions that stop a load. Optional-column gaps and bad dates are not
/// errors; see [`RecordSet::warnings`] and [`RecordSet::unparsed_dates`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unsupported file type '.{0}' (expected .csv, .xlsx, .xls, .json or .parquet)")]
    UnsupportedFormat(String),

    /// The file could not be read as a table at all.
    #[error("could not read file: {0:#}")]
    Read(anyhow::Error),

    /// Readable, but there is nothing to classify.
    #[error("{0}")]
    Schema(String),

    #[error("required column '{column}' not found")]
    MissingColumn { column: &'static str },
}

impl LoadError {
    /// Follow-up hint shown under the error message, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            LoadError::MissingColumn { .. } => None,
            _ => Some("Please check the file format and its contents."),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a license roster from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by one row per license holder
/// * `.xlsx`    – first worksheet, same layout as CSV (also `.xls`)
/// * `.json`    – `[{ "student_id": "...", "license_expire_date": "...", ... }, ...]`
/// * `.parquet` – any scalar column types; date/timestamp columns are accepted
pub fn load_file(path: &Path) -> Result<RecordSet, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => std::fs::File::open(path)
            .context("opening CSV file")
            .and_then(read_csv),
        "xlsx" | "xls" => read_workbook(path),
        "json" => read_json(path),
        "parquet" | "pq" => read_parquet(path),
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    }
    .map_err(LoadError::Read)?;

    log::debug!(
        "Read {} rows with columns {:?} from {}",
        table.rows.len(),
        table.columns,
        path.display()
    );
    build_record_set(table)
}

/// Load CSV data from any reader (e.g. bytes already in memory).
pub fn load_csv_reader<R: Read>(reader: R) -> Result<RecordSet, LoadError> {
    let table = read_csv(reader).map_err(LoadError::Read)?;
    build_record_set(table)
}

/// Type the rows of a raw table.
///
/// Fails only when the table has no header, no rows, or no expiry column.
pub fn build_record_set(table: RawTable) -> Result<RecordSet, LoadError> {
    if table.columns.is_empty() {
        return Err(LoadError::Schema("the file has no header row".into()));
    }
    if table.rows.is_empty() {
        return Err(LoadError::Schema("the file contains no data rows".into()));
    }
    let expire_idx = table
        .column_index(COL_EXPIRE_DATE)
        .ok_or(LoadError::MissingColumn {
            column: COL_EXPIRE_DATE,
        })?;

    let idx = |name: &str| table.column_index(name);
    let (id_idx, name_idx, number_idx) = (
        idx(COL_STUDENT_ID),
        idx(COL_FULL_NAME),
        idx(COL_LICENSE_NUMBER),
    );
    let (phone_idx, email_idx) = (idx(COL_PHONE), idx(COL_EMAIL));
    let (faculty_idx, program_idx) = (idx(COL_FACULTY), idx(COL_PROGRAM));

    let mut unparsed_dates = 0;
    let records: Vec<LicenseRecord> = table
        .rows
        .iter()
        .map(|row| {
            let cell = |i: Option<usize>| -> String {
                i.and_then(|i| row.get(i))
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default()
            };
            let raw_date = cell(Some(expire_idx));
            let expire_date = parse_date(&raw_date);
            if expire_date.is_none() && !raw_date.is_empty() {
                unparsed_dates += 1;
            }
            LicenseRecord {
                student_id: cell(id_idx),
                full_name: cell(name_idx),
                license_number: cell(number_idx),
                expire_date,
                phone: cell(phone_idx),
                email: cell(email_idx),
                faculty: cell(faculty_idx),
                program: cell(program_idx),
            }
        })
        .collect();

    if unparsed_dates > 0 {
        log::warn!("{unparsed_dates} expiry date(s) could not be parsed; marked unspecified");
    }

    let set = RecordSet {
        records,
        has_faculty: faculty_idx.is_some(),
        has_program: program_idx.is_some(),
        unparsed_dates,
        raw: table,
    };
    for w in set.warnings() {
        log::warn!("{w}");
    }
    log::info!("Loaded {} license records", set.len());
    Ok(set)
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(columns.len(), String::new());
        rows.push(row);
    }

    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// Excel reader
// ---------------------------------------------------------------------------

/// First worksheet only. The first non-empty row is the header.
fn read_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("the workbook has no worksheets")?
        .context("reading first worksheet")?;
    Ok(sheet_to_table(&range))
}

fn sheet_to_table(range: &Range<Data>) -> RawTable {
    let mut rows = range
        .rows()
        .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|cells| cells.iter().map(sheet_cell).collect::<Vec<String>>());

    let columns = rows.next().unwrap_or_default();
    let rows = rows
        .map(|mut row| {
            row.resize(columns.len(), String::new());
            row
        })
        .collect();
    RawTable { columns, rows }
}

/// Render a cell the way the CSV reader would see it. Date-formatted
/// cells become ISO dates; whole numbers print without a fraction.
fn sheet_cell(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(dt) => from_excel_serial(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
    }
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
/// Columns are the union of keys across all rows.
fn read_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}

fn json_to_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Cells are rendered with Arrow's display
/// formatting, so `Date32` and timestamps arrive as ISO strings.
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            rows.push(cells);
        }
    }

    Ok(RawTable { columns, rows })
}

fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    array_value_to_string(col.as_ref(), row)
        .with_context(|| format!("formatting {:?} value", col.data_type()))
}
