use std::io::{Cursor, Write};
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};

use super::classify::ClassifiedRecord;

pub const REPORT_FILE_NAME: &str = "follow_up_report.xlsx";
pub const REPORT_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Header row of the report, in column order.
pub const REPORT_COLUMNS: [&str; 9] = [
    "student_id",
    "full_name",
    "license_number",
    "license_expire_date",
    "phone",
    "email",
    "faculty",
    "program",
    "status",
];

const SHEET_NAME: &str = "Follow-up";

/// Spreadsheet apps need the byte-order mark to read UTF-8 names correctly.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Every `.xlsx` is a zip archive.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Nothing matched the current filters; informational, not a failure.
    #[error("no records match the current filters")]
    NoRows,

    #[error("Excel write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Excel read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The bytes parsed but are not a follow-up report.
    #[error("not a follow-up report: {0}")]
    Layout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialisation of the report file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Excel workbook, one sheet; every cell is text.
    #[default]
    Xlsx,
    /// UTF-8 CSV with a byte-order mark.
    Csv,
}

impl ReportFormat {
    /// Pick the format from a save path; anything but `.csv` is a workbook.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ReportFormat::Csv,
            _ => ReportFormat::Xlsx,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ReportFormat::Xlsx => REPORT_FILE_NAME,
            ReportFormat::Csv => "follow_up_report.csv",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ReportFormat::Xlsx => REPORT_MIME,
            ReportFormat::Csv => "text/csv",
        }
    }
}

// ---------------------------------------------------------------------------
// ReportRow – the nine exported columns
// ---------------------------------------------------------------------------

/// One row of the follow-up report. Field order is column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub student_id: String,
    pub full_name: String,
    pub license_number: String,
    /// ISO date, or blank when unknown.
    pub license_expire_date: String,
    pub phone: String,
    pub email: String,
    pub faculty: String,
    pub program: String,
    pub status: String,
}

impl From<&ClassifiedRecord> for ReportRow {
    fn from(c: &ClassifiedRecord) -> Self {
        let r = &c.record;
        ReportRow {
            student_id: r.student_id.clone(),
            full_name: r.full_name.clone(),
            license_number: r.license_number.clone(),
            license_expire_date: r
                .expire_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            phone: r.phone.clone(),
            email: r.email.clone(),
            faculty: r.faculty.clone(),
            program: r.program.clone(),
            status: c.status.label().to_string(),
        }
    }
}

impl ReportRow {
    /// Cell values in [`REPORT_COLUMNS`] order.
    pub fn cells(&self) -> [&str; 9] {
        [
            self.student_id.as_str(),
            self.full_name.as_str(),
            self.license_number.as_str(),
            self.license_expire_date.as_str(),
            self.phone.as_str(),
            self.email.as_str(),
            self.faculty.as_str(),
            self.program.as_str(),
            self.status.as_str(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Most urgent first: ascending days, unknown dates last. Stable, so equal
/// days keep their input order.
pub fn sort_by_urgency(records: &[ClassifiedRecord], indices: &[usize]) -> Vec<usize> {
    let mut out = indices.to_vec();
    out.sort_by_key(|&i| {
        let days = records[i].days_until_expire;
        (days.is_none(), days)
    });
    out
}

/// Project the given records, in the given order, onto the report columns.
pub fn report_rows(records: &[ClassifiedRecord], indices: &[usize]) -> Vec<ReportRow> {
    indices.iter().map(|&i| ReportRow::from(&records[i])).collect()
}

// ---------------------------------------------------------------------------
// Serialisation
// ---------------------------------------------------------------------------

/// A ready-to-save report.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub rows: usize,
}

impl ReportArtifact {
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(&self.bytes)?;
        file.flush()
    }
}

/// Sort the filtered records by urgency and serialise them as a workbook.
pub fn export_report(
    records: &[ClassifiedRecord],
    indices: &[usize],
) -> Result<ReportArtifact, ExportError> {
    export_report_as(records, indices, ReportFormat::Xlsx)
}

pub fn export_report_as(
    records: &[ClassifiedRecord],
    indices: &[usize],
    format: ReportFormat,
) -> Result<ReportArtifact, ExportError> {
    if indices.is_empty() {
        return Err(ExportError::NoRows);
    }
    let rows = report_rows(records, &sort_by_urgency(records, indices));

    let bytes = match format {
        ReportFormat::Xlsx => write_xlsx(&rows)?,
        ReportFormat::Csv => write_csv(&rows)?,
    };

    log::info!("Built {format:?} follow-up report with {} rows", rows.len());
    Ok(ReportArtifact {
        file_name: format.file_name(),
        mime: format.mime(),
        bytes,
        rows: rows.len(),
    })
}

fn write_xlsx(rows: &[ReportRow]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, title) in REPORT_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    // Strings throughout, so IDs and phone numbers keep their leading zeros.
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, value) in row.cells().into_iter().enumerate() {
            sheet.write_string(r, col as u16, value)?;
        }
    }
    sheet.set_freeze_panes(1, 0)?;
    sheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

fn write_csv(rows: &[ReportRow]) -> Result<Vec<u8>, ExportError> {
    let mut buf = UTF8_BOM.to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

/// Parse a report produced by [`export_report_as`], in either format.
pub fn read_report(bytes: &[u8]) -> Result<Vec<ReportRow>, ExportError> {
    if bytes.starts_with(ZIP_MAGIC) {
        read_xlsx(bytes)
    } else {
        read_csv(bytes)
    }
}

fn read_xlsx(bytes: &[u8]) -> Result<Vec<ReportRow>, ExportError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ExportError::Layout("the workbook has no sheets".into()))??;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(cell_text).collect())
        .unwrap_or_default();
    if header != REPORT_COLUMNS {
        return Err(ExportError::Layout(format!("unexpected header {header:?}")));
    }

    Ok(rows
        .map(|cells| {
            let mut it = cells.iter().map(cell_text);
            let mut next = || it.next().unwrap_or_default();
            ReportRow {
                student_id: next(),
                full_name: next(),
                license_number: next(),
                license_expire_date: next(),
                phone: next(),
                email: next(),
                faculty: next(),
                program: next(),
                status: next(),
            }
        })
        .collect())
}

fn read_csv(bytes: &[u8]) -> Result<Vec<ReportRow>, ExportError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = csv::Reader::from_reader(body);
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<ReportRow>, csv::Error>>()?;
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{LicenseRecord, StatusCategory};
    use chrono::NaiveDate;

    fn rec(id: &str, days: Option<i64>) -> ClassifiedRecord {
        ClassifiedRecord {
            record: LicenseRecord {
                student_id: id.into(),
                full_name: format!("Holder {id}"),
                license_number: format!("L-{id}"),
                expire_date: days.map(|d| {
                    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap() + chrono::Duration::days(d)
                }),
                phone: "081-000-0000".into(),
                email: format!("{id}@example.com"),
                faculty: "Nursing".into(),
                program: "BSN, evening".into(),
            },
            days_until_expire: days,
            status: StatusCategory::from_days(days),
        }
    }

    #[test]
    fn urgency_sort_puts_unknown_last() {
        let records = vec![
            rec("a", Some(40)),
            rec("b", None),
            rec("c", Some(-10)),
            rec("d", Some(40)),
            rec("e", Some(0)),
            rec("f", None),
        ];
        let all: Vec<usize> = (0..records.len()).collect();
        assert_eq!(sort_by_urgency(&records, &all), vec![2, 4, 0, 3, 1, 5]);
    }

    #[test]
    fn empty_selection_has_no_artifact() {
        let records = vec![rec("a", Some(1))];
        assert!(matches!(
            export_report(&records, &[]),
            Err(ExportError::NoRows)
        ));
    }

    #[test]
    fn export_reads_back_in_order() {
        let records = vec![
            rec("a", Some(20)),
            rec("b", None),
            rec("c", Some(-10)),
            rec("ก", Some(5)),
        ];
        let artifact = export_report(&records, &[0, 1, 2, 3]).unwrap();
        assert_eq!(artifact.file_name, "follow_up_report.xlsx");
        assert_eq!(
            artifact.mime,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(artifact.rows, 4);
        assert!(artifact.bytes.starts_with(b"PK"));

        let back = read_report(&artifact.bytes).unwrap();
        let expected = report_rows(&records, &[2, 3, 0, 1]);
        assert_eq!(back, expected);
        assert_eq!(back[0].status, "Expired");
        assert_eq!(back[0].license_expire_date, "2025-05-22");
        assert_eq!(back[1].student_id, "ก");
        assert_eq!(back[3].license_expire_date, "");
        assert_eq!(back[3].status, "Unspecified");
        assert_eq!(back[1].program, "BSN, evening");
    }

    #[test]
    fn numeric_looking_text_stays_text() {
        let mut r = rec("001", Some(3));
        r.record.phone = "0811111111".into();
        let artifact = export_report(&[r], &[0]).unwrap();
        let back = read_report(&artifact.bytes).unwrap();
        assert_eq!(back[0].student_id, "001");
        assert_eq!(back[0].phone, "0811111111");
    }

    #[test]
    fn workbook_header_has_nine_columns_in_order() {
        let artifact = export_report(&[rec("a", Some(1))], &[0]).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(&artifact.bytes[..])).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        assert_eq!(range.get_size(), (2, 9));
        let header: Vec<String> = range.rows().next().unwrap().iter().map(cell_text).collect();
        assert_eq!(header, REPORT_COLUMNS);
    }

    #[test]
    fn csv_alternate_has_bom_and_header() {
        let artifact = export_report_as(&[rec("a", Some(1))], &[0], ReportFormat::Csv).unwrap();
        assert_eq!(artifact.file_name, "follow_up_report.csv");
        assert_eq!(artifact.mime, "text/csv");
        assert!(artifact.bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(artifact.bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().next().unwrap(), REPORT_COLUMNS.join(","));
        assert_eq!(read_report(&artifact.bytes).unwrap()[0].student_id, "a");
    }

    #[test]
    fn format_follows_save_extension() {
        assert_eq!(ReportFormat::from_path(Path::new("out.CSV")), ReportFormat::Csv);
        assert_eq!(ReportFormat::from_path(Path::new("out.xlsx")), ReportFormat::Xlsx);
        assert_eq!(ReportFormat::from_path(Path::new("out")), ReportFormat::Xlsx);
    }

    #[test]
    fn foreign_workbook_is_rejected() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().write_string(0, 0, "hello").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();
        assert!(matches!(read_report(&bytes), Err(ExportError::Layout(_))));
    }

    #[test]
    fn artifact_writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(REPORT_FILE_NAME);
        let artifact = export_report(&[rec("a", Some(1))], &[0]).unwrap();
        artifact.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes);
        assert_eq!(read_report(&artifact.bytes).unwrap().len(), 1);
    }
}
