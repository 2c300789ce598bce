use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;
use rust_xlsxwriter::{Format, Workbook};

use license_monitor::data::model::{
    COL_EMAIL, COL_EXPIRE_DATE, COL_FACULTY, COL_FULL_NAME, COL_LICENSE_NUMBER, COL_PHONE,
    COL_PROGRAM, COL_STUDENT_ID,
};

const ROWS: usize = 200;

const FACULTIES: &[(&str, &[&str])] = &[
    ("Nursing", &["BSN", "MSN", "Midwifery"]),
    ("Pharmacy", &["PharmD", "Industrial Pharmacy"]),
    ("Medical Technology", &["Clinical Chemistry", "Microbiology"]),
    ("Public Health", &["Occupational Safety", "Environmental Health"]),
];

const FIRST_NAMES: &[&str] = &[
    "Anong", "Boonsri", "Chai", "Darunee", "Ekkachai", "Fah", "Ganya", "Hathai", "Itsara",
    "Jirapat", "Kanya", "Lamai", "Malee", "Nattapong", "Orn", "Pim", "Rattana", "Somchai",
    "Tida", "Wichai",
];

const LAST_NAMES: &[&str] = &[
    "Srisuk", "Chaiyaporn", "Wongsawat", "Rattanakul", "Boonmee", "Thongdee", "Kaewmanee",
    "Phromma", "Sukjai", "Intharasuk",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }
}

/// Expiry offset in days: spread across every status band, with a tail of
/// long-valid licenses. `None` means the date cell is left broken.
fn expiry_offset(rng: &mut SimpleRng) -> Option<i64> {
    match rng.below(20) {
        0 => None,
        1..=4 => Some(-(rng.below(400) as i64)),
        5..=8 => Some(rng.below(31) as i64),
        9..=12 => Some(31 + rng.below(60) as i64),
        _ => Some(91 + rng.below(1000) as i64),
    }
}

struct Row {
    student_id: String,
    full_name: String,
    license_number: String,
    expire: Option<NaiveDate>,
    expire_text: String,
    phone: String,
    email: String,
    faculty: String,
    program: String,
}

fn generate_rows(today: NaiveDate, rng: &mut SimpleRng) -> Vec<Row> {
    (0..ROWS)
        .map(|i| {
            let first = rng.pick(FIRST_NAMES);
            let last = rng.pick(LAST_NAMES);
            let (faculty, programs) = rng.pick(FACULTIES);
            let program = rng.pick(*programs);
            let expire = expiry_offset(rng).map(|d| today + Duration::days(d));
            let expire_text = match expire {
                Some(d) => d.format("%Y-%m-%d").to_string(),
                None if i % 2 == 0 => String::new(),
                None => "pending".to_string(),
            };
            Row {
                student_id: format!("{:08}", 64_000_000 + i),
                full_name: format!("{first} {last}"),
                license_number: format!("LIC-{:06}", rng.below(1_000_000)),
                expire,
                expire_text,
                phone: format!("08{:08}", rng.below(100_000_000)),
                email: format!("{}.{}@example.ac.th", first.to_lowercase(), last.to_lowercase()),
                faculty: faculty.to_string(),
                program: program.to_string(),
            }
        })
        .collect()
}

fn write_csv(rows: &[Row], path: &str) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        COL_STUDENT_ID,
        COL_FULL_NAME,
        COL_LICENSE_NUMBER,
        COL_EXPIRE_DATE,
        COL_PHONE,
        COL_EMAIL,
        COL_FACULTY,
        COL_PROGRAM,
    ])?;
    for r in rows {
        writer.write_record([
            &r.student_id,
            &r.full_name,
            &r.license_number,
            &r.expire_text,
            &r.phone,
            &r.email,
            &r.faculty,
            &r.program,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Same roster as a workbook. Real dates are stored as date cells, broken
/// ones as the text they would have in CSV.
fn write_xlsx(rows: &[Row], path: &str) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    let header = [
        COL_STUDENT_ID,
        COL_FULL_NAME,
        COL_LICENSE_NUMBER,
        COL_EXPIRE_DATE,
        COL_PHONE,
        COL_EMAIL,
        COL_FACULTY,
        COL_PROGRAM,
    ];
    for (col, title) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }
    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &r.student_id)?;
        sheet.write_string(row, 1, &r.full_name)?;
        sheet.write_string(row, 2, &r.license_number)?;
        match r.expire {
            Some(d) => {
                let serial = (d - excel_epoch()).num_days() as f64;
                sheet.write_number_with_format(row, 3, serial, &date)?;
            }
            None if r.expire_text.is_empty() => {}
            None => {
                sheet.write_string(row, 3, &r.expire_text)?;
            }
        }
        sheet.write_string(row, 4, &r.phone)?;
        sheet.write_string(row, 5, &r.email)?;
        sheet.write_string(row, 6, &r.faculty)?;
        sheet.write_string(row, 7, &r.program)?;
    }
    sheet.autofit();
    workbook.save(path)?;
    Ok(())
}

fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

fn write_parquet(rows: &[Row], path: &str) -> anyhow::Result<()> {
    // NaiveDate::default() is 1970-01-01, the Date32 origin.
    let epoch = NaiveDate::default();
    let text = |f: fn(&Row) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(rows.iter().map(f)))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new(COL_STUDENT_ID, DataType::Utf8, false),
        Field::new(COL_FULL_NAME, DataType::Utf8, false),
        Field::new(COL_LICENSE_NUMBER, DataType::Utf8, false),
        Field::new(COL_EXPIRE_DATE, DataType::Date32, true),
        Field::new(COL_PHONE, DataType::Utf8, false),
        Field::new(COL_EMAIL, DataType::Utf8, false),
        Field::new(COL_FACULTY, DataType::Utf8, false),
        Field::new(COL_PROGRAM, DataType::Utf8, false),
    ]));

    let expire: Date32Array = rows
        .iter()
        .map(|r| r.expire.map(|d| (d - epoch).num_days() as i32))
        .collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|r| r.student_id.as_str()),
            text(|r| r.full_name.as_str()),
            text(|r| r.license_number.as_str()),
            Arc::new(expire),
            text(|r| r.phone.as_str()),
            text(|r| r.email.as_str()),
            text(|r| r.faculty.as_str()),
            text(|r| r.program.as_str()),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);
    let today = chrono::Local::now().date_naive();
    let rows = generate_rows(today, &mut rng);

    std::fs::create_dir_all("sample_data")?;
    write_csv(&rows, "sample_data/licenses.csv")?;
    write_xlsx(&rows, "sample_data/licenses.xlsx")?;
    write_parquet(&rows, "sample_data/licenses.parquet")?;

    let undated = rows.iter().filter(|r| r.expire.is_none()).count();
    println!(
        "Wrote {} license records ({undated} without a usable expiry date) to sample_data/",
        rows.len()
    );
    Ok(())
}
