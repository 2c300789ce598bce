use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};

/// Calendar-date formats tried in order. Numeric forms are month-first
/// before day-first, so `03/04/2025` reads as March 4th.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d-%b-%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Largest serial Excel can represent (9999-12-31).
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

/// Parse a spreadsheet cell as a calendar date.
///
/// Returns `None` for blank or unrecognised input; callers treat that as
/// "unspecified" rather than an error.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    // Bare integers: a year, compact YYYYMMDD, or an Excel serial. Short
    // numbers are neither and stay unparsed.
    if s.bytes().all(|b| b.is_ascii_digit()) {
        match s.len() {
            1..=3 => return None,
            4 => return year_start(s),
            8 => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y%m%d") {
                    return Some(d);
                }
            }
            _ => {}
        }
    }

    if let Ok(n) = s.parse::<f64>() {
        return from_excel_serial(n);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Some(d) = parse_date_only(s) {
        return Some(d);
    }

    // "3/15/2025 00:00:00" and similar: date followed by a clock time.
    let mut parts = s.splitn(2, char::is_whitespace);
    match (parts.next(), parts.next()) {
        (Some(date), Some(time)) if time.contains(':') => parse_date_only(date),
        _ => None,
    }
}

fn parse_date_only(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// A lone year reads as January 1st of that year.
fn year_start(s: &str) -> Option<NaiveDate> {
    let year: i32 = s.parse().ok()?;
    if !(1900..=9999).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// Excel stores dates as days since 1899-12-30; any fraction is time of day.
pub fn from_excel_serial(n: f64) -> Option<NaiveDate> {
    if !n.is_finite() || !(1.0..=EXCEL_MAX_SERIAL).contains(&n) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(n.floor() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn iso_and_slashed() {
        assert_eq!(parse_date("2025-03-15"), ymd(2025, 3, 15));
        assert_eq!(parse_date(" 2025/03/15 "), ymd(2025, 3, 15));
        assert_eq!(parse_date("20250315"), ymd(2025, 3, 15));
    }

    #[test]
    fn month_first_then_day_first() {
        assert_eq!(parse_date("03/04/2025"), ymd(2025, 3, 4));
        assert_eq!(parse_date("25/12/2024"), ymd(2024, 12, 25));
        assert_eq!(parse_date("25.12.2024"), ymd(2024, 12, 25));
    }

    #[test]
    fn datetimes_drop_time() {
        assert_eq!(parse_date("2025-03-15 13:45:00"), ymd(2025, 3, 15));
        assert_eq!(parse_date("2025-03-15T23:59:59.250"), ymd(2025, 3, 15));
        assert_eq!(parse_date("2025-03-15T08:00:00+07:00"), ymd(2025, 3, 15));
        assert_eq!(parse_date("3/15/2025 00:00:00"), ymd(2025, 3, 15));
    }

    #[test]
    fn month_names() {
        assert_eq!(parse_date("March 5, 2025"), ymd(2025, 3, 5));
        assert_eq!(parse_date("5 Mar 2025"), ymd(2025, 3, 5));
        assert_eq!(parse_date("05-Mar-2025"), ymd(2025, 3, 5));
    }

    #[test]
    fn excel_serials() {
        assert_eq!(parse_date("45000"), ymd(2023, 3, 15));
        assert_eq!(parse_date("45000.75"), ymd(2023, 3, 15));
        assert_eq!(parse_date("0"), None);
        assert_eq!(parse_date("-3"), None);
    }

    #[test]
    fn bare_years_and_short_numbers() {
        assert_eq!(parse_date("2025"), ymd(2025, 1, 1));
        assert_eq!(parse_date(" 1999 "), ymd(1999, 1, 1));
        assert_eq!(parse_date("1234"), None);
        assert_eq!(parse_date("12"), None);
        assert_eq!(parse_date("365"), None);
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date("NaN"), None);
    }
}
