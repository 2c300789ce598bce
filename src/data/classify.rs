use chrono::{NaiveDateTime, NaiveTime};

use super::model::{LicenseRecord, RecordSet, StatusCategory};

/// Upper bound (inclusive) of the near-expiry band.
pub const NEAR_EXPIRY_DAYS: i64 = 30;
/// Upper bound (inclusive) of the renew-soon band.
pub const RENEW_SOON_DAYS: i64 = 90;

const SECONDS_PER_DAY: i64 = 86_400;

/// A record with its derived expiry fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    pub record: LicenseRecord,
    /// Whole days from the evaluation instant to the expiry date; `None`
    /// when the date is unknown.
    pub days_until_expire: Option<i64>,
    pub status: StatusCategory,
}

impl StatusCategory {
    /// First matching band wins; the bands overlap if read unordered.
    pub fn from_days(days: Option<i64>) -> StatusCategory {
        match days {
            None => StatusCategory::Unspecified,
            Some(d) if d <= 0 => StatusCategory::Expired,
            Some(d) if d <= NEAR_EXPIRY_DAYS => StatusCategory::NearExpiry,
            Some(d) if d <= RENEW_SOON_DAYS => StatusCategory::RenewSoon,
            Some(_) => StatusCategory::Normal,
        }
    }
}

/// Days from `now` until midnight of the expiry date, floored.
///
/// An expiry later today is therefore day 0 once the clock is past midnight.
pub fn days_until(expire: chrono::NaiveDate, now: NaiveDateTime) -> i64 {
    let expiry = expire.and_time(NaiveTime::MIN);
    (expiry - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

pub fn classify_record(record: &LicenseRecord, now: NaiveDateTime) -> ClassifiedRecord {
    let days_until_expire = record.expire_date.map(|d| days_until(d, now));
    ClassifiedRecord {
        record: record.clone(),
        days_until_expire,
        status: StatusCategory::from_days(days_until_expire),
    }
}

/// Classify every record of a set against one evaluation instant.
pub fn classify(set: &RecordSet, now: NaiveDateTime) -> Vec<ClassifiedRecord> {
    let out: Vec<ClassifiedRecord> = set
        .records
        .iter()
        .map(|r| classify_record(r, now))
        .collect();
    log::debug!("Classified {} records as of {now}", out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn band_boundaries() {
        let cases = [
            (-1, StatusCategory::Expired),
            (0, StatusCategory::Expired),
            (1, StatusCategory::NearExpiry),
            (15, StatusCategory::NearExpiry),
            (30, StatusCategory::NearExpiry),
            (31, StatusCategory::RenewSoon),
            (90, StatusCategory::RenewSoon),
            (91, StatusCategory::Normal),
            (3650, StatusCategory::Normal),
        ];
        for (days, expected) in cases {
            assert_eq!(StatusCategory::from_days(Some(days)), expected, "day {days}");
        }
        assert_eq!(StatusCategory::from_days(None), StatusCategory::Unspecified);
    }

    #[test]
    fn dated_records_never_unspecified() {
        for days in -400..=400 {
            let status = StatusCategory::from_days(Some(days));
            assert_ne!(status, StatusCategory::Unspecified);
        }
    }

    #[test]
    fn whole_days_from_midnight() {
        let now = midnight();
        let in_30 = (now + Duration::days(30)).date();
        assert_eq!(days_until(in_30, now), 30);
        let ten_ago = (now - Duration::days(10)).date();
        assert_eq!(days_until(ten_ago, now), -10);
    }

    #[test]
    fn partial_days_are_floored() {
        let now = noon();
        // Tomorrow at midnight is only 12 hours away.
        let tomorrow = now.date().succ_opt().unwrap();
        assert_eq!(days_until(tomorrow, now), 0);
        // Today at midnight already passed.
        assert_eq!(days_until(now.date(), now), -1);
        assert_eq!(
            StatusCategory::from_days(Some(days_until(tomorrow, now))),
            StatusCategory::Expired
        );
    }

    #[test]
    fn null_date_has_no_days() {
        let rec = LicenseRecord {
            full_name: "Ann".into(),
            ..Default::default()
        };
        let c = classify_record(&rec, midnight());
        assert_eq!(c.days_until_expire, None);
        assert_eq!(c.status, StatusCategory::Unspecified);
        assert_eq!(c.record, rec);
    }

    #[test]
    fn ten_days_overdue() {
        let now = midnight();
        let rec = LicenseRecord {
            expire_date: Some((now - Duration::days(10)).date()),
            ..Default::default()
        };
        let c = classify_record(&rec, now);
        assert_eq!(c.days_until_expire, Some(-10));
        assert_eq!(c.status, StatusCategory::Expired);
    }
}
