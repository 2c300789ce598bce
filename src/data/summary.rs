use std::collections::BTreeMap;

use super::classify::ClassifiedRecord;
use super::model::StatusCategory;

/// Total plus per-status counts. Every category is present, zero or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSummary {
    pub total: usize,
    pub counts: BTreeMap<StatusCategory, usize>,
}

impl Default for AggregateSummary {
    fn default() -> Self {
        Self {
            total: 0,
            counts: StatusCategory::ALL.into_iter().map(|c| (c, 0)).collect(),
        }
    }
}

impl AggregateSummary {
    pub fn count(&self, status: StatusCategory) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// `(label, count)` pairs in urgency order, for charting.
    pub fn chart_counts(&self) -> Vec<(&'static str, usize)> {
        StatusCategory::ALL
            .into_iter()
            .map(|c| (c.label(), self.count(c)))
            .collect()
    }
}

/// Single pass over the classified records.
pub fn summarize(records: &[ClassifiedRecord]) -> AggregateSummary {
    let mut summary = AggregateSummary::default();
    for r in records {
        summary.total += 1;
        *summary.counts.entry(r.status).or_insert(0) += 1;
    }
    summary
}

/// Records per faculty value (blank faculties under `""`).
pub fn count_by_faculty(records: &[ClassifiedRecord]) -> BTreeMap<String, usize> {
    count_by(records, |r| &r.record.faculty)
}

/// Records per program value (blank programs under `""`).
pub fn count_by_program(records: &[ClassifiedRecord]) -> BTreeMap<String, usize> {
    count_by(records, |r| &r.record.program)
}

fn count_by<F>(records: &[ClassifiedRecord], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&ClassifiedRecord) -> &String,
{
    let mut out = BTreeMap::new();
    for r in records {
        *out.entry(key(r).clone()).or_insert(0) += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::LicenseRecord;

    fn rec(faculty: &str, days: Option<i64>) -> ClassifiedRecord {
        ClassifiedRecord {
            record: LicenseRecord {
                faculty: faculty.into(),
                ..Default::default()
            },
            days_until_expire: days,
            status: StatusCategory::from_days(days),
        }
    }

    #[test]
    fn empty_input_reports_all_zero() {
        let s = summarize(&[]);
        assert_eq!(s.total, 0);
        assert_eq!(s.counts.len(), 5);
        assert!(s.counts.values().all(|&n| n == 0));
    }

    #[test]
    fn counts_sum_to_total() {
        let records: Vec<_> = [Some(-10), Some(0), Some(12), Some(45), Some(400), None, None]
            .into_iter()
            .map(|d| rec("Nursing", d))
            .collect();
        let s = summarize(&records);
        assert_eq!(s.total, records.len());
        assert_eq!(s.counts.values().sum::<usize>(), s.total);
        assert_eq!(s.count(StatusCategory::Expired), 2);
        assert_eq!(s.count(StatusCategory::NearExpiry), 1);
        assert_eq!(s.count(StatusCategory::RenewSoon), 1);
        assert_eq!(s.count(StatusCategory::Normal), 1);
        assert_eq!(s.count(StatusCategory::Unspecified), 2);
    }

    #[test]
    fn chart_counts_keep_absent_categories() {
        let s = summarize(&[rec("Nursing", Some(5))]);
        assert_eq!(
            s.chart_counts(),
            vec![
                ("Expired", 0),
                ("Near expiry (30 days)", 1),
                ("Renew soon", 0),
                ("Normal", 0),
                ("Unspecified", 0),
            ]
        );
    }

    #[test]
    fn per_faculty_counts() {
        let records = vec![rec("Nursing", None), rec("", Some(1)), rec("Nursing", Some(2))];
        let by = count_by_faculty(&records);
        assert_eq!(by.get("Nursing"), Some(&2));
        assert_eq!(by.get(""), Some(&1));
        assert_eq!(count_by_program(&records).get(""), Some(&3));
    }
}
