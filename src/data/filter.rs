use std::collections::BTreeSet;

use super::classify::ClassifiedRecord;
use super::model::{RecordSet, StatusCategory};

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per dimension
// ---------------------------------------------------------------------------

/// Selected values for each facet. An empty set selects nothing; there is
/// no implicit "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub faculties: BTreeSet<String>,
    pub programs: BTreeSet<String>,
    pub statuses: BTreeSet<StatusCategory>,
}

impl FilterSelection {
    /// Every faculty, program and status selected.
    pub fn all(set: &RecordSet) -> Self {
        Self {
            faculties: set.faculties(),
            programs: set.programs(),
            statuses: StatusCategory::ALL.into_iter().collect(),
        }
    }

    /// Every faculty and program, but only the statuses that need follow-up.
    pub fn follow_up(set: &RecordSet) -> Self {
        Self {
            statuses: [StatusCategory::Expired, StatusCategory::NearExpiry]
                .into_iter()
                .collect(),
            ..Self::all(set)
        }
    }

    pub fn matches(&self, r: &ClassifiedRecord) -> bool {
        self.faculties.contains(&r.record.faculty)
            && self.programs.contains(&r.record.program)
            && self.statuses.contains(&r.status)
    }
}

/// Return indices of records that pass every facet, in input order.
pub fn filtered_indices(records: &[ClassifiedRecord], selection: &FilterSelection) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| selection.matches(r))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{LicenseRecord, RawTable};

    fn rec(name: &str, faculty: &str, program: &str, days: Option<i64>) -> ClassifiedRecord {
        ClassifiedRecord {
            record: LicenseRecord {
                full_name: name.into(),
                faculty: faculty.into(),
                program: program.into(),
                ..Default::default()
            },
            days_until_expire: days,
            status: StatusCategory::from_days(days),
        }
    }

    fn sample() -> Vec<ClassifiedRecord> {
        vec![
            rec("a", "Nursing", "BSN", Some(-5)),
            rec("b", "Nursing", "MSN", Some(10)),
            rec("c", "Pharmacy", "PharmD", Some(60)),
            rec("d", "Nursing", "BSN", None),
            rec("e", "Pharmacy", "PharmD", Some(-1)),
        ]
    }

    fn record_set(records: &[ClassifiedRecord]) -> RecordSet {
        RecordSet {
            records: records.iter().map(|r| r.record.clone()).collect(),
            raw: RawTable::default(),
            has_faculty: true,
            has_program: true,
            unparsed_dates: 0,
        }
    }

    fn set<T: Ord + Clone>(items: &[T]) -> BTreeSet<T> {
        items.iter().cloned().collect()
    }

    #[test]
    fn conjunction_across_dimensions() {
        let records = sample();
        let sel = FilterSelection {
            faculties: set(&["Nursing".to_string()]),
            programs: set(&["BSN".to_string(), "MSN".to_string()]),
            statuses: set(&[StatusCategory::Expired, StatusCategory::NearExpiry]),
        };
        assert_eq!(filtered_indices(&records, &sel), vec![0, 1]);
    }

    #[test]
    fn empty_dimension_selects_nothing() {
        let records = sample();
        let full = FilterSelection::all(&record_set(&records));
        assert_eq!(filtered_indices(&records, &full).len(), records.len());

        for clear in 0..3 {
            let mut sel = full.clone();
            match clear {
                0 => sel.faculties.clear(),
                1 => sel.programs.clear(),
                _ => sel.statuses.clear(),
            }
            assert!(filtered_indices(&records, &sel).is_empty());
        }
        assert!(filtered_indices(&records, &FilterSelection::default()).is_empty());
    }

    #[test]
    fn filtering_is_idempotent_and_stable() {
        let records = sample();
        let sel = FilterSelection::follow_up(&record_set(&records));
        let once = filtered_indices(&records, &sel);
        assert_eq!(once, vec![0, 1, 4]);

        let subset: Vec<ClassifiedRecord> = once.iter().map(|&i| records[i].clone()).collect();
        let twice: Vec<ClassifiedRecord> = filtered_indices(&subset, &sel)
            .into_iter()
            .map(|i| subset[i].clone())
            .collect();
        assert_eq!(twice, subset);
    }

    #[test]
    fn follow_up_default_matches_urgent_statuses() {
        let sel = FilterSelection::follow_up(&record_set(&sample()));
        assert_eq!(
            sel.statuses,
            set(&[StatusCategory::Expired, StatusCategory::NearExpiry])
        );
        assert_eq!(sel.faculties.len(), 2);
        assert_eq!(sel.programs.len(), 3);
    }
}
