use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const COL_STUDENT_ID: &str = "student_id";
pub const COL_FULL_NAME: &str = "full_name";
pub const COL_LICENSE_NUMBER: &str = "license_number";
pub const COL_EXPIRE_DATE: &str = "license_expire_date";
pub const COL_PHONE: &str = "phone";
pub const COL_EMAIL: &str = "email";
pub const COL_FACULTY: &str = "faculty";
pub const COL_PROGRAM: &str = "program";
pub const COL_STATUS: &str = "status";

// ---------------------------------------------------------------------------
// StatusCategory – derived expiry status
// ---------------------------------------------------------------------------

/// Expiry status of a single license. Variants are declared in urgency
/// order, so the derived `Ord` sorts the most pressing category first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusCategory {
    Expired,
    NearExpiry,
    RenewSoon,
    Normal,
    Unspecified,
}

impl StatusCategory {
    pub const ALL: [StatusCategory; 5] = [
        StatusCategory::Expired,
        StatusCategory::NearExpiry,
        StatusCategory::RenewSoon,
        StatusCategory::Normal,
        StatusCategory::Unspecified,
    ];

    /// Display label, also written to the `status` column of exports.
    pub fn label(self) -> &'static str {
        match self {
            StatusCategory::Expired => "Expired",
            StatusCategory::NearExpiry => "Near expiry (30 days)",
            StatusCategory::RenewSoon => "Renew soon",
            StatusCategory::Normal => "Normal",
            StatusCategory::Unspecified => "Unspecified",
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown status label: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for StatusCategory {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusCategory::ALL
            .into_iter()
            .find(|c| c.label() == s.trim())
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// LicenseRecord – one row of the uploaded roster
// ---------------------------------------------------------------------------

/// A single license holder. Absent text columns are stored as empty strings;
/// an absent or unparseable expiry date is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LicenseRecord {
    pub student_id: String,
    pub full_name: String,
    pub license_number: String,
    pub expire_date: Option<NaiveDate>,
    pub phone: String,
    pub email: String,
    pub faculty: String,
    pub program: String,
}

// ---------------------------------------------------------------------------
// RawTable – tabular input before typing
// ---------------------------------------------------------------------------

/// Rows of named string cells, as read from a file.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }
}

// ---------------------------------------------------------------------------
// RecordSet – the complete loaded roster
// ---------------------------------------------------------------------------

/// Non-fatal conditions found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// `faculty` or `program` is absent; filtering is disabled.
    MissingOptionalColumn { column: &'static str },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MissingOptionalColumn { column } => {
                write!(f, "column '{column}' not found; filtering is disabled")
            }
        }
    }
}

/// Typed records plus the raw table they came from.
#[derive(Debug, Clone)]
pub struct RecordSet {
    pub records: Vec<LicenseRecord>,
    pub raw: RawTable,
    pub has_faculty: bool,
    pub has_program: bool,
    /// Count of non-blank expiry cells that failed to parse.
    pub unparsed_dates: usize,
}

impl RecordSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Faculty and program filtering need both columns.
    pub fn filtering_enabled(&self) -> bool {
        self.has_faculty && self.has_program
    }

    pub fn warnings(&self) -> Vec<LoadWarning> {
        let mut out = Vec::new();
        if !self.has_faculty {
            out.push(LoadWarning::MissingOptionalColumn { column: COL_FACULTY });
        }
        if !self.has_program {
            out.push(LoadWarning::MissingOptionalColumn { column: COL_PROGRAM });
        }
        out
    }

    /// Sorted distinct faculty values (blank included).
    pub fn faculties(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.faculty.clone()).collect()
    }

    /// Sorted distinct program values (blank included).
    pub fn programs(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.program.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_parse_back() {
        for status in StatusCategory::ALL {
            assert_eq!(status.label().parse::<StatusCategory>().unwrap(), status);
        }
        assert!("Overdue".parse::<StatusCategory>().is_err());
    }

    #[test]
    fn status_orders_by_urgency() {
        let mut v = vec![
            StatusCategory::Unspecified,
            StatusCategory::Normal,
            StatusCategory::Expired,
            StatusCategory::RenewSoon,
            StatusCategory::NearExpiry,
        ];
        v.sort();
        assert_eq!(v, StatusCategory::ALL.to_vec());
    }

    #[test]
    fn warnings_name_missing_columns() {
        let set = RecordSet {
            records: Vec::new(),
            raw: RawTable::default(),
            has_faculty: true,
            has_program: false,
            unparsed_dates: 0,
        };
        assert!(!set.filtering_enabled());
        assert_eq!(
            set.warnings(),
            vec![LoadWarning::MissingOptionalColumn { column: COL_PROGRAM }]
        );
    }
}
