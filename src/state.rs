use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::data::classify::{classify, ClassifiedRecord};
use crate::data::export::{
    export_report_as, sort_by_urgency, ExportError, ReportArtifact, ReportFormat,
};
use crate::data::filter::{filtered_indices, FilterSelection};
use crate::data::loader::{load_file, LoadError};
use crate::data::model::{RecordSet, StatusCategory};
use crate::data::summary::{count_by_faculty, count_by_program, summarize, AggregateSummary};

// ---------------------------------------------------------------------------
// Session – one loaded file and everything derived from it
// ---------------------------------------------------------------------------

pub struct Session {
    pub set: RecordSet,
    pub classified: Vec<ClassifiedRecord>,
    pub summary: AggregateSummary,
    pub faculty_counts: BTreeMap<String, usize>,
    pub program_counts: BTreeMap<String, usize>,
}

impl Session {
    pub fn new(set: RecordSet, now: NaiveDateTime) -> Self {
        let classified = classify(&set, now);
        let summary = summarize(&classified);
        let faculty_counts = count_by_faculty(&classified);
        let program_counts = count_by_program(&classified);
        Self {
            set,
            classified,
            summary,
            faculty_counts,
            program_counts,
        }
    }
}

/// Facets with free-text values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Faculty,
    Program,
}

/// Message shown in the top bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error { text: String, hint: Option<String> },
    Warning(String),
    Info(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded roster (None until user loads a file).
    pub session: Option<Session>,

    /// Facet selections for the follow-up list.
    pub filters: FilterSelection,

    /// Indices of records passing the filters, most urgent first (cached).
    pub visible_indices: Vec<usize>,

    /// Date the expiry countdown is measured from.
    pub as_of: NaiveDate,

    /// Exact instant used for the last classification.
    pub evaluation_instant: NaiveDateTime,

    /// `as_of` is "today": loads re-read the clock instead of reusing
    /// `evaluation_instant`.
    pub follows_clock: bool,

    /// Status / error message shown in the UI.
    pub notice: Option<Notice>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(chrono::Local::now().naive_local())
    }
}

impl AppState {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            session: None,
            filters: FilterSelection::default(),
            visible_indices: Vec::new(),
            as_of: now.date(),
            evaluation_instant: now,
            follows_clock: true,
            notice: None,
        }
    }

    /// Load a file, replacing the current session on success.
    pub fn load_path(&mut self, path: &Path, now: NaiveDateTime) {
        match load_file(path) {
            Ok(set) => {
                log::info!("Loaded {} records from {}", set.len(), path.display());
                self.set_record_set(set, now);
            }
            Err(e) => self.fail_load(e),
        }
    }

    pub fn fail_load(&mut self, e: LoadError) {
        log::error!("Failed to load file: {e}");
        self.session = None;
        self.visible_indices.clear();
        self.notice = Some(Notice::Error {
            text: e.to_string(),
            hint: e.hint().map(str::to_string),
        });
    }

    /// Ingest a newly loaded roster: classify, summarise, initialise filters.
    ///
    /// Unless a past or future date was pinned, the roster is measured from
    /// `now`, not from whenever the date was last set.
    pub fn set_record_set(&mut self, set: RecordSet, now: NaiveDateTime) {
        if self.follows_clock {
            self.as_of = now.date();
            self.evaluation_instant = now;
        }
        let warnings = set.warnings();
        self.notice = (!warnings.is_empty()).then(|| {
            Notice::Warning(
                warnings
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        });
        self.filters = FilterSelection::follow_up(&set);
        self.session = Some(Session::new(set, self.evaluation_instant));
        self.refilter();
    }

    /// Move the evaluation date and re-classify. Today keeps the current
    /// clock time; any other date is measured from its midnight.
    pub fn set_as_of(&mut self, date: NaiveDate, now: NaiveDateTime) {
        self.as_of = date;
        self.follows_clock = date == now.date();
        self.evaluation_instant = if self.follows_clock {
            now
        } else {
            date.and_time(NaiveTime::MIN)
        };
        if let Some(session) = self.session.take() {
            self.session = Some(Session::new(session.set, self.evaluation_instant));
            self.refilter();
        }
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = match &self.session {
            Some(s) if s.set.filtering_enabled() => {
                sort_by_urgency(&s.classified, &filtered_indices(&s.classified, &self.filters))
            }
            _ => Vec::new(),
        };
    }

    fn facet_mut(&mut self, facet: Facet) -> &mut std::collections::BTreeSet<String> {
        match facet {
            Facet::Faculty => &mut self.filters.faculties,
            Facet::Program => &mut self.filters.programs,
        }
    }

    /// Toggle a single value in a facet.
    pub fn toggle_value(&mut self, facet: Facet, value: &str) {
        let selected = self.facet_mut(facet);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    pub fn toggle_status(&mut self, status: StatusCategory) {
        if !self.filters.statuses.remove(&status) {
            self.filters.statuses.insert(status);
        }
        self.refilter();
    }

    /// Select all values in a facet.
    pub fn select_all(&mut self, facet: Facet) {
        let all = match (&self.session, facet) {
            (Some(s), Facet::Faculty) => s.set.faculties(),
            (Some(s), Facet::Program) => s.set.programs(),
            (None, _) => return,
        };
        *self.facet_mut(facet) = all;
        self.refilter();
    }

    /// Deselect all values in a facet.
    pub fn select_none(&mut self, facet: Facet) {
        self.facet_mut(facet).clear();
        self.refilter();
    }

    pub fn select_all_statuses(&mut self) {
        self.filters.statuses = StatusCategory::ALL.into_iter().collect();
        self.refilter();
    }

    pub fn select_no_statuses(&mut self) {
        self.filters.statuses.clear();
        self.refilter();
    }

    /// Build the follow-up report for the visible records.
    pub fn export(&self) -> Result<ReportArtifact, ExportError> {
        self.export_as(ReportFormat::default())
    }

    pub fn export_as(&self, format: ReportFormat) -> Result<ReportArtifact, ExportError> {
        match &self.session {
            Some(s) => export_report_as(&s.classified, &self.visible_indices, format),
            None => Err(ExportError::NoRows),
        }
    }

    /// Save the report to `path`, recording the outcome as a notice. The
    /// extension picks the format; see [`ReportFormat::from_path`].
    pub fn save_report(&mut self, path: &Path) {
        let format = ReportFormat::from_path(path);
        let result = self
            .export_as(format)
            .and_then(|a| a.write_to(path).map(|_| a).map_err(ExportError::from));
        self.notice = Some(match result {
            Ok(a) => {
                log::info!("Saved {} rows to {}", a.rows, path.display());
                Notice::Info(format!("Saved {} rows to {}", a.rows, path.display()))
            }
            Err(ExportError::NoRows) => Notice::Info(ExportError::NoRows.to_string()),
            Err(e) => {
                log::error!("Failed to save report: {e}");
                Notice::Error {
                    text: e.to_string(),
                    hint: None,
                }
            }
        });
    }
}
