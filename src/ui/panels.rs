use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use license_monitor::color::status_color;
use license_monitor::data::export::REPORT_FILE_NAME;
use license_monitor::data::model::StatusCategory;
use license_monitor::state::{AppState, Facet, Notice};

// ---------------------------------------------------------------------------
// Left side panel – evaluation date and filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("As of");
    let mut as_of = state.as_of;
    ui.add(DatePickerButton::new(&mut as_of).id_salt("as_of"));
    if as_of != state.as_of {
        state.set_as_of(as_of, chrono::Local::now().naive_local());
    }
    ui.separator();

    ui.heading("Filters");
    ui.separator();

    let Some(session) = &state.session else {
        ui.label("No roster loaded.");
        return;
    };
    if !session.set.filtering_enabled() {
        ui.label(
            RichText::new("Faculty or program column missing; filtering is unavailable.")
                .color(Color32::YELLOW),
        );
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let faculty_counts = session.faculty_counts.clone();
    let program_counts = session.program_counts.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            status_filter(ui, state);
            facet_filter(ui, state, Facet::Faculty, "Faculty", &faculty_counts);
            facet_filter(ui, state, Facet::Program, "Program", &program_counts);
        });
}

fn status_filter(ui: &mut Ui, state: &mut AppState) {
    let n_selected = state.filters.statuses.len();
    let header_text = format!("Status  ({n_selected}/{})", StatusCategory::ALL.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt("status_filter")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all_statuses();
                }
                if ui.small_button("None").clicked() {
                    state.select_no_statuses();
                }
            });
            for status in StatusCategory::ALL {
                let mut checked = state.filters.statuses.contains(&status);
                let text = RichText::new(status.label()).color(status_color(status));
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_status(status);
                }
            }
        });
}

fn facet_filter(
    ui: &mut Ui,
    state: &mut AppState,
    facet: Facet,
    title: &str,
    counts: &BTreeMap<String, usize>,
) {
    let selected: &BTreeSet<String> = match facet {
        Facet::Faculty => &state.filters.faculties,
        Facet::Program => &state.filters.programs,
    };
    let header_text = format!("{title}  ({}/{})", selected.len(), counts.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(facet);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(facet);
                }
            });

            for (value, n) in counts {
                let selected = match facet {
                    Facet::Faculty => &state.filters.faculties,
                    Facet::Program => &state.filters.programs,
                };
                let mut checked = selected.contains(value);
                let label = if value.is_empty() { "(blank)" } else { value.as_str() };
                if ui.checkbox(&mut checked, format!("{label}  ({n})")).changed() {
                    state.toggle_value(facet, value);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_save = !state.visible_indices.is_empty();
            if ui
                .add_enabled(can_save, egui::Button::new("Save report…"))
                .clicked()
            {
                save_report_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(s) = &state.session {
            ui.label(format!(
                "{} records loaded, {} to follow up",
                s.set.len(),
                state.visible_indices.len()
            ));
            if s.set.unparsed_dates > 0 {
                ui.label(
                    RichText::new(format!("{} unreadable dates", s.set.unparsed_dates))
                        .color(Color32::GRAY),
                );
            }
        }

        ui.separator();

        match &state.notice {
            Some(Notice::Error { text, hint }) => {
                ui.label(RichText::new(format!("Error: {text}")).color(Color32::RED));
                if let Some(hint) = hint {
                    ui.label(hint);
                }
            }
            Some(Notice::Warning(text)) => {
                ui.label(RichText::new(text).color(Color32::YELLOW));
            }
            Some(Notice::Info(text)) => {
                ui.label(text);
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open license roster")
        .add_filter("Supported files", &["csv", "xlsx", "xls", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx", "xls"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path, chrono::Local::now().naive_local());
    }
}

pub fn save_report_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save follow-up report")
        .set_file_name(REPORT_FILE_NAME)
        .add_filter("Excel workbook", &["xlsx"])
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.save_report(&path);
    }
}
