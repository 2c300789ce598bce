use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::ui::{panels, plot};
use license_monitor::color::status_color;
use license_monitor::data::export::{report_rows, ReportRow};
use license_monitor::data::model::StatusCategory;
use license_monitor::state::{AppState, Session};

const ROW_HEIGHT: f32 = 18.0;

const REPORT_HEADERS: [&str; 9] = [
    "Student ID",
    "Full name",
    "License no.",
    "Expires",
    "Phone",
    "Email",
    "Faculty",
    "Program",
    "Status",
];

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    let Some(session) = &state.session else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a license roster to begin  (File → Open…)");
        });
        return;
    };

    let save_clicked = egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            metric_cards(ui, session);
            ui.separator();

            ui.heading("Status distribution");
            plot::status_chart(ui, &session.summary);
            ui.separator();

            ui.heading("To follow up");
            let mut save_clicked = false;
            if !session.set.filtering_enabled() {
                ui.label(
                    RichText::new("The file has no 'faculty' or 'program' column.")
                        .color(Color32::YELLOW),
                );
            } else if state.visible_indices.is_empty() {
                ui.label("No records need follow-up for the current filters.");
            } else {
                let rows = report_rows(&session.classified, &state.visible_indices);
                save_clicked = ui.button("⬇ Download report").clicked();
                ui.push_id("follow_up", |ui: &mut Ui| report_table(ui, &rows));
            }
            ui.separator();

            egui::CollapsingHeader::new("Raw data")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    ui.push_id("raw_data", |ui: &mut Ui| raw_table(ui, session));
                });

            save_clicked
        })
        .inner;

    if save_clicked {
        panels::save_report_dialog(state);
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

fn metric_cards(ui: &mut Ui, session: &Session) {
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Total", session.summary.total, Color32::LIGHT_BLUE);
        for status in StatusCategory::ALL {
            metric(
                ui,
                status.label(),
                session.summary.count(status),
                status_color(status),
            );
        }
    });
}

fn metric(ui: &mut Ui, label: &str, value: usize, color: Color32) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(label);
            ui.label(RichText::new(value.to_string()).size(24.0).color(color));
        });
    });
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn report_table(ui: &mut Ui, rows: &[ReportRow]) {
    let mut table = TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(360.0)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
    for _ in REPORT_HEADERS {
        table = table.column(Column::auto().resizable(true));
    }

    table
        .header(ROW_HEIGHT + 2.0, |mut header| {
            for title in REPORT_HEADERS {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                let r = &rows[row.index()];
                let status_col = r
                    .status
                    .parse::<StatusCategory>()
                    .map(status_color)
                    .unwrap_or(Color32::GRAY);
                let [cells @ .., _status] = r.cells();
                for cell in cells {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell);
                    });
                }
                row.col(|ui: &mut Ui| {
                    ui.label(RichText::new(&r.status).color(status_col));
                });
            });
        });
}

/// The file as loaded, before typing.
fn raw_table(ui: &mut Ui, session: &Session) {
    let raw = &session.set.raw;
    let mut table = TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(360.0);
    for _ in &raw.columns {
        table = table.column(Column::auto().resizable(true));
    }

    table
        .header(ROW_HEIGHT + 2.0, |mut header| {
            for title in &raw.columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, raw.rows.len(), |mut row| {
                for cell in &raw.rows[row.index()] {
                    row.col(|ui: &mut Ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}
