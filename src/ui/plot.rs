use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Plot};

use license_monitor::color::status_color;
use license_monitor::data::model::StatusCategory;
use license_monitor::data::summary::AggregateSummary;

// ---------------------------------------------------------------------------
// Status distribution (central panel)
// ---------------------------------------------------------------------------

/// One bar per status category, zero-height bars included.
pub fn status_chart(ui: &mut Ui, summary: &AggregateSummary) {
    let bars: Vec<Bar> = summary
        .chart_counts()
        .into_iter()
        .zip(StatusCategory::ALL)
        .enumerate()
        .map(|(i, ((label, count), status))| {
            Bar::new(i as f64, count as f64)
                .name(label)
                .fill(status_color(status))
                .width(0.7)
        })
        .collect();

    Plot::new("status_chart")
        .legend(Legend::default())
        .height(220.0)
        .y_axis_label("Licenses")
        .show_x(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .x_axis_formatter(|mark, _range| {
            StatusCategory::ALL
                .get(mark.value as usize)
                .filter(|_| mark.value.fract() == 0.0 && mark.value >= 0.0)
                .map(|s| s.label().to_string())
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Status"));
        });
}
