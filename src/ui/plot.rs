use std::collections::BTreeMap;
use std::f64::consts::TAU;

use eframe::egui::{self, Align2, Color32, FontId, RichText, ScrollArea, Sense, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points, Polygon};

use booking_dashboard::color::{self, ColorMap};
use booking_dashboard::config::{EmptyFilterPolicy, EmptyNumericPolicy};
use booking_dashboard::report::{
    format_stat, CategoryCount, CorrelationMatrix, ScatterPoint, Summary,
};
use booking_dashboard::session::Session;

use super::{color32, table};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the tables and charts for the current selection.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(session) = &state.session else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a bookings file to begin  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match session.summary() {
            Summary::Empty => empty_notice(ui, session),
            Summary::Report(report) => {
                data_section(ui, session);

                let show_stats = report.statistics.is_some()
                    || session.config().on_empty_numeric == EmptyNumericPolicy::MarkAbsent;
                if show_stats {
                    ui.separator();
                    ui.heading("Statistics");
                    match &report.statistics {
                        Some(stats) => table::statistics_table(ui, stats),
                        None => {
                            ui.label("No numeric columns.");
                        }
                    }
                }

                let hotel_colors = ColorMap::new(&labels(&report.hotel_counts));

                ui.separator();
                ui.heading("Bookings per hotel");
                bar_chart(ui, &report.hotel_counts, &hotel_colors);

                ui.separator();
                ui.heading("Bookings per arrival month");
                line_chart(ui, &report.month_counts);

                ui.separator();
                ui.heading("Customer types");
                pie_chart(ui, &report.customer_counts);

                ui.separator();
                ui.heading("Lead time vs. ADR");
                scatter_plot(ui, &report.scatter, &hotel_colors);

                if let Some(matrix) = &report.correlation {
                    ui.separator();
                    ui.heading("Correlation");
                    heatmap(ui, matrix);
                }
            }
        });
}

fn empty_notice(ui: &mut Ui, session: &Session) {
    ui.label(RichText::new("No bookings match the current filters.").color(Color32::LIGHT_BLUE));
    if session.config().on_empty_filter == EmptyFilterPolicy::ShortCircuit {
        ui.separator();
        data_section(ui, session);
    }
}

fn data_section(ui: &mut Ui, session: &Session) {
    ui.heading("Bookings");
    match session.filtered() {
        Ok(filtered) => table::data_table(ui, &filtered),
        Err(e) => {
            ui.label(RichText::new(format!("Error: {e}")).color(Color32::RED));
        }
    }
}

fn labels(counts: &[CategoryCount]) -> Vec<&str> {
    counts.iter().map(|c| c.label.as_str()).collect()
}

/// Axis label for an integer grid mark indexing into `names`.
fn category_label(names: &[String], mark: GridMark) -> String {
    let v = mark.value;
    if v.fract() != 0.0 || v < 0.0 {
        return String::new();
    }
    names.get(v as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn bar_chart(ui: &mut Ui, counts: &[CategoryCount], colors: &ColorMap) {
    let names: Vec<String> = counts.iter().map(|c| c.label.clone()).collect();
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Bar::new(i as f64, c.count as f64)
                .name(&c.label)
                .fill(color32(colors.color_for(&c.label)))
        })
        .collect();

    Plot::new("hotel_bar_chart")
        .height(CHART_HEIGHT)
        .y_axis_label("Bookings")
        .x_axis_formatter(move |mark, _range| category_label(&names, mark))
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).width(0.7));
        });
}

fn line_chart(ui: &mut Ui, counts: &[CategoryCount]) {
    // Three-letter month names on the axis.
    let names: Vec<String> = counts.iter().map(|c| c.label.chars().take(3).collect()).collect();
    let points: PlotPoints = counts
        .iter()
        .enumerate()
        .map(|(i, c)| [i as f64, c.count as f64])
        .collect();

    Plot::new("month_line_chart")
        .height(CHART_HEIGHT)
        .y_axis_label("Bookings")
        .x_axis_formatter(move |mark, _range| category_label(&names, mark))
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("Bookings").width(2.0));
        });
}

fn pie_chart(ui: &mut Ui, counts: &[CategoryCount]) {
    let total: usize = counts.iter().map(|c| c.count).sum();
    let palette = color::generate_palette(counts.len());

    Plot::new("customer_pie_chart")
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            let mut start = 0.0;
            for (c, rgb) in counts.iter().zip(&palette) {
                if c.count == 0 {
                    continue;
                }
                let sweep = c.count as f64 / total as f64 * TAU;
                let pct = c.count as f64 / total as f64 * 100.0;
                plot_ui.polygon(
                    Polygon::new(slice(start, sweep))
                        .fill_color(color32(*rgb))
                        .name(format!("{} ({pct:.1}%)", c.label)),
                );
                start += sweep;
            }
        });
}

/// Outline of a pie slice, clockwise from twelve o'clock.
fn slice(start: f64, sweep: f64) -> Vec<[f64; 2]> {
    let steps = ((sweep / TAU) * 96.0).ceil().max(2.0) as usize;
    let mut points = vec![[0.0, 0.0]];
    for k in 0..=steps {
        let angle = start + sweep * k as f64 / steps as f64;
        points.push([angle.sin(), angle.cos()]);
    }
    points
}

fn scatter_plot(ui: &mut Ui, points: &[ScatterPoint], colors: &ColorMap) {
    let mut by_hotel: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for p in points {
        by_hotel
            .entry(p.hotel.as_deref().unwrap_or("Unknown"))
            .or_default()
            .push([p.lead_time, p.adr]);
    }

    Plot::new("lead_time_adr_scatter")
        .height(CHART_HEIGHT)
        .x_axis_label("Lead time (days)")
        .y_axis_label("ADR")
        .legend(Legend::default())
        .allow_boxed_zoom(true)
        .show(ui, |plot_ui| {
            for (hotel, series) in by_hotel {
                plot_ui.points(
                    Points::new(series)
                        .name(hotel)
                        .radius(2.5)
                        .color(color32(colors.color_for(hotel))),
                );
            }
        });
}

fn heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    const CELL: egui::Vec2 = egui::vec2(72.0, 26.0);

    egui::Grid::new("correlation_heatmap")
        .spacing([2.0, 2.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for name in &matrix.columns {
                ui.strong(name.as_str());
            }
            ui.end_row();

            for (i, name) in matrix.columns.iter().enumerate() {
                ui.strong(name.as_str());
                for j in 0..matrix.len() {
                    let value = matrix.get(i, j);
                    let fill = value.map_or(color::UNDEFINED, color::diverging);
                    let (rect, _) = ui.allocate_exact_size(CELL, Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, color32(fill));
                    ui.painter().text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        format_stat(value),
                        FontId::monospace(12.0),
                        Color32::BLACK,
                    );
                }
                ui.end_row();
            }
        });
}
