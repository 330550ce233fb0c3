use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use booking_dashboard::data::filter::FilterDimension;
use booking_dashboard::data::loader;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(session) = &state.session else {
        ui.label("No bookings loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let mut dimensions: Vec<(FilterDimension, Vec<String>, BTreeSet<String>)> = Vec::new();
    for dim in FilterDimension::ALL {
        match session.options(dim) {
            Ok(options) => dimensions.push((dim, options, session.selection().get(dim).clone())),
            Err(e) => log::warn!("No filter for {}: {e}", dim.title()),
        }
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (dim, options, selected) in &dimensions {
                let header_text =
                    format!("{}  ({}/{})", dim.title(), selected.len(), options.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(dim.column())
                    .default_open(*dim != FilterDimension::Country)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(*dim);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(*dim);
                            }
                        });

                        for value in options {
                            let mut checked = selected.contains(value);
                            if ui.checkbox(&mut checked, value.as_str()).changed() {
                                state.toggle_filter_value(*dim, value);
                            }
                        }
                    });
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
            let can_export = state.session.is_some();
            if ui.add_enabled(can_export, egui::Button::new("Export…")).clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            let visible = session.summary().report().map_or(0, |r| r.rows);
            ui.label(format!("{} bookings loaded, {} visible", session.table().len(), visible));
            ui.separator();
        }

        ui.checkbox(&mut state.include_charts, "Include charts in export");

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open hotel bookings")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match loader::load_file(&path) {
            Ok(table) => state.set_table(table),
            Err(e) => state.report_error("Failed to load file", &e),
        }
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export filtered bookings")
        .set_file_name("hotel_bookings_report.xlsx")
        .add_filter("Excel workbook", &["xlsx"])
        .save_file();

    if let Some(path) = file {
        state.export_to(&path);
    }
}
