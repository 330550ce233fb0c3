use eframe::egui::{self, Align, Layout, Ui};
use egui_extras::{Column, TableBuilder};

use booking_dashboard::data::filter::FilteredTable;
use booking_dashboard::report::{format_stat, ColumnStats};

const ROW_HEIGHT: f32 = 18.0;

/// Scrollable view of the filtered rows. Only visible rows are laid out.
pub fn data_table(ui: &mut Ui, filtered: &FilteredTable<'_>) {
    let source = filtered.source();
    let columns = source.schema().columns();

    ui.push_id("data_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(Layout::left_to_right(Align::Center))
            .columns(Column::auto().at_least(60.0), columns.len())
            .max_scroll_height(320.0)
            .header(ROW_HEIGHT + 4.0, |mut header| {
                for spec in columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(spec.name.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, filtered.len(), |mut row| {
                    let Some(cells) = source.row(filtered.indices()[row.index()]) else {
                        return;
                    };
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell.to_string());
                        });
                    }
                });
            });
    });
}

/// Grid of per-column statistics, rounded for display.
pub fn statistics_table(ui: &mut Ui, statistics: &[ColumnStats]) {
    egui::Grid::new("statistics_grid")
        .striped(true)
        .num_columns(5)
        .min_col_width(80.0)
        .show(ui, |ui: &mut Ui| {
            for title in ["Variable", "Mean", "Median", "Mode", "Std Dev"] {
                ui.strong(title);
            }
            ui.end_row();

            for stat in statistics {
                ui.label(stat.column.as_str());
                for value in [stat.mean, stat.median, stat.mode, stat.std_dev] {
                    ui.label(format_stat(value));
                }
                ui.end_row();
            }
        });
}
