//! Spreadsheet export of a filtered table, its statistics and chart images.
//!
//! Workbook layout:
//! ```text
//!   Data          header + rows, numbers stay numbers, missing cells blank
//!   Statistics    Variable | Mean | Median | Mode | Std Dev   (optional)
//!   <chart name>  one sheet per chart image, anchored at A1
//! ```

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Image, Workbook, Worksheet};

use crate::chart::ChartImage;
use crate::data::model::{ColumnKind, ColumnSpec, Schema, Table, Value};
use crate::error::ExportError;
use crate::report::ColumnStats;

pub const DATA_SHEET: &str = "Data";
pub const STATS_SHEET: &str = "Statistics";

const STATS_HEADER: [&str; 5] = ["Variable", "Mean", "Median", "Mode", "Std Dev"];

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Build an `.xlsx` byte stream.
///
/// The first sheet always holds the table in its original column and row
/// order. Statistics are rounded to two decimals; the data sheet is never
/// rounded.
pub fn write_workbook(
    table: &Table,
    statistics: Option<&[ColumnStats]>,
    charts: &[ChartImage],
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(DATA_SHEET)?;
    write_table(sheet, table, &bold)?;

    if let Some(stats) = statistics {
        let sheet = workbook.add_worksheet();
        sheet.set_name(STATS_SHEET)?;
        write_statistics(sheet, stats, &bold)?;
    }

    for chart in charts {
        let image = Image::new_from_buffer(&chart.png)?;
        let sheet = workbook.add_worksheet();
        sheet.set_name(&chart.name)?;
        sheet.insert_image(0, 0, &image)?;
    }

    let bytes = workbook.save_to_buffer()?;
    log::info!(
        "Exported {} rows x {} columns with {} chart(s)",
        table.len(),
        table.schema().len(),
        charts.len()
    );
    Ok(bytes)
}

fn write_table(sheet: &mut Worksheet, table: &Table, header: &Format) -> Result<(), ExportError> {
    for (col, name) in table.schema().names().enumerate() {
        sheet.write_string_with_format(0, col_index(col)?, name, header)?;
    }
    for (r, row) in table.rows().iter().enumerate() {
        let r = row_index(r + 1)?;
        for (c, cell) in row.iter().enumerate() {
            let c = col_index(c)?;
            match cell {
                Value::Int(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                Value::Float(v) => {
                    sheet.write_number(r, c, *v)?;
                }
                Value::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Value::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                Value::Null => {}
            }
        }
    }
    Ok(())
}

fn write_statistics(
    sheet: &mut Worksheet,
    stats: &[ColumnStats],
    header: &Format,
) -> Result<(), ExportError> {
    for (col, name) in STATS_HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col_index(col)?, *name, header)?;
    }
    for (i, stat) in stats.iter().enumerate() {
        let r = row_index(i + 1)?;
        let rounded = stat.rounded();
        sheet.write_string(r, 0, &rounded.column)?;
        let values = [rounded.mean, rounded.median, rounded.mode, rounded.std_dev];
        for (c, value) in values.iter().enumerate() {
            if let Some(v) = value {
                sheet.write_number(r, col_index(c + 1)?, *v)?;
            }
        }
    }
    Ok(())
}

fn row_index(r: usize) -> Result<u32, ExportError> {
    u32::try_from(r).map_err(|_| ExportError::TooLarge)
}

fn col_index(c: usize) -> Result<u16, ExportError> {
    u16::try_from(c).map_err(|_| ExportError::TooLarge)
}

/// Write an exported byte stream to disk.
pub fn save(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes)?;
    log::info!("Saved workbook to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading back
// ---------------------------------------------------------------------------

/// Read the first sheet of a workbook as a table.
///
/// Column kinds follow the stored cell types: any text or boolean cell makes
/// a column categorical, so digit-only labels stay text. Purely numeric
/// columns come back as integers when every value is whole, otherwise as
/// floats. Blank cells are missing values.
pub fn read_data_sheet(bytes: &[u8]) -> Result<Table, ExportError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ExportError::NoSheets)?;
    let range = workbook.worksheet_range(&first)?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(ExportError::MissingHeader)?
        .iter()
        .map(|cell| match cell {
            Data::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    let body: Vec<&[Data]> = rows.collect();

    let cell = |row: &[Data], col: usize| row.get(col).cloned().unwrap_or(Data::Empty);
    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|col| stored_kind(body.iter().map(|row| cell(*row, col))))
        .collect();

    let schema = Schema::new(
        headers
            .into_iter()
            .zip(kinds.iter())
            .map(|(name, &kind)| ColumnSpec { name, kind })
            .collect(),
    )?;
    let rows = body
        .iter()
        .map(|row| {
            kinds
                .iter()
                .enumerate()
                .map(|(col, &kind)| stored_value(&cell(*row, col), kind))
                .collect()
        })
        .collect();
    Ok(Table::new(schema, rows)?)
}

/// Largest magnitude at which every whole `f64` is still an exact `i64`.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn stored_kind(cells: impl Iterator<Item = Data>) -> ColumnKind {
    let (mut has_numbers, mut integral) = (false, true);
    for cell in cells {
        match cell {
            Data::Empty | Data::Error(_) => {}
            Data::Int(_) => has_numbers = true,
            Data::Float(f) => {
                has_numbers = true;
                integral &= f.fract() == 0.0 && f.abs() <= MAX_EXACT_INT;
            }
            _ => return ColumnKind::Categorical,
        }
    }
    // An all-blank column is an all-missing float, as for CSV input.
    if integral && has_numbers {
        ColumnKind::Integer
    } else {
        ColumnKind::Float
    }
}

fn stored_value(cell: &Data, kind: ColumnKind) -> Value {
    match (cell, kind) {
        (Data::Empty | Data::Error(_), _) => Value::Null,
        (Data::Int(i), ColumnKind::Integer) => Value::Int(*i),
        (Data::Float(f), ColumnKind::Integer) => Value::Int(*f as i64),
        (Data::Int(i), ColumnKind::Float) => Value::Float(*i as f64),
        (Data::Float(f), ColumnKind::Float) => Value::Float(*f),
        (Data::Bool(b), _) => Value::Bool(*b),
        (Data::String(s), _) => Value::Text(s.clone()),
        (other, _) => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn bookings() -> Table {
        let header = ["hotel", "lead_time", "country", "adr", "agent"];
        let rows = [
            ["Resort Hotel", "342", "PRT", "0", "9"],
            ["City Hotel", "7", "GBR", "75.33", ""],
            ["City Hotel", "13", "USA", "107.1234567891", "240"],
        ];
        Table::from_records(
            header.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn data_sheet_round_trips() {
        let table = bookings();
        let bytes = write_workbook(&table, None, &[]).unwrap();
        let back = read_data_sheet(&bytes).unwrap();

        assert_eq!(
            back.schema().names().collect::<Vec<_>>(),
            table.schema().names().collect::<Vec<_>>()
        );
        assert_eq!(back.len(), table.len());
        for (a, b) in table.rows().iter().zip(back.rows()) {
            for (x, y) in a.iter().zip(b) {
                match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9, "{x} != {y}"),
                    _ => assert_eq!(x, y),
                }
            }
        }
        let kinds: Vec<ColumnKind> = back.schema().columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Categorical,
                ColumnKind::Integer,
                ColumnKind::Categorical,
                ColumnKind::Float,
                ColumnKind::Integer
            ]
        );
    }

    #[test]
    fn statistics_and_chart_sheets_follow_data() {
        let table = bookings();
        let stats = vec![ColumnStats {
            column: "adr".to_string(),
            count: 3,
            mean: Some(60.817),
            median: Some(75.33),
            mode: Some(0.0),
            std_dev: None,
        }];
        let png = crate::chart::encode_png(&crate::chart::line_chart(&[]).unwrap()).unwrap();
        let charts = vec![ChartImage {
            name: "Line Chart".to_string(),
            png,
        }];

        let bytes = write_workbook(&table, Some(&stats), &charts).unwrap();
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.as_slice())).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Data", "Statistics", "Line Chart"]);

        let range = workbook.worksheet_range(STATS_SHEET).unwrap();
        let row: Vec<&Data> = range.rows().nth(1).unwrap().iter().collect();
        assert_eq!(row[0], &Data::String("adr".to_string()));
        assert_eq!(row[1], &Data::Float(60.82));
        // Undefined std dev is left blank.
        assert_eq!(row[4], &Data::Empty);
    }

    #[test]
    fn digit_only_labels_stay_text() {
        let schema = Schema::new(vec![
            ColumnSpec { name: "hotel".to_string(), kind: ColumnKind::Categorical },
            ColumnSpec { name: "agent".to_string(), kind: ColumnKind::Categorical },
            ColumnSpec { name: "repeated".to_string(), kind: ColumnKind::Categorical },
        ])
        .unwrap();
        let table = Table::new(
            schema,
            vec![
                vec![
                    Value::Text("City Hotel".into()),
                    Value::Text("NULL".into()),
                    Value::Bool(false),
                ],
                vec![
                    Value::Text("Resort Hotel".into()),
                    Value::Text("9".into()),
                    Value::Bool(true),
                ],
            ],
        )
        .unwrap();
        // Only the row whose agent looks numeric survives the filter.
        let kept = table.with_rows(vec![table.rows()[1].clone()]);

        let back = read_data_sheet(&write_workbook(&kept, None, &[]).unwrap()).unwrap();
        assert_eq!(back.schema(), kept.schema());
        assert_eq!(back.rows()[0][1], Value::Text("9".to_string()));
        assert_eq!(back.rows()[0][2], Value::Bool(true));
        assert_eq!(back, kept);
    }

    #[test]
    fn empty_table_keeps_its_header() {
        let empty = bookings().with_rows(Vec::new());
        let back = read_data_sheet(&write_workbook(&empty, None, &[]).unwrap()).unwrap();
        assert_eq!(back.len(), 0);
        assert_eq!(back.schema().len(), 5);
    }
}
