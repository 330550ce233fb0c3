//! Static PNG renderings of the dashboard charts, used for spreadsheet export.
//!
//! Charts are drawn with plotters into an in-memory RGB buffer and encoded as
//! PNG. Text uses the Ubuntu font bundled with egui, so rendering never
//! depends on fonts installed on the host.

use std::io::Cursor;
use std::sync::OnceLock;

use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;

use crate::color::{self, ColorMap, Rgb};
use crate::error::ExportError;
use crate::report::{format_stat, CategoryCount, CorrelationMatrix, ScatterPoint, SummaryReport};

pub const WIDTH: u32 = 900;
pub const HEIGHT: u32 = 500;
const MARGIN: u32 = 15;

const FONT: &str = "sans-serif";
const AXIS: Rgb = [60, 60, 60];
const LINE: Rgb = [31, 119, 180];

type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// A rendered chart and the sheet name it is exported under.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub name: String,
    pub png: Vec<u8>,
}

/// Render the five dashboard charts, in export order.
pub fn render_charts(report: &SummaryReport) -> Result<Vec<ChartImage>, ExportError> {
    let hotel_colors = ColorMap::new(&labels(&report.hotel_counts));

    let charts = [
        ("Bar Chart", bar_chart(&report.hotel_counts, &hotel_colors)?),
        ("Line Chart", line_chart(&report.month_counts)?),
        ("Pie Chart", pie_chart(&report.customer_counts)?),
        ("Heatmap", heatmap(report.correlation.as_ref())?),
        ("Scatter Plot", scatter_plot(&report.scatter, &hotel_colors)?),
    ];

    charts
        .into_iter()
        .map(|(name, image)| -> Result<ChartImage, ExportError> {
            Ok(ChartImage {
                name: name.to_string(),
                png: encode_png(&image)?,
            })
        })
        .collect()
}

/// PNG-encode a rendered chart.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

fn labels(counts: &[CategoryCount]) -> Vec<&str> {
    counts.iter().map(|c| c.label.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Bookings per hotel type, one coloured bar each.
pub fn bar_chart(counts: &[CategoryCount], colors: &ColorMap) -> Result<RgbImage, ExportError> {
    render(|root| draw_bars(root, counts, colors).map_err(|e| e.to_string()))
}

/// Bookings per arrival month.
pub fn line_chart(counts: &[CategoryCount]) -> Result<RgbImage, ExportError> {
    render(|root| draw_months(root, counts).map_err(|e| e.to_string()))
}

/// Share of each customer type, with percentages on the slices.
pub fn pie_chart(counts: &[CategoryCount]) -> Result<RgbImage, ExportError> {
    render(|root| draw_pie(root, counts).map_err(|e| e.to_string()))
}

/// Annotated correlation matrix of the numeric columns.
pub fn heatmap(matrix: Option<&CorrelationMatrix>) -> Result<RgbImage, ExportError> {
    render(|root| draw_heatmap(root, matrix).map_err(|e| e.to_string()))
}

/// Lead time against ADR, coloured by hotel type.
pub fn scatter_plot(points: &[ScatterPoint], colors: &ColorMap) -> Result<RgbImage, ExportError> {
    render(|root| draw_scatter(root, points, colors).map_err(|e| e.to_string()))
}

fn render<F>(draw: F) -> Result<RgbImage, ExportError>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), String>,
{
    register_font()?;
    let mut buf = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;
        draw(&root).map_err(ExportError::Draw)?;
        root.present().map_err(draw_error)?;
    }
    RgbImage::from_raw(WIDTH, HEIGHT, buf)
        .ok_or_else(|| ExportError::Draw("chart buffer has the wrong size".to_string()))
}

fn register_font() -> Result<(), ExportError> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        plotters::style::register_font(FONT, FontStyle::Normal, epaint_default_fonts::UBUNTU_LIGHT)
            .is_ok()
    });
    if ok {
        Ok(())
    } else {
        Err(ExportError::Draw("bundled chart font is unreadable".to_string()))
    }
}

fn draw_error(err: impl std::fmt::Display) -> ExportError {
    ExportError::Draw(err.to_string())
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    counts: &[CategoryCount],
    colors: &ColorMap,
) -> DrawResult<DB> {
    let names = labels(counts);
    let mut chart = ChartBuilder::on(root)
        .caption("Bookings by Hotel Type", (FONT, 26).into_font())
        .margin(MARGIN)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .build_cartesian_2d(category_range(counts.len()), 0f64..count_ceiling(counts))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len().max(1))
        .x_label_formatter(&|x| category_label(&names, *x))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .x_desc("Hotel")
        .y_desc("Bookings")
        .axis_desc_style((FONT, 16))
        .label_style((FONT, 14))
        .draw()?;

    // Zero bars are left out so they leave no sliver on the axis.
    chart.draw_series(counts.iter().enumerate().filter(|(_, c)| c.count > 0).map(|(i, c)| {
        let x = i as f64;
        let fill = rgb(colors.color_for(&c.label)).filled();
        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, c.count as f64)], fill)
    }))?;
    Ok(())
}

fn draw_months<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    counts: &[CategoryCount],
) -> DrawResult<DB> {
    let names: Vec<String> = counts.iter().map(|c| c.label.chars().take(3).collect()).collect();
    let mut chart = ChartBuilder::on(root)
        .caption("Bookings by Arrival Month", (FONT, 26).into_font())
        .margin(MARGIN)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .build_cartesian_2d(category_range(counts.len()), 0f64..count_ceiling(counts))?;

    chart
        .configure_mesh()
        .x_labels(counts.len().max(1))
        .x_label_formatter(&|x| category_label(&names, *x))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .x_desc("Month")
        .y_desc("Bookings")
        .axis_desc_style((FONT, 16))
        .label_style((FONT, 14))
        .draw()?;

    let line = rgb(LINE);
    let points: Vec<(f64, f64)> = counts
        .iter()
        .enumerate()
        .map(|(i, c)| (i as f64, c.count as f64))
        .collect();
    chart.draw_series(LineSeries::new(points.iter().copied(), line.stroke_width(2)))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 4, line.filled())))?;
    Ok(())
}

fn draw_pie<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    counts: &[CategoryCount],
) -> DrawResult<DB> {
    let centre_x = (WIDTH / 2) as i32;
    root.draw(&Text::new(
        "Customer Types",
        (centre_x, 20),
        (FONT, 26).into_font().color(&BLACK).pos(Pos::new(HPos::Center, VPos::Top)),
    ))?;

    // Slice colours follow the full category order; empty slices are skipped.
    let palette = color::generate_palette(counts.len());
    let slices: Vec<(&CategoryCount, RGBColor)> = counts
        .iter()
        .zip(palette)
        .filter(|(c, _)| c.count > 0)
        .map(|(c, fill)| (c, rgb(fill)))
        .collect();
    if slices.is_empty() {
        return Ok(());
    }

    let sizes: Vec<f64> = slices.iter().map(|(c, _)| c.count as f64).collect();
    let colors: Vec<RGBColor> = slices.iter().map(|(_, fill)| *fill).collect();
    let names: Vec<String> = slices.iter().map(|(c, _)| c.label.clone()).collect();

    let centre = (centre_x, (HEIGHT / 2 + 20) as i32);
    let radius = f64::from(HEIGHT / 2 - 70);
    let mut pie = Pie::new(&centre, &radius, &sizes, &colors, &names);
    pie.start_angle(-90.0);
    pie.label_style((FONT, 16).into_font().color(&BLACK));
    pie.percentages((FONT, 15).into_font().color(&WHITE));
    root.draw(&pie)?;
    Ok(())
}

fn draw_heatmap<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    matrix: Option<&CorrelationMatrix>,
) -> DrawResult<DB> {
    let Some(matrix) = matrix.filter(|m| !m.is_empty()) else {
        let centred = Pos::new(HPos::Center, VPos::Center);
        root.draw(&Text::new(
            "No numeric columns to correlate",
            ((WIDTH / 2) as i32, (HEIGHT / 2) as i32),
            (FONT, 20).into_font().color(&BLACK).pos(centred),
        ))?;
        return Ok(());
    };

    let n = matrix.len();
    // Row 0 is drawn at the top.
    let rows_up: Vec<&str> = matrix.columns.iter().rev().map(String::as_str).collect();
    let mut chart = ChartBuilder::on(root)
        .caption("Correlation Heatmap", (FONT, 26).into_font())
        .margin(MARGIN)
        .x_label_area_size(45)
        .y_label_area_size(180)
        .build_cartesian_2d(category_range(n), category_range(n))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|x| category_label(&matrix.columns, *x))
        .y_label_formatter(&|y| category_label(&rows_up, *y))
        .label_style((FONT, 13))
        .draw()?;

    let cells: Vec<(f64, f64, Option<f64>)> = (0..n)
        .flat_map(|i| (0..n).map(move |j| (j as f64, (n - 1 - i) as f64, matrix.get(i, j))))
        .collect();

    chart.draw_series(cells.iter().map(|&(x, y, r)| {
        let fill = rgb(r.map_or(color::UNDEFINED, color::diverging));
        Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], fill.filled())
    }))?;

    let centred = Pos::new(HPos::Center, VPos::Center);
    chart.draw_series(cells.iter().map(|&(x, y, r)| {
        let ink = if r.is_some_and(|r| r.abs() > 0.6) { WHITE } else { BLACK };
        Text::new(format_stat(r), (x, y), (FONT, 14).into_font().color(&ink).pos(centred))
    }))?;
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    points: &[ScatterPoint],
    colors: &ColorMap,
) -> DrawResult<DB> {
    let x_range = padded(bounds(points.iter().map(|p| p.lead_time)));
    let y_range = padded(bounds(points.iter().map(|p| p.adr)));
    let mut chart = ChartBuilder::on(root)
        .caption("Lead Time vs Average Daily Rate", (FONT, 26).into_font())
        .margin(MARGIN)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Lead Time (days)")
        .y_desc("ADR")
        .axis_desc_style((FONT, 16))
        .label_style((FONT, 14))
        .draw()?;

    // One series per hotel type, in first-seen order, so each gets a legend entry.
    let mut hotels: Vec<Option<&str>> = Vec::new();
    for p in points {
        if !hotels.contains(&p.hotel.as_deref()) {
            hotels.push(p.hotel.as_deref());
        }
    }
    for hotel in hotels {
        let fill = rgb(hotel.map_or(AXIS, |h| colors.color_for(h)));
        let series = points
            .iter()
            .filter(|p| p.hotel.as_deref() == hotel)
            .map(|p| Circle::new((p.lead_time, p.adr), 3, fill.filled()));
        chart
            .draw_series(series)?
            .label(hotel.unwrap_or("Unknown"))
            .legend(move |(x, y)| Circle::new((x, y), 4, fill.filled()));
    }

    if !points.is_empty() {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font((FONT, 14))
            .draw()?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rgb([r, g, b]: Rgb) -> RGBColor {
    RGBColor(r, g, b)
}

/// Axis range with one unit slot per category, centred on the indices.
fn category_range(n: usize) -> std::ops::Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Label of the category centred on `x`; ticks between categories stay blank.
fn category_label<S: AsRef<str>>(names: &[S], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    names.get(i as usize).map(|s| s.as_ref().to_string()).unwrap_or_default()
}

/// Top of a count axis, leaving headroom above the tallest value.
fn count_ceiling(counts: &[CategoryCount]) -> f64 {
    let max = counts.iter().map(|c| c.count).max().unwrap_or(0);
    (max as f64 * 1.1).max(1.0)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Widen `[lo, hi]` by 5% each side; a single value or no values get a unit range.
fn padded((lo, hi): (f64, f64)) -> std::ops::Range<f64> {
    if !(lo.is_finite() && hi.is_finite()) {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad)..(hi + pad)
}
