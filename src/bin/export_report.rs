use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use booking_dashboard::config::PipelineConfig;
use booking_dashboard::data::filter::{FilterDimension, FilterSelection};
use booking_dashboard::data::loader;
use booking_dashboard::export;
use booking_dashboard::session::Session;

#[derive(Parser)]
#[command(name = "export-report")]
#[command(
    about = "Filter a hotel bookings file and export it to an Excel workbook",
    long_about = None
)]
struct Cli {
    /// Bookings file (.csv, .json or .parquet)
    input: PathBuf,

    /// Output workbook
    #[arg(short, long, default_value = "hotel_bookings_report.xlsx")]
    output: PathBuf,

    /// Keep only these hotels (repeatable; default: all)
    #[arg(long = "hotel", value_name = "HOTEL")]
    hotels: Vec<String>,

    /// Keep only these countries (repeatable; default: all)
    #[arg(long = "country", value_name = "COUNTRY")]
    countries: Vec<String>,

    /// Keep only these arrival months (repeatable; default: all)
    #[arg(long = "month", value_name = "MONTH")]
    months: Vec<String>,

    /// Leave chart images out of the workbook
    #[arg(long)]
    no_charts: bool,

    /// JSON pipeline configuration
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn values(&self, dim: FilterDimension) -> &[String] {
        match dim {
            FilterDimension::Hotel => &self.hotels,
            FilterDimension::Country => &self.countries,
            FilterDimension::Month => &self.months,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    let include_charts = config.export_includes_charts && !cli.no_charts;

    let table = loader::load_file(&cli.input)
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;
    let mut session = Session::new(table, config)?;

    let mut selection: FilterSelection = session.selection().clone();
    for dim in FilterDimension::ALL {
        let requested = cli.values(dim);
        if requested.is_empty() {
            continue;
        }
        let options = session.options(dim)?;
        for value in requested.iter().filter(|v| !options.contains(*v)) {
            log::warn!("{} `{value}` does not occur in the data", dim.title());
        }
        *selection.get_mut(dim) = requested.iter().cloned().collect();
    }
    session.set_selection(selection)?;

    let bytes = session.export(include_charts).context("Failed to build workbook")?;
    export::save(&cli.output, &bytes)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    let rows = session.summary().report().map_or(0, |r| r.rows);
    println!(
        "Exported {rows} of {} bookings to {}{}",
        session.table().len(),
        cli.output.display(),
        if include_charts && rows > 0 { " with charts" } else { "" }
    );
    Ok(())
}
