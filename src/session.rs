use std::collections::BTreeSet;

use crate::chart;
use crate::config::PipelineConfig;
use crate::data::filter::{filter, FilterDimension, FilterSelection, FilteredTable};
use crate::data::model::Table;
use crate::error::{ExportError, SchemaError};
use crate::export;
use crate::report::{summarize, Summary};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A loaded table plus the user's current selection.
///
/// The table is never mutated; every selection change recomputes the cached
/// summary from scratch. Loading another file means building a new session.
#[derive(Debug)]
pub struct Session {
    table: Table,
    selection: FilterSelection,
    config: PipelineConfig,
    summary: Summary,
}

impl Session {
    /// Start with every hotel, country and month selected.
    pub fn new(table: Table, config: PipelineConfig) -> Result<Self, SchemaError> {
        let selection = FilterSelection::all(&table)?;
        let summary = summarize(&filter(&table, &selection)?)?;
        Ok(Self {
            table,
            selection,
            config,
            summary,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Rows passing the current selection.
    pub fn filtered(&self) -> Result<FilteredTable<'_>, SchemaError> {
        filter(&self.table, &self.selection)
    }

    /// Every value the user may pick for `dim`.
    pub fn options(&self, dim: FilterDimension) -> Result<Vec<String>, SchemaError> {
        dim.options(&self.table)
    }

    pub fn toggle(&mut self, dim: FilterDimension, value: &str) -> Result<(), SchemaError> {
        self.selection.toggle(dim, value);
        self.refresh()
    }

    pub fn select_all(&mut self, dim: FilterDimension) -> Result<(), SchemaError> {
        *self.selection.get_mut(dim) = dim.options(&self.table)?.into_iter().collect();
        self.refresh()
    }

    pub fn select_none(&mut self, dim: FilterDimension) -> Result<(), SchemaError> {
        *self.selection.get_mut(dim) = BTreeSet::new();
        self.refresh()
    }

    pub fn set_selection(&mut self, selection: FilterSelection) -> Result<(), SchemaError> {
        self.selection = selection;
        self.refresh()
    }

    fn refresh(&mut self) -> Result<(), SchemaError> {
        let filtered = filter(&self.table, &self.selection)?;
        let visible = filtered.len();
        let summary = summarize(&filtered)?;
        self.summary = summary;
        log::debug!("Recomputed summary: {visible} of {} rows", self.table.len());
        Ok(())
    }

    /// Export the filtered rows as an `.xlsx` byte stream.
    ///
    /// Charts are rendered only when requested and there is something to
    /// chart; the statistics sheet follows the session config.
    pub fn export(&self, include_charts: bool) -> Result<Vec<u8>, ExportError> {
        let table = self.filtered()?.to_table();
        let report = self.summary.report();

        let statistics = if self.config.include_statistics_sheet {
            report.and_then(|r| r.statistics.as_deref())
        } else {
            None
        };
        let charts = match report {
            Some(report) if include_charts => chart::render_charts(report)?,
            _ => Vec::new(),
        };

        export::write_workbook(&table, statistics, &charts)
    }
}

#[cfg(test)]
mod tests {
    use calamine::{Reader, Xlsx};
    use pretty_assertions::assert_eq;

    use super::*;

    fn bookings() -> Table {
        let header = [
            "hotel",
            "country",
            "arrival_date_month",
            "customer_type",
            "lead_time",
            "adr",
        ];
        let rows = [
            ["Resort Hotel", "PRT", "July", "Transient", "342", "0"],
            ["City Hotel", "GBR", "July", "Contract", "7", "75"],
            ["City Hotel", "PRT", "August", "Transient", "13", "98"],
            ["Resort Hotel", "ESP", "March", "Group", "60", "120.5"],
        ];
        Table::from_records(
            header.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect(),
        )
        .unwrap()
    }

    fn session() -> Session {
        Session::new(bookings(), PipelineConfig::default()).unwrap()
    }

    fn sheet_names(bytes: Vec<u8>) -> Vec<String> {
        let workbook: Xlsx<_> = Xlsx::new(std::io::Cursor::new(bytes)).unwrap();
        workbook.sheet_names()
    }

    #[test]
    fn starts_with_everything_selected() {
        let session = session();
        assert_eq!(session.filtered().unwrap().len(), 4);
        assert_eq!(session.selection().months.len(), 12);
        assert_eq!(session.summary().report().unwrap().rows, 4);
    }

    #[test]
    fn toggling_recomputes_summary() {
        let mut session = session();
        session.toggle(FilterDimension::Hotel, "Resort Hotel").unwrap();
        let report = session.summary().report().unwrap();
        assert_eq!(report.rows, 2);
        // Deselected hotels stay in the counts with zero.
        let resort = report.hotel_counts.iter().find(|c| c.label == "Resort Hotel").unwrap();
        assert_eq!(resort.count, 0);
    }

    #[test]
    fn every_toggle_replaces_the_cached_summary() {
        let mut session = session();
        session.toggle(FilterDimension::Hotel, "City Hotel").unwrap();
        assert_eq!(session.summary().report().unwrap().rows, 2);
        session.toggle(FilterDimension::Hotel, "Resort Hotel").unwrap();
        assert!(session.summary().is_empty());
        session.toggle(FilterDimension::Hotel, "City Hotel").unwrap();
        assert_eq!(session.summary().report().unwrap().rows, 2);
        assert_eq!(session.filtered().unwrap().len(), 2);
    }

    #[test]
    fn select_none_then_all() {
        let mut session = session();
        session.select_none(FilterDimension::Country).unwrap();
        assert!(session.summary().is_empty());
        session.select_all(FilterDimension::Country).unwrap();
        assert_eq!(session.summary().report().unwrap().rows, 4);
    }

    #[test]
    fn export_layout_follows_config() {
        let session = session();
        assert_eq!(
            sheet_names(session.export(true).unwrap()),
            vec![
                "Data",
                "Statistics",
                "Bar Chart",
                "Line Chart",
                "Pie Chart",
                "Heatmap",
                "Scatter Plot"
            ]
        );
        assert_eq!(sheet_names(session.export(false).unwrap()), vec!["Data", "Statistics"]);

        let config = PipelineConfig {
            include_statistics_sheet: false,
            ..PipelineConfig::default()
        };
        let session = Session::new(bookings(), config).unwrap();
        assert_eq!(sheet_names(session.export(false).unwrap()), vec!["Data"]);
    }

    #[test]
    fn empty_selection_exports_header_only() {
        let mut session = session();
        session.select_none(FilterDimension::Month).unwrap();
        let bytes = session.export(true).unwrap();
        let back = export::read_data_sheet(&bytes).unwrap();
        assert_eq!(back.len(), 0);
        assert_eq!(back.schema().len(), 6);
        assert_eq!(sheet_names(bytes), vec!["Data"]);
    }

    #[test]
    fn missing_filter_column_is_rejected() {
        let table = Table::from_records(
            vec!["hotel".to_string()],
            vec![vec!["City Hotel".to_string()]],
        )
        .unwrap();
        assert!(matches!(
            Session::new(table, PipelineConfig::default()),
            Err(SchemaError::UnknownColumn(_))
        ));
    }
}
