use std::path::Path;

use booking_dashboard::config::PipelineConfig;
use booking_dashboard::data::filter::FilterDimension;
use booking_dashboard::data::model::Table;
use booking_dashboard::error::SchemaError;
use booking_dashboard::export;
use booking_dashboard::session::Session;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded bookings and current selection (None until a file is opened).
    pub session: Option<Session>,

    /// Pipeline behaviour applied to every session.
    pub config: PipelineConfig,

    /// Whether exports embed chart images.
    pub include_charts: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            session: None,
            include_charts: config.export_includes_charts,
            config,
            status_message: None,
        }
    }

    /// Replace the current session with a freshly loaded table.
    pub fn set_table(&mut self, table: Table) {
        match Session::new(table, self.config.clone()) {
            Ok(session) => {
                self.session = Some(session);
                self.status_message = None;
            }
            Err(e) => self.report_error("Cannot summarise bookings", &e),
        }
    }

    /// Toggle a single value in a dimension's filter.
    pub fn toggle_filter_value(&mut self, dim: FilterDimension, value: &str) {
        self.update_session(|session| session.toggle(dim, value));
    }

    /// Select every value of a dimension.
    pub fn select_all(&mut self, dim: FilterDimension) {
        self.update_session(|session| session.select_all(dim));
    }

    /// Deselect every value of a dimension.
    pub fn select_none(&mut self, dim: FilterDimension) {
        self.update_session(|session| session.select_none(dim));
    }

    fn update_session(&mut self, f: impl FnOnce(&mut Session) -> Result<(), SchemaError>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = f(session) {
            self.report_error("Filter failed", &e);
        }
    }

    /// Export the filtered rows to `path`.
    pub fn export_to(&mut self, path: &Path) {
        let Some(session) = &self.session else {
            return;
        };
        let result = session
            .export(self.include_charts)
            .and_then(|bytes| export::save(path, &bytes));
        match result {
            Ok(()) => self.status_message = Some(format!("Exported to {}", path.display())),
            Err(e) => self.report_error("Export failed", &e),
        }
    }

    pub fn report_error(&mut self, context: &str, err: &dyn std::error::Error) {
        log::error!("{context}: {err}");
        self.status_message = Some(format!("Error: {context}: {err}"));
    }
}
