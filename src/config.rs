use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming a JSON config file for the desktop app.
pub const CONFIG_ENV: &str = "BOOKING_DASHBOARD_CONFIG";

/// What the dashboard shows when the filter matches no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyFilterPolicy {
    /// Show the (empty) data table plus a notice; skip statistics and charts.
    #[default]
    ShortCircuit,
    /// Show only the notice.
    HideDashboard,
}

/// What the dashboard shows when the table has no numeric columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyNumericPolicy {
    /// Keep the statistics section with a "no numeric columns" note.
    #[default]
    MarkAbsent,
    /// Drop the statistics section entirely.
    Omit,
}

/// Pipeline behaviour shared by the dashboard and the report binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub on_empty_filter: EmptyFilterPolicy,
    pub on_empty_numeric: EmptyNumericPolicy,
    /// Embed chart images in exported workbooks.
    pub export_includes_charts: bool,
    /// Add a rounded statistics sheet after the data sheet.
    pub include_statistics_sheet: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            on_empty_filter: EmptyFilterPolicy::default(),
            on_empty_numeric: EmptyNumericPolicy::default(),
            export_includes_charts: true,
            include_statistics_sheet: true,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Config from the file named by [`CONFIG_ENV`], or defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}
