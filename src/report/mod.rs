/// Aggregation over a filtered table: descriptive statistics, category
/// counts, the lead-time/ADR scatter and the correlation matrix.

pub mod stats;
pub mod summary;

pub use summary::{
    format_stat, summarize, CategoryCount, ColumnStats, CorrelationMatrix, ScatterPoint, Summary,
    SummaryReport,
};
