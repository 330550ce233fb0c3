use std::collections::HashMap;

use super::stats;
use crate::data::filter::{FilteredTable, MONTH_ORDER};
use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Result of summarising a filtered table.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    /// No rows passed the filter; nothing was computed.
    Empty,
    Report(SummaryReport),
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        matches!(self, Summary::Empty)
    }

    pub fn report(&self) -> Option<&SummaryReport> {
        match self {
            Summary::Empty => None,
            Summary::Report(report) => Some(report),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    /// Total filtered rows.
    pub rows: usize,
    /// Per numeric column statistics; `None` when the table has no numeric
    /// columns at all.
    pub statistics: Option<Vec<ColumnStats>>,
    pub hotel_counts: Vec<CategoryCount>,
    /// Always twelve entries in calendar order.
    pub month_counts: Vec<CategoryCount>,
    pub customer_counts: Vec<CategoryCount>,
    pub scatter: Vec<ScatterPoint>,
    /// `None` when the table has no numeric columns.
    pub correlation: Option<CorrelationMatrix>,
}

/// Unrounded descriptive statistics of one numeric column. A `None` field is
/// undefined for the column's non-missing values (e.g. a single-row standard
/// deviation).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub column: String,
    /// Non-missing values the statistics were computed from.
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub mode: Option<f64>,
    pub std_dev: Option<f64>,
}

impl ColumnStats {
    /// Copy with every statistic rounded to two decimals for display.
    pub fn rounded(&self) -> ColumnStats {
        let r = |v: Option<f64>| v.map(|x| stats::round_to(x, 2));
        ColumnStats {
            column: self.column.clone(),
            count: self.count,
            mean: r(self.mean),
            median: r(self.median),
            mode: r(self.mode),
            std_dev: r(self.std_dev),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// One (lead time, ADR) observation, tagged with its hotel type.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub lead_time: f64,
    pub adr: f64,
    pub hotel: Option<String>,
}

/// Symmetric pairwise Pearson correlations. Undefined pairs are `None`; the
/// diagonal is always `Some(1.0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Format a statistic for display: two decimals, or a dash when undefined.
pub fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "–".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Compute the summary report for a filtered table.
///
/// An empty table short-circuits to [`Summary::Empty`] without touching any
/// column. Category counts are reindexed onto a fixed domain and zero-filled:
/// months onto the calendar, hotels and customer types onto the values of the
/// unfiltered table.
pub fn summarize(filtered: &FilteredTable<'_>) -> Result<Summary, SchemaError> {
    if filtered.is_empty() {
        log::debug!("Filter matched no rows; skipping aggregation");
        return Ok(Summary::Empty);
    }

    let source = filtered.source();
    let schema = source.schema();
    let numeric = schema.numeric_columns();

    let columns: Vec<(String, Vec<Option<f64>>)> = numeric
        .iter()
        .map(|&idx| {
            let values = filtered.rows().map(|row| row[idx].as_f64()).collect();
            (schema.columns()[idx].name.clone(), values)
        })
        .collect();

    let statistics = if columns.is_empty() {
        None
    } else {
        Some(columns.iter().map(|(name, values)| column_stats(name, values)).collect())
    };

    let hotel_counts = ranked_counts(filtered, "hotel")?;
    let customer_counts = ranked_counts(filtered, "customer_type")?;
    let month_counts = counts_over(
        filtered,
        "arrival_date_month",
        MONTH_ORDER.iter().map(|m| m.to_string()).collect(),
    )?;

    let scatter = scatter_points(filtered)?;
    let correlation = if columns.is_empty() {
        None
    } else {
        Some(correlation_matrix(&columns))
    };

    Ok(Summary::Report(SummaryReport {
        rows: filtered.len(),
        statistics,
        hotel_counts,
        month_counts,
        customer_counts,
        scatter,
        correlation,
    }))
}

fn column_stats(name: &str, values: &[Option<f64>]) -> ColumnStats {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    ColumnStats {
        column: name.to_string(),
        count: present.len(),
        mean: stats::mean(&present),
        median: stats::median(&present),
        mode: stats::mode(&present),
        std_dev: stats::std_dev(&present),
    }
}

/// Count rows per label of `column`, reindexed onto `domain`. Labels outside
/// the domain are dropped.
fn counts_over(
    filtered: &FilteredTable<'_>,
    column: &str,
    domain: Vec<String>,
) -> Result<Vec<CategoryCount>, SchemaError> {
    let idx = filtered.source().schema().index_of(column)?;
    let mut tally: HashMap<String, usize> = HashMap::new();
    for row in filtered.rows() {
        if let Some(label) = row[idx].label() {
            *tally.entry(label).or_default() += 1;
        }
    }

    let counts: Vec<CategoryCount> = domain
        .into_iter()
        .map(|label| {
            let count = tally.remove(&label).unwrap_or(0);
            CategoryCount { label, count }
        })
        .collect();

    if !tally.is_empty() {
        log::warn!(
            "Ignoring {} unrecognised `{column}` values: {:?}",
            tally.values().sum::<usize>(),
            tally.keys().collect::<Vec<_>>()
        );
    }
    Ok(counts)
}

/// Counts over the unfiltered table's values, most frequent first.
fn ranked_counts(
    filtered: &FilteredTable<'_>,
    column: &str,
) -> Result<Vec<CategoryCount>, SchemaError> {
    let domain = filtered.source().distinct_labels(column)?;
    let mut counts = counts_over(filtered, column, domain)?;
    // Stable: ties keep first-occurrence order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(counts)
}

fn scatter_points(filtered: &FilteredTable<'_>) -> Result<Vec<ScatterPoint>, SchemaError> {
    let schema = filtered.source().schema();
    // Non-numeric cells yield no point.
    let lead = schema.index_of("lead_time")?;
    let adr = schema.index_of("adr")?;
    let hotel = schema.index_of("hotel")?;

    Ok(filtered
        .rows()
        .filter_map(|row| {
            Some(ScatterPoint {
                lead_time: row[lead].as_f64()?,
                adr: row[adr].as_f64()?,
                hotel: row[hotel].label(),
            })
        })
        .collect())
}

fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let pairs: Vec<(f64, f64)> = columns[i]
                .1
                .iter()
                .zip(columns[j].1.iter())
                .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                .collect();
            let r = stats::pearson(&pairs);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix {
        columns: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}
