use std::collections::BTreeSet;

use super::model::{Row, Table};
use crate::error::SchemaError;

/// Calendar months in display order.
pub const MONTH_ORDER: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ---------------------------------------------------------------------------
// Filter dimensions
// ---------------------------------------------------------------------------

/// The three columns a user can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDimension {
    Hotel,
    Country,
    Month,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 3] = [
        FilterDimension::Hotel,
        FilterDimension::Country,
        FilterDimension::Month,
    ];

    /// Source column backing this dimension.
    pub fn column(self) -> &'static str {
        match self {
            FilterDimension::Hotel => "hotel",
            FilterDimension::Country => "country",
            FilterDimension::Month => "arrival_date_month",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            FilterDimension::Hotel => "Hotel type",
            FilterDimension::Country => "Country",
            FilterDimension::Month => "Arrival month",
        }
    }

    /// Every value the user may choose from, in display order.
    ///
    /// Months always offer the full calendar; hotels and countries offer the
    /// distinct values present in the table.
    pub fn options(self, table: &Table) -> Result<Vec<String>, SchemaError> {
        match self {
            FilterDimension::Month => {
                table.schema().index_of(self.column())?;
                Ok(MONTH_ORDER.iter().map(|m| m.to_string()).collect())
            }
            _ => table.distinct_labels(self.column()),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter selection: which values are allowed per dimension
// ---------------------------------------------------------------------------

/// Allowed values per dimension. An empty set allows nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub hotels: BTreeSet<String>,
    pub countries: BTreeSet<String>,
    pub months: BTreeSet<String>,
}

impl FilterSelection {
    /// Selection with every option of every dimension selected.
    pub fn all(table: &Table) -> Result<Self, SchemaError> {
        let mut selection = FilterSelection::default();
        for dim in FilterDimension::ALL {
            *selection.get_mut(dim) = dim.options(table)?.into_iter().collect();
        }
        Ok(selection)
    }

    pub fn get(&self, dim: FilterDimension) -> &BTreeSet<String> {
        match dim {
            FilterDimension::Hotel => &self.hotels,
            FilterDimension::Country => &self.countries,
            FilterDimension::Month => &self.months,
        }
    }

    pub fn get_mut(&mut self, dim: FilterDimension) -> &mut BTreeSet<String> {
        match dim {
            FilterDimension::Hotel => &mut self.hotels,
            FilterDimension::Country => &mut self.countries,
            FilterDimension::Month => &mut self.months,
        }
    }

    /// Flip a single value in a dimension.
    pub fn toggle(&mut self, dim: FilterDimension, value: &str) {
        let selected = self.get_mut(dim);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Rows of a source table that passed a selection, in source order.
#[derive(Debug, Clone)]
pub struct FilteredTable<'a> {
    source: &'a Table,
    indices: Vec<usize>,
}

impl<'a> FilteredTable<'a> {
    /// The unfiltered table this view was taken from.
    pub fn source(&self) -> &'a Table {
        self.source
    }

    /// Source row indices that passed.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a Row> + '_ {
        let source = self.source;
        self.indices.iter().map(move |&i| &source.rows()[i])
    }

    /// Copy the passing rows into an owned table with the same schema.
    pub fn to_table(&self) -> Table {
        self.source.with_rows(self.rows().cloned().collect())
    }
}

/// Keep the rows whose hotel, country and month are all selected.
///
/// Missing cells never match. Values in the selection that do not occur in
/// the table are ignored.
pub fn filter<'a>(
    table: &'a Table,
    selection: &FilterSelection,
) -> Result<FilteredTable<'a>, SchemaError> {
    let schema = table.schema();
    let checks: Vec<(usize, &BTreeSet<String>)> = FilterDimension::ALL
        .iter()
        .map(|&dim| Ok((schema.index_of(dim.column())?, selection.get(dim))))
        .collect::<Result<_, SchemaError>>()?;

    if checks.iter().any(|(_, selected)| selected.is_empty()) {
        return Ok(FilteredTable {
            source: table,
            indices: Vec::new(),
        });
    }

    let indices = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            checks.iter().all(|(col, selected)| match row[*col].label() {
                Some(label) => selected.contains(&label),
                None => false,
            })
        })
        .map(|(i, _)| i)
        .collect();

    Ok(FilteredTable { source: table, indices })
}
