use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
///
/// Numeric columns only ever hold `Int`, `Float` or `Null`; categorical
/// columns hold `Text`, `Bool` or `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Explicit missing marker.
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, ""),
        }
    }
}

impl Value {
    /// Numeric view of the cell, `None` for text, bools and missing values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Label used for categorical membership tests. Missing cells have none.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Integer,
    Float,
    Categorical,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column declarations with a name index.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema. Column names must be non-empty and unique.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if col.name.trim().is_empty() {
                return Err(SchemaError::EmptyColumnName(i));
            }
            if index.insert(col.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Schema { columns, index })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Position of `name`, or [`SchemaError::UnknownColumn`].
    pub fn index_of(&self, name: &str) -> Result<usize, SchemaError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownColumn(name.to_string()))
    }

    /// Position of a numeric column; fails for categorical ones.
    pub fn numeric_index_of(&self, name: &str) -> Result<usize, SchemaError> {
        let idx = self.index_of(name)?;
        if self.columns[idx].kind.is_numeric() {
            Ok(idx)
        } else {
            Err(SchemaError::NotNumeric(name.to_string()))
        }
    }

    /// Indices of every numeric column, in schema order.
    pub fn numeric_columns(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind.is_numeric())
            .map(|(i, _)| i)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// One booking record; cells follow schema order.
pub type Row = Vec<Value>;

/// Immutable, schema-typed table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    rows: Vec<Row>,
}

impl Table {
    /// Assemble a table, checking every row against the schema width and the
    /// column kinds.
    pub fn new(schema: Schema, rows: Vec<Row>) -> Result<Self, SchemaError> {
        for (row_no, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(SchemaError::RowWidth {
                    row: row_no,
                    expected: schema.len(),
                    found: row.len(),
                });
            }
            for (cell, spec) in row.iter().zip(schema.columns()) {
                let ok = match (spec.kind, cell) {
                    (_, Value::Null) => true,
                    (ColumnKind::Integer, Value::Int(_)) => true,
                    (ColumnKind::Float, Value::Float(_) | Value::Int(_)) => true,
                    (ColumnKind::Categorical, Value::Text(_) | Value::Bool(_)) => true,
                    _ => false,
                };
                if !ok {
                    return Err(SchemaError::CellKind {
                        row: row_no,
                        column: spec.name.clone(),
                    });
                }
            }
        }
        Ok(Table { schema, rows })
    }

    /// Infer a typed table from a header and raw string records.
    ///
    /// Per column: all non-empty cells parse as `i64` → integer; else all
    /// parse as `f64` → float; otherwise categorical. Empty cells are `Null`,
    /// and a column with no non-empty cell is treated as an all-missing float.
    pub fn from_records(
        headers: Vec<String>,
        records: Vec<Vec<String>>,
    ) -> Result<Self, SchemaError> {
        let width = headers.len();
        for (row_no, rec) in records.iter().enumerate() {
            if rec.len() != width {
                return Err(SchemaError::RowWidth {
                    row: row_no,
                    expected: width,
                    found: rec.len(),
                });
            }
        }

        let kinds: Vec<ColumnKind> = (0..width)
            .map(|col| infer_kind(records.iter().map(|r| r[col].as_str())))
            .collect();

        let schema = Schema::new(
            headers
                .into_iter()
                .zip(kinds.iter())
                .map(|(name, &kind)| ColumnSpec { name, kind })
                .collect(),
        )?;

        let rows = records
            .into_iter()
            .map(|rec| {
                rec.into_iter()
                    .zip(kinds.iter())
                    .map(|(cell, &kind)| parse_cell(&cell, kind))
                    .collect()
            })
            .collect();

        Table::new(schema, rows)
    }

    /// A table with this schema and a subset of this table's rows.
    pub(crate) fn with_rows(&self, rows: Vec<Row>) -> Table {
        Table {
            schema: self.schema.clone(),
            rows,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct non-missing labels of a column, in first-occurrence order.
    pub fn distinct_labels(&self, column: &str) -> Result<Vec<String>, SchemaError> {
        let idx = self.schema.index_of(column)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in &self.rows {
            if let Some(label) = row[idx].label() {
                if seen.insert(label.clone()) {
                    out.push(label);
                }
            }
        }
        Ok(out)
    }
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> ColumnKind {
    let mut non_empty = cells.filter(|c| !c.trim().is_empty()).peekable();
    if non_empty.peek().is_none() {
        return ColumnKind::Float;
    }
    if non_empty.clone().all(|c| c.trim().parse::<i64>().is_ok()) {
        ColumnKind::Integer
    } else if non_empty.all(|c| c.trim().parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else {
        ColumnKind::Categorical
    }
}

fn parse_cell(cell: &str, kind: ColumnKind) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnKind::Integer => trimmed.parse().map(Value::Int).unwrap_or(Value::Null),
        // NaN and infinities are missing values, as in pandas.
        ColumnKind::Float => match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Value::Float(v),
            _ => Value::Null,
        },
        ColumnKind::Categorical => Value::Text(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn infers_column_kinds() {
        let table = Table::from_records(
            strings(&["hotel", "lead_time", "adr", "note"]),
            vec![
                strings(&["Resort Hotel", "342", "0", "a"]),
                strings(&["City Hotel", "7", "75.5", ""]),
                strings(&["City Hotel", "", "98", "1"]),
            ],
        )
        .unwrap();

        let kinds: Vec<ColumnKind> = table.schema().columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Categorical,
                ColumnKind::Integer,
                ColumnKind::Float,
                ColumnKind::Categorical
            ]
        );
        assert_eq!(table.rows()[2][1], Value::Null);
        assert_eq!(table.rows()[1][2], Value::Float(75.5));
        assert_eq!(table.rows()[1][3], Value::Null);
    }

    #[test]
    fn all_empty_column_is_missing_float() {
        let table = Table::from_records(
            strings(&["agent"]),
            vec![strings(&[""]), strings(&[" "])],
        )
        .unwrap();
        assert_eq!(table.schema().columns()[0].kind, ColumnKind::Float);
        assert!(table.rows().iter().all(|r| r[0].is_null()));
    }

    #[test]
    fn rejects_duplicate_and_empty_headers() {
        let dup = Table::from_records(strings(&["a", "a"]), vec![]);
        assert!(matches!(dup, Err(SchemaError::DuplicateColumn(name)) if name == "a"));

        let empty = Table::from_records(strings(&["a", " "]), vec![]);
        assert!(matches!(empty, Err(SchemaError::EmptyColumnName(1))));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Table::from_records(strings(&["a", "b"]), vec![strings(&["1"])]).unwrap_err();
        assert!(matches!(err, SchemaError::RowWidth { row: 0, expected: 2, found: 1 }));
    }

    #[test]
    fn schema_lookups_are_checked() {
        let table = Table::from_records(
            strings(&["hotel", "adr"]),
            vec![strings(&["City Hotel", "10.0"])],
        )
        .unwrap();
        assert_eq!(table.schema().numeric_index_of("adr").unwrap(), 1);
        assert!(matches!(
            table.schema().numeric_index_of("hotel"),
            Err(SchemaError::NotNumeric(_))
        ));
        assert!(matches!(
            table.schema().index_of("missing"),
            Err(SchemaError::UnknownColumn(_))
        ));
    }

    #[test]
    fn distinct_labels_keep_first_occurrence_order() {
        let table = Table::from_records(
            strings(&["country"]),
            vec![
                strings(&["PRT"]),
                strings(&["GBR"]),
                strings(&[""]),
                strings(&["PRT"]),
                strings(&["ESP"]),
            ],
        )
        .unwrap();
        assert_eq!(table.distinct_labels("country").unwrap(), vec!["PRT", "GBR", "ESP"]);
    }
}
