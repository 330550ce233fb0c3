use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{ColumnKind, ColumnSpec, Row, Schema, Table, Value};
use crate::error::{LoadError, SchemaError};

/// Categorical columns every booking dataset must carry.
pub const REQUIRED_CATEGORICAL: [&str; 4] =
    ["hotel", "country", "arrival_date_month", "customer_type"];

/// Numeric columns every booking dataset must carry.
pub const REQUIRED_NUMERIC: [&str; 2] = ["lead_time", "adr"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a booking dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one booking per line (recommended)
/// * `.json`    – `[{ "hotel": "...", "lead_time": 12, ... }, ...]`
/// * `.parquet` – flat scalar columns
///
/// The loaded table is checked for the required booking columns.
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    validate_booking_columns(&table)?;
    log::info!(
        "Loaded {} bookings with columns {:?} from {}",
        table.len(),
        table.schema().names().collect::<Vec<_>>(),
        path.display()
    );
    Ok(table)
}

/// Check that the required columns exist and the numeric ones are numeric.
pub fn validate_booking_columns(table: &Table) -> Result<(), LoadError> {
    for name in REQUIRED_CATEGORICAL.iter().chain(REQUIRED_NUMERIC.iter()) {
        if table.schema().index_of(name).is_err() {
            return Err(LoadError::MissingColumn(name.to_string()));
        }
    }
    for name in REQUIRED_NUMERIC {
        if table.schema().numeric_index_of(name).is_err() {
            return Err(LoadError::NonNumericColumn(name.to_string()));
        }
    }
    Ok(())
}

fn header_error(err: SchemaError) -> LoadError {
    match err {
        SchemaError::EmptyColumnName(_) | SchemaError::DuplicateColumn(_) => {
            LoadError::MalformedHeader(err.to_string())
        }
        other => LoadError::Schema(other),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one booking per record.
/// Column types are inferred once for the whole column.
fn load_csv(path: &Path) -> Result<Table, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| io_error(path, e))?;
    read_csv(file)
}

/// Parse CSV from any reader. Records must match the header width.
pub fn read_csv<R: std::io::Read>(source: R) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(source);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.is_empty() {
        return Err(LoadError::MissingHeader);
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(record.iter().map(|c| c.to_string()).collect::<Vec<_>>());
    }

    Table::from_records(headers, records).map_err(header_error)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "hotel": "Resort Hotel", "lead_time": 342, "adr": 0.0, ... },
///   ...
/// ]
/// ```
///
/// Column order follows the first record, then keys first seen later.
fn load_json(path: &Path) -> Result<Table, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Malformed("expected top-level JSON array".to_string()))?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }
    if names.is_empty() {
        return Err(LoadError::MissingHeader);
    }

    let cell = |rec: &JsonValue, name: &str| rec.get(name).cloned().unwrap_or(JsonValue::Null);

    let mut columns = Vec::with_capacity(names.len());
    for name in &names {
        let kind = json_column_kind(records.iter().map(|r| cell(r, name)));
        columns.push(ColumnSpec {
            name: name.clone(),
            kind,
        });
    }
    let schema = Schema::new(columns).map_err(header_error)?;

    let rows: Vec<Row> = records
        .iter()
        .map(|rec| {
            schema
                .columns()
                .iter()
                .map(|spec| json_to_value(&cell(rec, &spec.name), spec.kind))
                .collect()
        })
        .collect();

    Ok(Table::new(schema, rows)?)
}

fn json_column_kind(values: impl Iterator<Item = JsonValue>) -> ColumnKind {
    let mut saw_value = false;
    let mut all_int = true;
    for v in values {
        match v {
            JsonValue::Null => {}
            JsonValue::Number(n) => {
                saw_value = true;
                all_int &= n.as_i64().is_some();
            }
            _ => return ColumnKind::Categorical,
        }
    }
    if saw_value && all_int {
        ColumnKind::Integer
    } else {
        ColumnKind::Float
    }
}

fn json_to_value(val: &JsonValue, kind: ColumnKind) -> Value {
    match (kind, val) {
        (_, JsonValue::Null) => Value::Null,
        (ColumnKind::Integer, JsonValue::Number(n)) => {
            n.as_i64().map(Value::Int).unwrap_or(Value::Null)
        }
        (ColumnKind::Float, JsonValue::Number(n)) => {
            n.as_f64().map(Value::Float).unwrap_or(Value::Null)
        }
        (_, JsonValue::String(s)) => Value::Text(s.clone()),
        (_, JsonValue::Bool(b)) => Value::Bool(*b),
        (_, other) => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat booking columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| io_error(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let arrow_schema = builder.schema().clone();
    let columns: Vec<ColumnSpec> = arrow_schema
        .fields()
        .iter()
        .map(|f| ColumnSpec {
            name: f.name().clone(),
            kind: arrow_column_kind(f.data_type()),
        })
        .collect();
    let schema = Schema::new(columns).map_err(header_error)?;
    if schema.is_empty() {
        return Err(LoadError::MissingHeader);
    }

    let reader = builder.build()?;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let columns: Vec<ArrayRef> = batch
            .columns()
            .iter()
            .map(widen_integers)
            .collect::<Result<_, _>>()?;
        for row in 0..batch.num_rows() {
            let values: Row = columns
                .iter()
                .map(|col| extract_value(col, row))
                .collect::<Result<_, _>>()?;
            rows.push(values);
        }
    }

    Ok(Table::new(schema, rows)?)
}

fn arrow_column_kind(data_type: &DataType) -> ColumnKind {
    if is_small_integer(data_type) || matches!(data_type, DataType::Int32 | DataType::Int64) {
        ColumnKind::Integer
    } else if matches!(data_type, DataType::Float32 | DataType::Float64) {
        ColumnKind::Float
    } else {
        ColumnKind::Categorical
    }
}

/// Integer types read through an `Int64` cast.
fn is_small_integer(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Cast a whole column to `Int64` once per batch when its integer type has no
/// direct accessor. `UInt64` values above `i64::MAX` become missing.
fn widen_integers(col: &ArrayRef) -> Result<ArrayRef, LoadError> {
    if is_small_integer(col.data_type()) {
        Ok(arrow::compute::cast(col, &DataType::Int64)?)
    } else {
        Ok(Arc::clone(col))
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &ArrayRef, row: usize) -> Result<Value, LoadError> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Value::Int(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Int(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => float_value(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => float_value(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        _ => Value::Text(array_value_to_string(col, row)?),
    };
    Ok(value)
}

/// NaN and infinities are treated as missing.
fn float_value(v: f64) -> Value {
    if v.is_finite() {
        Value::Float(v)
    } else {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{
        Float64Array, Int16Array, Int64Array, Int8Array, StringArray, UInt32Array, UInt64Array,
    };
    use arrow::datatypes::{Field, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const HEADER: &str = "hotel,lead_time,arrival_date_month,country,customer_type,adr";

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_csv_with_typed_columns() {
        let file = write_temp(
            ".csv",
            &format!(
                "{HEADER}\n\
                 Resort Hotel,342,July,PRT,Transient,0\n\
                 City Hotel,7,August,GBR,Contract,75.5\n"
            ),
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(kind_of(&table, "lead_time"), ColumnKind::Integer);
        assert_eq!(kind_of(&table, "adr"), ColumnKind::Float);
        assert_eq!(table.rows()[1][0], Value::Text("City Hotel".to_string()));
    }

    #[test]
    fn empty_csv_has_no_header() {
        let file = write_temp(".csv", "");
        assert!(matches!(load_file(file.path()), Err(LoadError::MissingHeader)));
    }

    #[test]
    fn duplicate_header_is_malformed() {
        let file = write_temp(".csv", "hotel,hotel\nA,B\n");
        assert!(matches!(load_file(file.path()), Err(LoadError::MalformedHeader(_))));
    }

    #[test]
    fn ragged_record_is_rejected() {
        let file = write_temp(".csv", &format!("{HEADER}\nResort Hotel,342,July\n"));
        assert!(matches!(load_file(file.path()), Err(LoadError::Csv(_))));
    }

    #[test]
    fn missing_required_column() {
        let file = write_temp(".csv", "hotel,lead_time\nResort Hotel,3\n");
        assert!(matches!(
            load_file(file.path()),
            Err(LoadError::MissingColumn(c)) if c == "country"
        ));
    }

    #[test]
    fn required_numeric_column_must_be_numeric() {
        let file = write_temp(
            ".csv",
            &format!("{HEADER}\nResort Hotel,soon,July,PRT,Transient,0\n"),
        );
        assert!(matches!(
            load_file(file.path()),
            Err(LoadError::NonNumericColumn(c)) if c == "lead_time"
        ));
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let err = load_file(Path::new("/nonexistent/bookings.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn unsupported_extension() {
        let file = write_temp(".txt", HEADER);
        assert!(matches!(
            load_file(file.path()),
            Err(LoadError::UnsupportedFormat(e)) if e == "txt"
        ));
    }

    #[test]
    fn loads_json_records() {
        let file = write_temp(
            ".json",
            r#"[
                {"hotel": "Resort Hotel", "lead_time": 12, "arrival_date_month": "July",
                 "country": "PRT", "customer_type": "Transient", "adr": 80.5},
                {"hotel": "City Hotel", "lead_time": null, "arrival_date_month": "May",
                 "country": "FRA", "customer_type": "Group", "adr": 100}
            ]"#,
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.schema().names().next(), Some("hotel"));
        let lead = table.schema().index_of("lead_time").unwrap();
        let adr = table.schema().index_of("adr").unwrap();
        assert_eq!(table.schema().columns()[lead].kind, ColumnKind::Integer);
        assert_eq!(table.schema().columns()[adr].kind, ColumnKind::Float);
        assert_eq!(table.rows()[1][lead], Value::Null);
        assert_eq!(table.rows()[1][adr], Value::Float(100.0));
    }

    /// Write a two-column-typed booking file; categorical columns are filled in.
    fn booking_parquet(lead_time: ArrayRef, adr: ArrayRef) -> tempfile::NamedTempFile {
        let rows = lead_time.len();
        let text = |value: &str| -> ArrayRef { Arc::new(StringArray::from(vec![value; rows])) };
        let schema = Arc::new(ArrowSchema::new(vec![
            Field::new("hotel", DataType::Utf8, false),
            Field::new("lead_time", lead_time.data_type().clone(), true),
            Field::new("arrival_date_month", DataType::Utf8, false),
            Field::new("country", DataType::Utf8, false),
            Field::new("customer_type", DataType::Utf8, false),
            Field::new("adr", adr.data_type().clone(), true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                text("City Hotel"),
                lead_time,
                text("July"),
                text("PRT"),
                text("Transient"),
                adr,
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        file
    }

    fn kind_of(table: &Table, column: &str) -> ColumnKind {
        let schema = table.schema();
        schema.columns()[schema.index_of(column).unwrap()].kind
    }

    #[test]
    fn loads_parquet_columns() {
        let file = booking_parquet(
            Arc::new(Int64Array::from(vec![Some(5), None])),
            Arc::new(Float64Array::from(vec![80.0, 120.25])),
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][0], Value::Text("City Hotel".to_string()));
        assert_eq!(table.rows()[0][1], Value::Int(5));
        assert_eq!(table.rows()[1][1], Value::Null);
        assert_eq!(table.rows()[1][5], Value::Float(120.25));
    }

    #[test]
    fn narrow_signed_parquet_columns_are_widened() {
        let lead: Vec<Option<i16>> = (0..500).map(|i| (i % 7 != 0).then_some(i * 3)).collect();
        let file = booking_parquet(
            Arc::new(Int16Array::from(lead)),
            Arc::new(Int8Array::from_iter_values((0..500).map(|i| (i % 100) as i8))),
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.len(), 500);
        assert_eq!(kind_of(&table, "lead_time"), ColumnKind::Integer);
        assert_eq!(kind_of(&table, "adr"), ColumnKind::Integer);
        assert_eq!(table.rows()[0][1], Value::Null);
        assert_eq!(table.rows()[1][1], Value::Int(3));
        assert_eq!(table.rows()[499][1], Value::Int(1497));
        assert_eq!(table.rows()[499][5], Value::Int(99));
    }

    #[test]
    fn unsigned_parquet_columns_are_integers() {
        let file = booking_parquet(
            Arc::new(UInt32Array::from(vec![Some(5), Some(300), None])),
            Arc::new(UInt64Array::from(vec![80, 95, u64::MAX])),
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(kind_of(&table, "lead_time"), ColumnKind::Integer);
        assert_eq!(kind_of(&table, "adr"), ColumnKind::Integer);
        let lead: Vec<&Value> = table.rows().iter().map(|r| &r[1]).collect();
        assert_eq!(lead, vec![&Value::Int(5), &Value::Int(300), &Value::Null]);
        assert_eq!(table.rows()[1][5], Value::Int(95));
        // Out of range for i64.
        assert_eq!(table.rows()[2][5], Value::Null);
    }
}
