use std::path::PathBuf;

use thiserror::Error;

/// Structural problems with a table's columns or cells.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("column `{0}` is not numeric")]
    NotNumeric(String),
    #[error("column {0} has an empty name")]
    EmptyColumnName(usize),
    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),
    #[error("row {row}: expected {expected} fields, found {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}: value in column `{column}` does not match the column type")]
    CellKind { row: usize, column: String },
}

/// Fatal failure to read a dataset. Surfaced to the caller, never retried.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("missing header row")]
    MissingHeader,
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    #[error("malformed data: {0}")]
    Malformed(String),
    #[error("required column `{0}` is missing")]
    MissingColumn(String),
    #[error("required column `{0}` must be numeric")]
    NonNumericColumn(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Failure while rendering charts or writing/reading a workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error(transparent)]
    Read(#[from] calamine::XlsxError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("chart drawing failed: {0}")]
    Draw(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("table does not fit in a worksheet")]
    TooLarge,
    #[error("workbook has no sheets")]
    NoSheets,
    #[error("data sheet has no header row")]
    MissingHeader,
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Failure to read a pipeline configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
