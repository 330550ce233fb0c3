/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (schema inferred once)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │    Table      │  Schema + Vec<Row>, immutable
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  hotel ∧ country ∧ month membership → FilteredTable
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
