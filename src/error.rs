use thiserror::Error;

/// Errors raised while fetching, reading or loading a source file.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file name matched neither ".csv" nor ".parquet"
    #[error("unsupported file format for '{0}': only .csv and .parquet files are accepted")]
    UnsupportedFormat(String),

    /// A sample column whose type has no table column equivalent
    #[error("column '{column}' has unsupported type {data_type:?}")]
    UnsupportedColumnType {
        column: String,
        data_type: duckdb::arrow::datatypes::DataType,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] duckdb::arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("duckdb error: {0}")]
    DuckDb(#[from] duckdb::Error),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
