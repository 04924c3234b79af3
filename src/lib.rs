//! Download a CSV or Parquet file and load it into a Postgres table in
//! fixed-size batches through DuckDB's postgres extension.
//!
//! The pipeline runs top to bottom: fetch, detect the format from the file
//! name, create the table from a ten row sample, then append each batch of up
//! to 100,000 rows. See [`IngestJob`].

pub mod config;
pub mod duckdb_load;
pub mod error;
pub mod file_load;

#[cfg(feature = "extension-module")]
mod python;

pub use config::{Args, ConnectionTarget};
pub use duckdb_load::batch_reader::{ReaderOptions, BATCH_SIZE, SCHEMA_SAMPLE_ROWS};
pub use duckdb_load::core_processor::{IngestJob, LoadReport};
pub use duckdb_load::duckdb_sink::DuckDbSink;
pub use duckdb_load::table_sink::TableSink;
pub use error::{IngestError, Result};
pub use file_load::fetch::{Fetcher, WgetFetcher};
pub use file_load::FileType;
