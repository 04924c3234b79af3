pub mod batch_reader;
pub mod core_processor;
pub mod duckdb_sink;
pub mod table_sink;
