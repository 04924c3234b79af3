use duckdb::arrow::record_batch::RecordBatch;

use crate::error::Result;

/// Destination for loaded rows.
/// The table is created once from the schema sample, then only appended to.
pub trait TableSink {
    /// Drop any table with this name and create it empty with the sample's columns
    fn create_table(&mut self, table_name: &str, sample: &RecordBatch) -> Result<()>;

    /// Append one batch to a table made by `create_table`, returning the row count
    fn append_batch(&mut self, table_name: &str, batch: RecordBatch) -> Result<usize>;
}

impl<T: TableSink + ?Sized> TableSink for &mut T {
    fn create_table(&mut self, table_name: &str, sample: &RecordBatch) -> Result<()> {
        (**self).create_table(table_name, sample)
    }

    fn append_batch(&mut self, table_name: &str, batch: RecordBatch) -> Result<usize> {
        (**self).append_batch(table_name, batch)
    }
}
