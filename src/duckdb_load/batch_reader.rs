use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use duckdb::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use duckdb::arrow::error::ArrowError;
use duckdb::arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::file_load::FileType;

/// Rows per insert unit
pub const BATCH_SIZE: usize = 100_000;

/// Rows used to work out the destination table's columns
pub const SCHEMA_SAMPLE_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    pub batch_size: usize,
    pub sample_rows: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            sample_rows: SCHEMA_SAMPLE_ROWS,
        }
    }
}

/// Forward-only sequence of record batches in file order.
///
/// Single pass: the underlying file reader is consumed as batches are pulled
/// and cannot be rewound. Open the file again to start over.
pub struct RecordBatches {
    inner: Box<dyn Iterator<Item = Result<RecordBatch, ArrowError>>>,
}

impl RecordBatches {
    fn new<I>(inner: I) -> Self
    where
        I: Iterator<Item = Result<RecordBatch, ArrowError>> + 'static,
    {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl Iterator for RecordBatches {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|batch| batch.map_err(IngestError::from))
    }
}

/// A source file opened for loading: the schema sample plus the batch stream.
/// The two come from independent readers over the same file.
pub struct SourceBatches {
    pub sample: RecordBatch,
    pub batches: RecordBatches,
}

impl SourceBatches {
    pub fn schema(&self) -> SchemaRef {
        self.sample.schema()
    }
}

pub fn open_source(path: &Path, file_type: FileType, options: &ReaderOptions) -> Result<SourceBatches> {
    let source = match file_type {
        FileType::Csv => open_csv(path, options)?,
        FileType::Parquet => open_parquet(path, options)?,
    };
    info!(
        "Read {} sample rows from {} file '{}'",
        source.sample.num_rows(),
        file_type,
        path.display()
    );
    debug!("The data schema is: {:?}", source.schema());
    Ok(source)
}

// CSV carries no types, so they are inferred from the sample rows only and
// every later row has to parse under them. A value that does not, such as
// `2.5` in a column sampled as integers, fails its batch with a parser error
// rather than being cast on insert.
fn open_csv(path: &Path, options: &ReaderOptions) -> Result<SourceBatches> {
    let (inferred, _records_read) = Format::default()
        .with_header(true)
        .infer_schema(File::open(path)?, Some(options.sample_rows))?;
    let schema = text_for_untyped_columns(inferred);

    let sample = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(options.sample_rows)
        .build(File::open(path)?)?
        .next()
        .transpose()?
        .unwrap_or_else(|| RecordBatch::new_empty(schema.clone()));

    let reader = ReaderBuilder::new(schema)
        .with_header(true)
        .with_batch_size(options.batch_size)
        .build(File::open(path)?)?;

    Ok(SourceBatches {
        sample,
        batches: RecordBatches::new(reader),
    })
}

// Columns that are empty in every sample row infer as Null, which would drop
// any later values. Load those as text instead.
fn text_for_untyped_columns(schema: Schema) -> SchemaRef {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|field| match field.data_type() {
            DataType::Null => Field::clone(field).with_data_type(DataType::Utf8),
            _ => Field::clone(field),
        })
        .collect();
    Arc::new(Schema::new(fields))
}

fn open_parquet(path: &Path, options: &ReaderOptions) -> Result<SourceBatches> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
    let schema = builder.schema().clone();
    debug!(
        "Parquet file has {} row groups",
        builder.metadata().num_row_groups()
    );

    let sample = builder
        .with_batch_size(options.sample_rows)
        .build()?
        .next()
        .transpose()?
        .unwrap_or_else(|| RecordBatch::new_empty(schema));

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?
        .with_batch_size(options.batch_size)
        .build()?;

    Ok(SourceBatches {
        sample,
        batches: RecordBatches::new(reader),
    })
}
