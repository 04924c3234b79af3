use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use duckdb::arrow::record_batch::RecordBatch;
use tracing::info;

use crate::duckdb_load::batch_reader::{open_source, ReaderOptions};
use crate::duckdb_load::table_sink::TableSink;
use crate::error::Result;
use crate::file_load::fetch::{local_file_name, Fetcher};
use crate::file_load::FileType;

/// Totals for one load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub batches: usize,
    pub rows: usize,
    /// Row count of each appended batch, in load order
    pub batch_rows: Vec<usize>,
    pub elapsed: Duration,
}

/// One run of the pipeline: download `url`, create `table_name` from the
/// schema sample, then append every batch.
#[derive(Debug, Clone)]
pub struct IngestJob {
    url: String,
    table_name: String,
    download_dir: PathBuf,
    options: ReaderOptions,
}

impl IngestJob {
    pub fn new(url: &str, table_name: &str) -> Self {
        Self {
            url: url.to_string(),
            table_name: table_name.to_string(),
            download_dir: PathBuf::from("."),
            options: ReaderOptions::default(),
        }
    }

    // Directory the file is downloaded into, the working directory by default
    pub fn with_download_dir(mut self, download_dir: impl Into<PathBuf>) -> Self {
        self.download_dir = download_dir.into();
        self
    }

    pub fn with_options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Run the whole pipeline, writing progress lines to `out`.
    ///
    /// `connect` is only called once the file name has a supported format, so
    /// an unsupported file never opens a database connection. The table is
    /// dropped and recreated; a failure part way through leaves the batches
    /// already appended in place.
    pub fn run<S, F>(&self, fetcher: &dyn Fetcher, connect: F, out: &mut dyn Write) -> Result<LoadReport>
    where
        S: TableSink,
        F: FnOnce() -> Result<S>,
    {
        let file_name = local_file_name(&self.url);
        let file_path = self.download_dir.join(&file_name);

        writeln!(out, "Downloading {}...", file_name)?;
        fetcher.fetch(&self.url, &file_path);
        writeln!(out, "\n")?;

        let file_type = FileType::from_file_name(&file_name)?;
        info!("Detected file type: {} for file: '{}'", file_type, file_name);

        let source = open_source(&file_path, file_type, &self.options)?;
        let mut sink = connect()?;

        sink.create_table(&self.table_name, &source.sample)?;
        let report = load_batches(&mut sink, &self.table_name, source.batches, out)?;

        info!(
            "Loaded {} rows in {} batches into {}",
            report.rows, report.batches, self.table_name
        );
        Ok(report)
    }
}

/// Append batches in order, printing a running counter and the time each
/// append took, then the total.
pub fn load_batches<S, I>(
    sink: &mut S,
    table_name: &str,
    batches: I,
    out: &mut dyn Write,
) -> Result<LoadReport>
where
    S: TableSink + ?Sized,
    I: IntoIterator<Item = Result<RecordBatch>>,
{
    let t_start = Instant::now();
    let mut batch_rows = Vec::new();

    for batch in batches {
        let batch = batch?;
        writeln!(out, "Inserting batch {}...", batch_rows.len() + 1)?;

        let b_start = Instant::now();
        let rows = sink.append_batch(table_name, batch)?;
        let taken = b_start.elapsed();

        batch_rows.push(rows);
        writeln!(
            out,
            "Inserted! Time taken: {:10.3} seconds.\n",
            taken.as_secs_f64()
        )?;
    }

    let elapsed = t_start.elapsed();
    writeln!(
        out,
        "Completed! Total time taken: {:10.3} seconds to complete {} batches.",
        elapsed.as_secs_f64(),
        batch_rows.len()
    )?;

    Ok(LoadReport {
        batches: batch_rows.len(),
        rows: batch_rows.iter().sum(),
        batch_rows,
        elapsed,
    })
}
