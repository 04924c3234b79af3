use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ingest_data::{Args, DuckDbSink, IngestError, IngestJob, LoadReport, WgetFetcher};
use tracing_subscriber::EnvFilter;

const UNSUPPORTED_FORMAT_MESSAGE: &str = "Error. Only .csv and .parquet file accepted.";

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let target = args.connection_target();
    let job = IngestJob::new(
        args.url.as_deref().unwrap_or_default(),
        args.table_name.as_deref().unwrap_or_default(),
    );

    let mut stdout = std::io::stdout().lock();
    let result = job.run(
        &WgetFetcher::new(),
        || DuckDbSink::connect_postgres(&target, args.schema.as_deref()),
        &mut stdout,
    );
    let status = exit_status(result, job.table_name(), &mut stdout)?;
    Ok(ExitCode::from(status))
}

/// Process exit status for a finished run. An unsupported file prints the
/// usage message and gives 1; every other failure is returned with context.
fn exit_status(
    result: ingest_data::Result<LoadReport>,
    table_name: &str,
    out: &mut dyn Write,
) -> anyhow::Result<u8> {
    match result {
        Ok(_) => Ok(0),
        Err(IngestError::UnsupportedFormat(_)) => {
            writeln!(out, "{}", UNSUPPORTED_FORMAT_MESSAGE)?;
            Ok(1)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load table '{}'", table_name)),
    }
}
