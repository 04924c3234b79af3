use pyo3::prelude::*;

use crate::config::ConnectionTarget;
use crate::duckdb_load::core_processor::IngestJob;
use crate::duckdb_load::duckdb_sink::DuckDbSink;
use crate::file_load::fetch::WgetFetcher;

#[pyfunction]
#[pyo3(signature = (user, password, host, port, db, table_name, url, schema=None))]
#[allow(clippy::too_many_arguments)]
fn ingest(
    user: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<String>,
    db: Option<String>,
    table_name: &str,
    url: &str,
    schema: Option<&str>,
) -> PyResult<(usize, usize)> {
    let target = ConnectionTarget {
        user,
        password,
        host,
        port,
        db,
    };
    let report = IngestJob::new(url, table_name)
        .run(
            &WgetFetcher::new(),
            || DuckDbSink::connect_postgres(&target, schema),
            &mut std::io::stdout(),
        )
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))?;
    Ok((report.batches, report.rows))
}

#[pymodule]
#[pyo3(name = "ingest_data")]
fn ingest_data(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ingest, m)?)?;
    Ok(())
}
