use duckdb::arrow::datatypes::{DataType, Schema};
use duckdb::arrow::record_batch::RecordBatch;
use duckdb::vtab::arrow::ArrowVTab;
use duckdb::vtab::arrow_recordbatch_to_query_params;
use duckdb::Connection;
use tracing::{debug, info};

use crate::config::ConnectionTarget;
use crate::duckdb_load::table_sink::TableSink;
use crate::error::{IngestError, Result};

/// Catalog alias the Postgres database is attached under
pub const POSTGRES_CATALOG: &str = "pg_db";

// Temp table a batch is collected in before one INSERT into the target
const STAGING_TABLE: &str = "__ingest_staging";

// The arrow table function fills one DuckDB vector per scan
const ARROW_SCAN_ROWS: usize = 2048;

/// Loads batches through a single DuckDB connection.
///
/// Each record batch is scanned into a local staging table through DuckDB's
/// `arrow` table function, then copied to the target with one INSERT. The
/// target can be an attached Postgres database or DuckDB's own catalog.
pub struct DuckDbSink {
    conn: Connection,
    catalog: Option<String>,
    schema_name: Option<String>,
}

impl DuckDbSink {
    /// Open an in-memory DuckDB and attach the Postgres database behind `target`
    pub fn connect_postgres(target: &ConnectionTarget, schema_name: Option<&str>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        // Install and load required extensions
        conn.execute("INSTALL postgres;", [])?;
        conn.execute("LOAD postgres;", [])?;

        info!("Connecting to {}", target);
        conn.execute(
            &format!(
                "ATTACH '{}' AS {} (TYPE POSTGRES)",
                target.uri().replace('\'', "''"),
                POSTGRES_CATALOG
            ),
            [],
        )?;

        Self::from_connection(conn, Some(POSTGRES_CATALOG.to_string()), schema_name)
    }

    /// Load into DuckDB's own in-memory catalog
    pub fn in_memory(schema_name: Option<&str>) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, None, schema_name)
    }

    fn from_connection(
        conn: Connection,
        catalog: Option<String>,
        schema_name: Option<&str>,
    ) -> Result<Self> {
        conn.register_table_function::<ArrowVTab>("arrow")?;

        let sink = Self {
            conn,
            catalog,
            schema_name: schema_name.map(str::to_string),
        };
        sink.create_schema()?;
        Ok(sink)
    }

    // Create the schema
    fn create_schema(&self) -> Result<()> {
        if let Some(schema_name) = &self.schema_name {
            let qualified = match &self.catalog {
                Some(catalog) => format!("{}.{}", catalog, quote_identifier(schema_name)),
                None => quote_identifier(schema_name),
            };
            self.conn
                .execute(&format!("CREATE SCHEMA IF NOT EXISTS {};", qualified), [])?;
        }
        Ok(())
    }

    /// Fully qualified, quoted name for a table in the target catalog and schema
    pub fn qualified_table(&self, table_name: &str) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(catalog) = &self.catalog {
            parts.push(catalog.clone());
        }
        if let Some(schema_name) = &self.schema_name {
            parts.push(quote_identifier(schema_name));
        }
        parts.push(quote_identifier(table_name));
        parts.join(".")
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl TableSink for DuckDbSink {
    fn create_table(&mut self, table_name: &str, sample: &RecordBatch) -> Result<()> {
        let table = self.qualified_table(table_name);
        let columns = column_definitions(&sample.schema())?;

        self.conn
            .execute(&format!("DROP TABLE IF EXISTS {};", table), [])?;

        let create_table_query = format!("CREATE TABLE {} ({});", table, columns);
        debug!("{}", create_table_query);
        self.conn.execute(&create_table_query, [])?;

        // Local copy of the same columns that each batch is staged in
        self.conn.execute(
            &format!("CREATE OR REPLACE TEMP TABLE {} ({});", STAGING_TABLE, columns),
            [],
        )?;

        info!("Table {} created", table);
        Ok(())
    }

    fn append_batch(&mut self, table_name: &str, batch: RecordBatch) -> Result<usize> {
        let rows = batch.num_rows();

        let mut offset = 0;
        while offset < rows {
            let len = ARROW_SCAN_ROWS.min(rows - offset);
            let params = arrow_recordbatch_to_query_params(batch.slice(offset, len));
            self.conn.execute(
                &format!("INSERT INTO {} SELECT * FROM arrow(?, ?);", STAGING_TABLE),
                params,
            )?;
            offset += len;
        }

        self.conn.execute(
            &format!(
                "INSERT INTO {} SELECT * FROM {};",
                self.qualified_table(table_name),
                STAGING_TABLE
            ),
            [],
        )?;
        self.conn
            .execute(&format!("DELETE FROM {};", STAGING_TABLE), [])?;

        Ok(rows)
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// Column list for CREATE TABLE, in schema order
fn column_definitions(schema: &Schema) -> Result<String> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            let sql_type = sql_type(field.data_type()).ok_or_else(|| {
                IngestError::UnsupportedColumnType {
                    column: field.name().clone(),
                    data_type: field.data_type().clone(),
                }
            })?;
            Ok(format!("{} {}", quote_identifier(field.name()), sql_type))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(columns.join(", "))
}

/// DuckDB column type for an Arrow type. Unsigned integers widen to the next
/// signed type since Postgres has no unsigned columns. Types the `arrow()` scan
/// cannot read, such as half floats, have no column type.
pub fn sql_type(data_type: &DataType) -> Option<String> {
    let sql_type = match data_type {
        DataType::Boolean => "BOOLEAN".to_string(),
        DataType::Int8 | DataType::Int16 | DataType::UInt8 => "SMALLINT".to_string(),
        DataType::Int32 | DataType::UInt16 => "INTEGER".to_string(),
        DataType::Int64 | DataType::UInt32 => "BIGINT".to_string(),
        DataType::UInt64 => "DECIMAL(20, 0)".to_string(),
        DataType::Float32 => "FLOAT".to_string(),
        DataType::Float64 => "DOUBLE".to_string(),
        DataType::Decimal128(precision, scale) if *precision <= 38 => {
            format!("DECIMAL({}, {})", precision, scale)
        }
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => "VARCHAR".to_string(),
        DataType::Binary | DataType::LargeBinary | DataType::BinaryView => "BLOB".to_string(),
        DataType::Date32 | DataType::Date64 => "DATE".to_string(),
        DataType::Time32(_) | DataType::Time64(_) => "TIME".to_string(),
        DataType::Timestamp(_, None) => "TIMESTAMP".to_string(),
        DataType::Timestamp(_, Some(_)) => "TIMESTAMPTZ".to_string(),
        DataType::Interval(_) | DataType::Duration(_) => "INTERVAL".to_string(),
        DataType::Dictionary(_, value_type) => return sql_type(value_type),
        _ => return None,
    };
    Some(sql_type)
}
