use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use duckdb::arrow::array::{Float64Array, Int64Array, StringArray};
use duckdb::arrow::datatypes::{DataType, Field, Schema};
use duckdb::arrow::record_batch::RecordBatch;
use ingest_data::duckdb_load::batch_reader::open_source;
use ingest_data::{DuckDbSink, FileType, ReaderOptions, TableSink};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tempfile::{NamedTempFile, TempDir};

fn write_trips_csv(path: &Path, rows: usize) {
    let mut file = File::create(path).unwrap();
    writeln!(file, "id,vendor,fare").unwrap();
    for i in 0..rows {
        writeln!(file, "{},vendor_{},{}.5", i, i % 3, i % 100).unwrap();
    }
}

fn trips_batch(start: i64, rows: usize) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("vendor", DataType::Utf8, true),
        Field::new("fare", DataType::Float64, true),
    ]));
    let ids: Vec<i64> = (start..start + rows as i64).collect();
    let vendors: Vec<String> = ids.iter().map(|i| format!("vendor_{}", i % 3)).collect();
    let fares: Vec<f64> = ids.iter().map(|i| (i % 100) as f64 + 0.5).collect();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(vendors)),
            Arc::new(Float64Array::from(fares)),
        ],
    )
    .unwrap()
}

fn write_trips_parquet(path: &Path, rows: usize, row_group_size: usize) {
    let batch = trips_batch(0, rows);
    let props = WriterProperties::builder()
        .set_max_row_group_size(row_group_size)
        .build();
    let mut writer =
        ArrowWriter::try_new(File::create(path).unwrap(), batch.schema(), Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn count_rows(sink: &DuckDbSink, table: &str) -> i64 {
    sink.conn()
        .query_row(&format!("SELECT count(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
}

fn table_columns(sink: &DuckDbSink, table: &str) -> Vec<(String, String)> {
    let mut stmt = sink
        .conn()
        .prepare(
            "SELECT column_name, data_type FROM information_schema.columns
             WHERE table_name = ? ORDER BY ordinal_position",
        )
        .unwrap();
    stmt.query_map([table], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[cfg(test)]
mod batch_reader_tests {
    use super::*;

    #[test]
    fn test_csv_batches_are_bounded_by_batch_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trips.csv");
        write_trips_csv(&path, 250_000);

        let source = open_source(&path, FileType::Csv, &ReaderOptions::default()).unwrap();
        assert_eq!(source.sample.num_rows(), 10);

        let sizes: Vec<usize> = source
            .batches
            .map(|batch| batch.unwrap().num_rows())
            .collect();
        assert_eq!(sizes, vec![100_000, 100_000, 50_000]);
    }

    #[test]
    fn test_csv_schema_comes_from_sample() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trips.csv");
        write_trips_csv(&path, 25);

        let source = open_source(&path, FileType::Csv, &ReaderOptions::default()).unwrap();
        let schema = source.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["id", "vendor", "fare"]);
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);

        // every batch shares the sample's schema
        for batch in source.batches {
            assert_eq!(batch.unwrap().schema(), schema);
        }
    }

    #[test]
    fn test_csv_empty_sample_columns_load_as_text() {
        let mut temp_file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(temp_file, "id,note").unwrap();
        for i in 0..10 {
            writeln!(temp_file, "{},", i).unwrap();
        }
        writeln!(temp_file, "10,late value").unwrap();

        let source = open_source(temp_file.path(), FileType::Csv, &ReaderOptions::default()).unwrap();
        assert_eq!(source.schema().field(1).data_type(), &DataType::Utf8);

        let rows: usize = source.batches.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(rows, 11);
    }

    #[test]
    fn test_csv_float_in_integer_column_is_not_cast() {
        let mut temp_file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(temp_file, "id,count").unwrap();
        for i in 0..10 {
            writeln!(temp_file, "{},{}", i, i * 2).unwrap();
        }
        writeln!(temp_file, "10,2.5").unwrap();

        let source = open_source(temp_file.path(), FileType::Csv, &ReaderOptions::default()).unwrap();
        assert_eq!(source.schema().field(1).data_type(), &DataType::Int64);

        let batches: Result<Vec<RecordBatch>, _> = source.batches.collect();
        assert!(matches!(batches, Err(ingest_data::IngestError::Arrow(_))));
    }

    #[test]
    fn test_csv_header_only_gives_empty_sample() {
        let mut temp_file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(temp_file, "id,name").unwrap();

        let source = open_source(temp_file.path(), FileType::Csv, &ReaderOptions::default()).unwrap();
        assert_eq!(source.sample.num_rows(), 0);
        assert_eq!(source.schema().fields().len(), 2);
        assert_eq!(source.batches.count(), 0);
    }

    #[test]
    fn test_parquet_batches_are_bounded_by_batch_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trips.parquet");
        write_trips_parquet(&path, 250_000, 1024 * 1024);

        let source = open_source(&path, FileType::Parquet, &ReaderOptions::default()).unwrap();
        assert_eq!(source.sample.num_rows(), 10);
        assert_eq!(source.schema().fields().len(), 3);

        let sizes: Vec<usize> = source
            .batches
            .map(|batch| batch.unwrap().num_rows())
            .collect();
        assert_eq!(sizes, vec![100_000, 100_000, 50_000]);
    }

    #[test]
    fn test_parquet_reads_every_row_group() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trips.parquet");
        write_trips_parquet(&path, 130_000, 20_000);

        let source = open_source(&path, FileType::Parquet, &ReaderOptions::default()).unwrap();
        let sizes: Vec<usize> = source
            .batches
            .map(|batch| batch.unwrap().num_rows())
            .collect();
        assert!(sizes.iter().all(|rows| *rows <= 100_000));
        assert_eq!(sizes.iter().sum::<usize>(), 130_000);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never_downloaded.csv");
        let result = open_source(&path, FileType::Csv, &ReaderOptions::default());
        assert!(matches!(result, Err(ingest_data::IngestError::Io(_))));
    }
}

#[cfg(test)]
mod duckdb_sink_tests {
    use super::*;

    #[test]
    fn test_create_table_uses_sample_columns_and_no_rows() {
        let mut sink = DuckDbSink::in_memory(None).unwrap();
        sink.create_table("trips", &trips_batch(0, 10)).unwrap();

        assert_eq!(
            table_columns(&sink, "trips"),
            vec![
                ("id".to_string(), "BIGINT".to_string()),
                ("vendor".to_string(), "VARCHAR".to_string()),
                ("fare".to_string(), "DOUBLE".to_string()),
            ]
        );
        assert_eq!(count_rows(&sink, "trips"), 0);
    }

    #[test]
    fn test_append_batches_keeps_every_row() {
        let mut sink = DuckDbSink::in_memory(None).unwrap();
        sink.create_table("trips", &trips_batch(0, 10)).unwrap();

        assert_eq!(sink.append_batch("trips", trips_batch(0, 5_000)).unwrap(), 5_000);
        assert_eq!(sink.append_batch("trips", trips_batch(5_000, 1)).unwrap(), 1);
        assert_eq!(count_rows(&sink, "trips"), 5_001);

        let (min_id, max_id): (i64, i64) = sink
            .conn()
            .query_row("SELECT min(id), max(id) FROM trips", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!((min_id, max_id), (0, 5_000));
    }

    #[test]
    fn test_create_table_replaces_existing_table() {
        let mut sink = DuckDbSink::in_memory(None).unwrap();
        sink.conn()
            .execute_batch("CREATE TABLE trips (legacy INTEGER); INSERT INTO trips VALUES (1), (2);")
            .unwrap();

        sink.create_table("trips", &trips_batch(0, 10)).unwrap();

        let columns: Vec<String> = table_columns(&sink, "trips")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(columns, vec!["id", "vendor", "fare"]);
        assert_eq!(count_rows(&sink, "trips"), 0);
    }

    #[test]
    fn test_schema_qualified_table() {
        let mut sink = DuckDbSink::in_memory(Some("taxi")).unwrap();
        sink.create_table("trips", &trips_batch(0, 10)).unwrap();
        sink.append_batch("trips", trips_batch(0, 3)).unwrap();

        assert_eq!(count_rows(&sink, "taxi.trips"), 3);
    }
}
