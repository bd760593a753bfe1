//! Reconciliation over files opened through the source registry

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tally_connectors::{default_registry, ConnectorError};
use tally_core::{reconcile, ReconcileError, ReconcileOptions};
use tempfile::TempDir;

const ROWS: i64 = 250;

fn rows(altered: &[i64]) -> (Vec<i64>, Vec<String>, Vec<f64>) {
    let ids: Vec<i64> = (0..ROWS).collect();
    let tags = ids
        .iter()
        .map(|i| ((b'A' + (i % 10) as u8) as char).to_string())
        .collect();
    let amounts = ids
        .iter()
        .map(|i| if altered.contains(i) { -1.0 } else { *i as f64 * 0.5 })
        .collect();
    (ids, tags, amounts)
}

fn write_parquet(dir: &TempDir, name: &str, row_group_size: usize, altered: &[i64]) -> PathBuf {
    let (ids, tags, amounts) = rows(altered);
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, true),
        Field::new("tag", DataType::Utf8, true),
        Field::new("amount", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(ids)) as ArrayRef,
            Arc::new(StringArray::from(tags)) as ArrayRef,
            Arc::new(Float64Array::from(amounts)) as ArrayRef,
        ],
    )
    .unwrap();

    let path = dir.path().join(name);
    let props = WriterProperties::builder()
        .set_max_row_group_size(row_group_size)
        .build();
    let mut writer =
        ArrowWriter::try_new(File::create(&path).unwrap(), schema, Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    path
}

fn write_csv(dir: &TempDir, name: &str, altered: &[i64]) -> PathBuf {
    let (ids, tags, amounts) = rows(altered);
    let path = dir.path().join(name);
    let mut file = File::create(&path).unwrap();
    writeln!(file, "id,tag,amount").unwrap();
    for ((id, tag), amount) in ids.iter().zip(&tags).zip(&amounts) {
        writeln!(file, "{id},{tag},{amount:.1}").unwrap();
    }
    path
}

#[test]
fn test_parquet_files_with_different_row_groups_line_up() {
    let dir = TempDir::new().unwrap();
    let left = write_parquet(&dir, "left.parquet", 64, &[]);
    let right = write_parquet(&dir, "right.parquet", 17, &[5, 100]);

    let registry = default_registry();
    let left = registry.open(left.to_str().unwrap()).unwrap();
    let right = registry.open(right.to_str().unwrap()).unwrap();

    for chunk_size in [None, Some(1), Some(30), Some(64), Some(1000)] {
        let options = ReconcileOptions {
            chunk_size,
            ..ReconcileOptions::default()
        };
        let report = reconcile(left.as_ref(), right.as_ref(), options).unwrap();
        assert_eq!(report.matched_rows, 248, "chunk size {chunk_size:?}");
        assert_eq!(report.rows_compared, 250);
    }
}

#[test]
fn test_csv_against_parquet() {
    let dir = TempDir::new().unwrap();
    let parquet = write_parquet(&dir, "left.parquet", 100, &[]);
    let csv = write_csv(&dir, "right.csv", &[9]);

    let registry = default_registry();
    let left = registry.open(parquet.to_str().unwrap()).unwrap();
    let uri = format!("file://{}", csv.display());
    let right = registry.open(&uri).unwrap();

    let report = reconcile(
        left.as_ref(),
        right.as_ref(),
        ReconcileOptions::chunked(40).with_workers(3),
    )
    .unwrap();
    assert_eq!(report.matched_rows, 249);
}

#[test]
fn test_row_count_mismatch_between_files() {
    let dir = TempDir::new().unwrap();
    let left = write_parquet(&dir, "left.parquet", 100, &[]);
    let csv = dir.path().join("short.csv");
    std::fs::write(&csv, "id,tag,amount\n0,A,0.0\n").unwrap();

    let registry = default_registry();
    let left = registry.open(left.to_str().unwrap()).unwrap();
    let right = registry.open(csv.to_str().unwrap()).unwrap();
    let err = reconcile(left.as_ref(), right.as_ref(), ReconcileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::RowCountMismatch { left: 250, right: 1 }
    ));
}

#[test]
fn test_missing_file_is_open_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.csv");
    let err = default_registry().open(path.to_str().unwrap()).err().unwrap();
    assert!(matches!(err, ConnectorError::OpenFailed(_)));

    let wrapped = ReconcileError::from(err);
    assert!(wrapped.to_string().contains("open failed"));
}
