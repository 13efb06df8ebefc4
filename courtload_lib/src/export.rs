//! Dumps every warehouse table to one columnar (or CSV) file per table.
//!
//! Files land under `<dir>/<prefix>/raw/<table>.<ext>`, the same layout an
//! object-storage bucket/prefix export would use.

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use arrow_array::{ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{ArrowError, DataType, Field, Schema};
use parquet::arrow::ArrowWriter;
use parquet::errors::ParquetError;
use serde::Serialize;
use serde_json::Value;

use crate::db::{Db, DbError};
use crate::table::RawTable;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unknown export format {0:?} (expected parquet or csv)")]
    UnknownFormat(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Parquet,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Parquet => "parquet",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parquet" => Ok(ExportFormat::Parquet),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub table: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Writes every dataset table in `db` and returns what was written, in
/// table-name order.
pub fn export_all(
    db: &Db,
    dir: &Path,
    prefix: &str,
    format: ExportFormat,
) -> Result<Vec<ExportedFile>, ExportError> {
    let target = dir.join(prefix.trim_matches('/')).join("raw");
    fs::create_dir_all(&target).map_err(|source| ExportError::Io {
        path: target.clone(),
        source,
    })?;

    let mut written = Vec::new();
    for name in db.list_tables()? {
        let table = db.read_table(&name)?;
        let path = target.join(format!("{}.{}", name, format.extension()));
        match format {
            ExportFormat::Parquet => write_parquet(&path, &table)?,
            ExportFormat::Csv => write_csv(&path, &table)?,
        }
        tracing::info!("  exported {} ({} rows) -> {}", name, table.len(), path.display());
        written.push(ExportedFile {
            table: name,
            path,
            rows: table.len(),
        });
    }
    Ok(written)
}

/// Column type for export: integers if every value is one, floats for any
/// other all-numeric column, booleans likewise, text otherwise. An all-null
/// column is text.
fn column_type(rows: &[Vec<Value>], index: usize) -> DataType {
    let mut values = rows.iter().map(|r| &r[index]).filter(|v| !v.is_null()).peekable();
    if values.peek().is_none() {
        return DataType::Utf8;
    }
    let (mut ints, mut numbers, mut bools, mut total) = (0, 0, 0, 0);
    for value in values {
        total += 1;
        match value {
            Value::Number(n) => {
                numbers += 1;
                if n.is_i64() {
                    ints += 1;
                }
            }
            Value::Bool(_) => bools += 1,
            _ => {}
        }
    }
    if ints == total {
        DataType::Int64
    } else if numbers == total {
        DataType::Float64
    } else if bools == total {
        DataType::Boolean
    } else {
        DataType::Utf8
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn to_batch(table: &RawTable) -> Result<RecordBatch, ExportError> {
    let mut fields = Vec::with_capacity(table.columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len());

    for (i, name) in table.columns.iter().enumerate() {
        let data_type = column_type(&table.rows, i);
        let cells = table.rows.iter().map(|r| &r[i]);
        let array: ArrayRef = match data_type {
            DataType::Int64 => Arc::new(Int64Array::from(cells.map(Value::as_i64).collect::<Vec<_>>())),
            DataType::Float64 => {
                Arc::new(Float64Array::from(cells.map(Value::as_f64).collect::<Vec<_>>()))
            }
            DataType::Boolean => {
                Arc::new(BooleanArray::from(cells.map(Value::as_bool).collect::<Vec<_>>()))
            }
            _ => Arc::new(StringArray::from(cells.map(text).collect::<Vec<_>>())),
        };
        fields.push(Field::new(name, data_type, true));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

fn create(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_parquet(path: &Path, table: &RawTable) -> Result<(), ExportError> {
    let batch = to_batch(table)?;
    let mut writer = ArrowWriter::try_new(create(path)?, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn write_csv(path: &Path, table: &RawTable) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(create(path)?);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|v| text(v).unwrap_or_default()))?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
