//! Audit trail and clean-record writers.
//!
//! Every rejected row appears once, in input order, with its full error list,
//! whatever format is rendered.

use crate::domain::model::{AcceptedRow, RejectedRow};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;
use zip::write::{FileOptions, ZipWriter};

pub const AUDIT_BASENAME: &str = "validation_errors";
pub const CLEAN_BASENAME: &str = "clean_employees";
#[cfg(feature = "parquet")]
pub const SUPPORTED_FORMATS: &[&str] = &["csv", "tsv", "json", "parquet"];
#[cfg(not(feature = "parquet"))]
pub const SUPPORTED_FORMATS: &[&str] = &["csv", "tsv", "json"];

const AUDIT_HEADER: [&str; 6] = ["row_index", "employee_id", "field", "value", "error_kind", "message"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditFormat {
    Csv,
    Tsv,
    Json,
    #[cfg(feature = "parquet")]
    Parquet,
}

impl AuditFormat {
    pub fn file_name(&self) -> String {
        match self {
            AuditFormat::Csv => format!("{}.csv", AUDIT_BASENAME),
            AuditFormat::Tsv => format!("{}.tsv", AUDIT_BASENAME),
            AuditFormat::Json => format!("{}.json", AUDIT_BASENAME),
            #[cfg(feature = "parquet")]
            AuditFormat::Parquet => format!("{}.parquet", AUDIT_BASENAME),
        }
    }

    pub fn render(&self, rejected: &[RejectedRow], generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
        match self {
            AuditFormat::Csv => render_tabular(rejected, b','),
            AuditFormat::Tsv => render_tabular(rejected, b'\t'),
            AuditFormat::Json => render_json(rejected, generated_at),
            #[cfg(feature = "parquet")]
            AuditFormat::Parquet => render_parquet(rejected),
        }
    }
}

impl FromStr for AuditFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(AuditFormat::Csv),
            "tsv" => Ok(AuditFormat::Tsv),
            "json" => Ok(AuditFormat::Json),
            #[cfg(feature = "parquet")]
            "parquet" => Ok(AuditFormat::Parquet),
            other => Err(EtlError::InvalidConfigValueError {
                field: "output_formats".to_string(),
                value: other.to_string(),
                reason: format!("Unsupported format. Valid formats: {}", SUPPORTED_FORMATS.join(", ")),
            }),
        }
    }
}

/// One flat audit line per field error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRow {
    pub row_index: usize,
    pub employee_id: String,
    pub field: String,
    pub value: String,
    pub error_kind: String,
    pub message: String,
}

pub fn audit_rows(rejected: &[RejectedRow]) -> Vec<AuditRow> {
    rejected
        .iter()
        .flat_map(|row| {
            row.errors.iter().map(move |error| AuditRow {
                row_index: row.row_index,
                employee_id: row.employee_id.clone().unwrap_or_else(|| "N/A".to_string()),
                field: error.field.clone(),
                value: error.raw_value.clone(),
                error_kind: error.kind.to_string(),
                message: error.message.clone(),
            })
        })
        .collect()
}

pub fn render_tabular(rejected: &[RejectedRow], delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(Vec::new());

    // 沒有錯誤時也輸出標頭，方便下游直接讀取
    writer.write_record(AUDIT_HEADER)?;
    for row in audit_rows(rejected) {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("Failed to flush CSV buffer: {}", e),
        })
}

#[derive(Serialize)]
struct AuditDocument<'a> {
    generated_at: String,
    rejected_rows: usize,
    total_errors: usize,
    rows: &'a [RejectedRow],
}

pub fn render_json(rejected: &[RejectedRow], generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    let document = AuditDocument {
        generated_at: generated_at.to_rfc3339(),
        rejected_rows: rejected.len(),
        total_errors: rejected.iter().map(|row| row.errors.len()).sum(),
        rows: rejected,
    };
    Ok(serde_json::to_vec_pretty(&document)?)
}

/// Flat audit rows as one parquet row group, same columns as the CSV audit.
#[cfg(feature = "parquet")]
pub fn render_parquet(rejected: &[RejectedRow]) -> Result<Vec<u8>> {
    use arrow::array::{ArrayRef, RecordBatch, StringArray, UInt64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    fn text_column<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
        Arc::new(StringArray::from_iter_values(values))
    }

    let rows = audit_rows(rejected);
    let mut fields = vec![Field::new(AUDIT_HEADER[0], DataType::UInt64, false)];
    fields.extend(
        AUDIT_HEADER[1..]
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, false)),
    );
    let schema = Arc::new(Schema::new(fields));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|row| row.row_index as u64))),
        text_column(rows.iter().map(|row| row.employee_id.as_str())),
        text_column(rows.iter().map(|row| row.field.as_str())),
        text_column(rows.iter().map(|row| row.value.as_str())),
        text_column(rows.iter().map(|row| row.error_kind.as_str())),
        text_column(rows.iter().map(|row| row.message.as_str())),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(buffer)
}

/// Accepted rows as CSV; columns follow the first-seen field order across rows.
pub fn render_clean_csv(accepted: &[AcceptedRow]) -> Result<Vec<u8>> {
    let mut columns: Vec<&str> = Vec::new();
    for row in accepted {
        for (name, _) in row.record.fields() {
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
    }

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    let mut header = vec!["row_index"];
    header.extend(columns.iter().copied());
    writer.write_record(&header)?;

    for row in accepted {
        let mut line = vec![row.row_index.to_string()];
        line.extend(columns.iter().map(|column| {
            row.record
                .get(column)
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&line)?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("Failed to flush CSV buffer: {}", e),
        })
}

pub fn render_clean_json(accepted: &[AcceptedRow]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(accepted)?)
}

/// Packs already-rendered files into one zip archive.
pub fn bundle_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for (name, data) in files {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
