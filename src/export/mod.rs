// src/export/mod.rs

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parquet::arrow::ArrowWriter;
use parquet::basic::{BrotliLevel, Compression};
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::parse::ScanStats;

static PARQUET_PROPS: Lazy<WriterProperties> = Lazy::new(|| {
    WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5).unwrap()))
        .set_dictionary_enabled(true)
        .build()
});

/// Sidecar describing what the scanner kept and dropped for one input. The
/// rejection and NULL counts are the audit trail for the lenient parse.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub stats: ScanStats,
}

/// Write one batch as a CSV sheet: first row column names, numeric columns
/// rendered as numbers, NULL cells left empty.
#[instrument(level = "debug", skip(batch), fields(rows = batch.num_rows(), path = %path.display()))]
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = arrow::csv::WriterBuilder::new().with_header(true).build(file);
    writer
        .write(batch)
        .with_context(|| format!("writing {}", path.display()))?;
    debug!("wrote csv");
    Ok(())
}

/// Write one batch as Parquet, via a temp file renamed into place so readers
/// never observe a partial file.
#[instrument(level = "debug", skip(batch), fields(rows = batch.num_rows(), path = %path.display()))]
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let file = File::create(&temp_path)
        .with_context(|| format!("creating {}", temp_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(PARQUET_PROPS.clone()))
        .context("opening parquet writer")?;
    writer
        .write(batch)
        .with_context(|| format!("writing {}", temp_path.display()))?;
    writer.close().context("closing parquet writer")?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("renaming {} into place", temp_path.display()))?;
    debug!("wrote parquet");
    Ok(())
}

/// Write the scan report as pretty JSON next to the exported tables.
pub fn write_report(report: &ScanReport, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
