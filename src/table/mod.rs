// src/table/mod.rs

pub mod aggregate;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Builder, Int64Array, StringBuilder};
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use tracing::{debug, instrument};

/// Rupee-amount columns coerced to Float64 in every PART-I table.
pub const NUMERIC_COLUMNS: [&str; 3] = [
    "Amount Paid / Credited(Rs.)",
    "Tax Deducted(Rs.)",
    "TDS Deposited(Rs.)",
];

/// Fresh display serial prepended by [`renumber`].
const SERIAL_COLUMN: &str = "Sr. No.";

/// Columns dropped by [`renumber`]: the per-section serials are not globally
/// unique and the deductor number was only a grouping aid.
const DROP_COLUMNS: [&str; 2] = ["Deductor Number", "Sr. No."];

/// Trim whitespace, strip outer quotes, thousands separators and rupee
/// prefixes, then parse as f64. `None` marks the cell as missing.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let mut s = raw.trim();
    if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
        s = s[1..s.len() - 1].trim();
    }
    let s = s
        .trim_start_matches("Rs.")
        .trim_start_matches('₹')
        .trim_start();
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Build a typed batch from the flat record list. Columns named in
/// `numeric_columns` become nullable Float64 with NULL wherever a cell fails
/// numeric parsing; one malformed cell never invalidates the table. Every
/// other column stays Utf8.
#[instrument(level = "debug", skip_all, fields(rows = records.len(), cols = header.len()))]
pub fn materialize(
    header: &[String],
    records: &[Vec<String>],
    numeric_columns: &[&str],
) -> Result<RecordBatch> {
    for (idx, record) in records.iter().enumerate() {
        anyhow::ensure!(
            record.len() == header.len(),
            "record {} has {} cells but the header has {}",
            idx,
            record.len(),
            header.len()
        );
    }

    let numeric: HashSet<&str> = numeric_columns.iter().copied().collect();
    let mut fields = Vec::with_capacity(header.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(header.len());

    for (idx, name) in header.iter().enumerate() {
        if numeric.contains(name.as_str()) {
            let mut builder = Float64Builder::with_capacity(records.len());
            for record in records {
                builder.append_option(parse_numeric(&record[idx]));
            }
            fields.push(Field::new(name.as_str(), DataType::Float64, true));
            columns.push(Arc::new(builder.finish()) as ArrayRef);
        } else {
            let mut builder = StringBuilder::new();
            for record in records {
                builder.append_value(&record[idx]);
            }
            fields.push(Field::new(name.as_str(), DataType::Utf8, true));
            columns.push(Arc::new(builder.finish()) as ArrayRef);
        }
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema, columns).context("building record batch")?;
    debug!(rows = batch.num_rows(), "materialized table");
    Ok(batch)
}

/// Drop the grouping-aid and per-section serial columns, then prepend a fresh
/// 1-based `Sr. No.` in current row order.
pub fn renumber(batch: &RecordBatch) -> Result<RecordBatch> {
    let serial = Int64Array::from_iter_values(1..=batch.num_rows() as i64);

    let mut fields: Vec<FieldRef> =
        vec![Arc::new(Field::new(SERIAL_COLUMN, DataType::Int64, false))];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(serial)];

    for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
        if DROP_COLUMNS.contains(&field.name().as_str()) {
            continue;
        }
        fields.push(field.clone());
        columns.push(column.clone());
    }

    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, columns).context("renumbering table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, StringArray};

    fn header() -> Vec<String> {
        [
            "Deductor Number",
            "Name of Deductor",
            "TAN of Deductor",
            "Sr. No.",
            "Amount Paid / Credited(Rs.)",
            "Tax Deducted(Rs.)",
            "TDS Deposited(Rs.)",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn record(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_numeric_handles_commas_and_currency() {
        assert_eq!(parse_numeric("1000"), Some(1000.0));
        assert_eq!(parse_numeric("1,00,000.50"), Some(100000.5));
        assert_eq!(parse_numeric("Rs. 500"), Some(500.0));
        assert_eq!(parse_numeric("₹2,000"), Some(2000.0));
        assert_eq!(parse_numeric("\"1,234\""), Some(1234.0));
        assert_eq!(parse_numeric("  42.5  "), Some(42.5));
        assert_eq!(parse_numeric("N/A"), None);
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn numeric_columns_become_float64_with_null_on_garbage() {
        let records = vec![
            record(&["01", "Acme", "TAN123", "1", "1,000", "100", "100"]),
            record(&["01", "Acme", "TAN123", "2", "oops", "200", "200"]),
        ];
        let batch = materialize(&header(), &records, &NUMERIC_COLUMNS).unwrap();

        let amounts = batch
            .column(4)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(amounts.value(0), 1000.0);
        assert!(amounts.is_null(1));

        let names = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(names.value(0), "Acme");
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let records = vec![record(&["01", "Acme"])];
        assert!(materialize(&header(), &records, &NUMERIC_COLUMNS).is_err());
    }

    #[test]
    fn renumber_drops_aids_and_prepends_serial() {
        let records = vec![
            record(&["01", "Acme", "TAN123", "7", "100", "10", "10"]),
            record(&["02", "Globex", "TAN999", "7", "200", "20", "20"]),
        ];
        let batch = materialize(&header(), &records, &NUMERIC_COLUMNS).unwrap();
        let renumbered = renumber(&batch).unwrap();

        let schema = renumbered.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Sr. No.",
                "Name of Deductor",
                "TAN of Deductor",
                "Amount Paid / Credited(Rs.)",
                "Tax Deducted(Rs.)",
                "TDS Deposited(Rs.)",
            ]
        );
        let serial = renumbered
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(serial.value(0), 1);
        assert_eq!(serial.value(1), 2);
    }
}
