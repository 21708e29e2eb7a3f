// src/table/aggregate.rs

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use arrow::array::{Array, ArrayRef, Float64Array, Float64Builder, StringArray, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tracing::{debug, instrument};

/// Roll the per-record table up to one row per distinct `group_cols` key,
/// summing each of `sum_cols`. Output rows appear in first-seen key order.
///
/// NULL cells (failed numeric parses upstream) contribute 0.0 to their sum.
/// That silently masks parse failures in the totals, which is the accepted
/// trade-off here; the scan report carries the counts needed to audit it.
#[instrument(level = "debug", skip(batch), fields(rows = batch.num_rows()))]
pub fn aggregate(
    batch: &RecordBatch,
    group_cols: &[&str],
    sum_cols: &[&str],
) -> Result<RecordBatch> {
    let schema = batch.schema();

    let mut key_arrays: Vec<&StringArray> = Vec::with_capacity(group_cols.len());
    for name in group_cols {
        let idx = schema
            .index_of(name)
            .with_context(|| format!("group column `{name}` missing from table"))?;
        let array = batch
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| anyhow!("group column `{name}` is not Utf8"))?;
        key_arrays.push(array);
    }

    let mut sum_arrays: Vec<&Float64Array> = Vec::with_capacity(sum_cols.len());
    for name in sum_cols {
        let idx = schema
            .index_of(name)
            .with_context(|| format!("sum column `{name}` missing from table"))?;
        let array = batch
            .column(idx)
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| anyhow!("sum column `{name}` is not Float64"))?;
        sum_arrays.push(array);
    }

    let mut slot_of: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut keys: Vec<Vec<&str>> = Vec::new();
    let mut totals: Vec<Vec<f64>> = Vec::new();

    for row in 0..batch.num_rows() {
        let key: Vec<&str> = key_arrays.iter().map(|a| a.value(row)).collect();
        let slot = *slot_of.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            totals.push(vec![0.0; sum_arrays.len()]);
            keys.len() - 1
        });
        for (i, array) in sum_arrays.iter().enumerate() {
            if !array.is_null(row) {
                totals[slot][i] += array.value(row);
            }
        }
    }

    let mut fields = Vec::with_capacity(group_cols.len() + sum_cols.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());
    for (i, name) in group_cols.iter().enumerate() {
        let mut builder = StringBuilder::new();
        for key in &keys {
            builder.append_value(key[i]);
        }
        fields.push(Field::new(*name, DataType::Utf8, true));
        columns.push(Arc::new(builder.finish()) as ArrayRef);
    }
    for (i, name) in sum_cols.iter().enumerate() {
        let mut builder = Float64Builder::with_capacity(keys.len());
        for row_totals in &totals {
            builder.append_value(row_totals[i]);
        }
        fields.push(Field::new(*name, DataType::Float64, true));
        columns.push(Arc::new(builder.finish()) as ArrayRef);
    }

    let out_schema = Arc::new(Schema::new(fields));
    let out = RecordBatch::try_new(out_schema, columns).context("building aggregate batch")?;
    debug!(groups = out.num_rows(), "aggregated");
    Ok(out)
}
