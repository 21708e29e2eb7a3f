pub mod export;
pub mod normalize;
pub mod parse;
pub mod table;

pub use parse::ParseError;

use anyhow::Result;
use arrow::record_batch::RecordBatch;
use tracing::{info, instrument};

/// Everything derived from one PART-I text export: the per-record table
/// (renumbered for display), the per-deductor rollup, and what the line
/// scanner kept and dropped along the way.
#[derive(Debug)]
pub struct DocumentTables {
    pub records: RecordBatch,
    pub aggregate: RecordBatch,
    pub stats: parse::ScanStats,
}

/// Full pipeline over one raw document:
/// normalize → split sections → classify rows → materialize → renumber → aggregate.
///
/// The caller owns `raw` for the duration of the call; everything returned is
/// derived and independent of it. No state is shared across invocations, so
/// concurrent callers each get their own header discovery.
#[instrument(level = "info", skip(raw), fields(bytes = raw.len()))]
pub fn run_document(raw: &str) -> Result<DocumentTables> {
    let text = normalize::insert_break_after(raw, normalize::TOTALS_HEADER_LINE);
    let sections = parse::split_sections(&text)?;
    let parsed = parse::parse_table(&sections)?;
    info!(
        sections = sections.len(),
        records = parsed.records.len(),
        rejected = parsed.stats.rejected_total(),
        "parsed document"
    );

    let batch = table::materialize(&parsed.header, &parsed.records, &table::NUMERIC_COLUMNS)?;
    let records = table::renumber(&batch)?;
    let aggregate = table::aggregate::aggregate(
        &records,
        &["Name of Deductor", "TAN of Deductor"],
        &table::NUMERIC_COLUMNS,
    )?;

    Ok(DocumentTables {
        records,
        aggregate,
        stats: parsed.stats,
    })
}
