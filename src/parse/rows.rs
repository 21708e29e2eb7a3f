// src/parse/rows.rs

use serde::Serialize;
use tracing::{debug, instrument, trace};

use super::sections::Section;
use super::ParseError;

/// Token that identifies the column-name row within a section.
const HEADER_TOKEN: &str = "Sr. No.";

/// Column names prepended to the discovered header for every record.
pub const DEDUCTOR_COLUMNS: [&str; 3] = ["Deductor Number", "Name of Deductor", "TAN of Deductor"];

/// Where the line scanner is within a document. The header is discovered once
/// and then carried in the state itself, so each `parse_table` call is fully
/// isolated from every other.
enum ScanState {
    SeekingHeader,
    CollectingRows(Vec<String>),
}

/// Why a line was left out of the data set. None of these abort the parse:
/// the source format interleaves footers, repeated labels and totals among
/// the table rows, so exclusion is policy, not failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// Line was empty or all delimiter/whitespace.
    Blank,
    /// No header has been seen yet, so the line cannot be classified.
    BeforeHeader,
    /// A later section repeating the header line.
    RepeatedHeader,
    /// First cell is not all ASCII digits (e.g. a `Total` row).
    NonNumericLead,
    /// Cell count differs from the header's.
    ArityMismatch,
}

/// Classification of one already-split line against the discovered header.
#[derive(Debug, PartialEq, Eq)]
pub enum RowOutcome {
    Data(Vec<String>),
    Rejected(RejectReason),
}

/// Counts of what the scanner kept and dropped, per document.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanStats {
    pub sections: usize,
    pub accepted: usize,
    pub blank: usize,
    pub before_header: usize,
    pub repeated_header: usize,
    pub non_numeric_lead: usize,
    pub arity_mismatch: usize,
}

impl ScanStats {
    fn record(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::Blank => self.blank += 1,
            RejectReason::BeforeHeader => self.before_header += 1,
            RejectReason::RepeatedHeader => self.repeated_header += 1,
            RejectReason::NonNumericLead => self.non_numeric_lead += 1,
            RejectReason::ArityMismatch => self.arity_mismatch += 1,
        }
    }

    pub fn rejected_total(&self) -> usize {
        self.blank + self.before_header + self.repeated_header + self.non_numeric_lead
            + self.arity_mismatch
    }
}

/// The flat record list with its unified header and scan statistics.
#[derive(Debug)]
pub struct ParsedTable {
    pub header: Vec<String>,
    pub records: Vec<Vec<String>>,
    pub stats: ScanStats,
}

/// Split a raw line on `^`, trimming cells and dropping empty ones.
pub fn split_cells(line: &str) -> Vec<String> {
    line.split('^')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Decide whether a split line is a data row of `header`'s shape. A data row
/// must lead with an all-digit serial and match the header's arity exactly.
pub fn classify_row(cells: Vec<String>, header: &[String]) -> RowOutcome {
    if cells.is_empty() {
        return RowOutcome::Rejected(RejectReason::Blank);
    }
    if cells.iter().any(|c| c == HEADER_TOKEN) {
        return RowOutcome::Rejected(RejectReason::RepeatedHeader);
    }
    if !cells[0].bytes().all(|b| b.is_ascii_digit()) {
        return RowOutcome::Rejected(RejectReason::NonNumericLead);
    }
    if cells.len() != header.len() {
        return RowOutcome::Rejected(RejectReason::ArityMismatch);
    }
    RowOutcome::Data(cells)
}

/// Scan every section's lines, discover the header (first occurrence wins,
/// document scoped) and assemble one record per accepted data row:
/// `[deductor id, deductor name, TAN] ++ cells`, in document order.
///
/// Fails with [`ParseError::MissingHeader`] when no section contains a header
/// line; everything else is absorbed into [`ScanStats`].
#[instrument(level = "debug", skip(sections), fields(sections = sections.len()))]
pub fn parse_table(sections: &[Section<'_>]) -> Result<ParsedTable, ParseError> {
    let mut state = ScanState::SeekingHeader;
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut stats = ScanStats {
        sections: sections.len(),
        ..ScanStats::default()
    };

    for section in sections {
        for line in &section.lines {
            let cells = split_cells(line);
            state = match state {
                ScanState::SeekingHeader => {
                    if cells.is_empty() {
                        stats.record(RejectReason::Blank);
                        ScanState::SeekingHeader
                    } else if cells.iter().any(|c| c == HEADER_TOKEN) {
                        trace!(deductor = section.deductor_id, cols = cells.len(), "header discovered");
                        ScanState::CollectingRows(cells)
                    } else {
                        stats.record(RejectReason::BeforeHeader);
                        ScanState::SeekingHeader
                    }
                }
                ScanState::CollectingRows(header) => {
                    match classify_row(cells, &header) {
                        RowOutcome::Data(cells) => {
                            records.push(assemble_record(section, cells));
                            stats.accepted += 1;
                        }
                        RowOutcome::Rejected(reason) => {
                            stats.record(reason);
                            trace!(?reason, line = %line, "skipped line");
                        }
                    }
                    ScanState::CollectingRows(header)
                }
            };
        }
    }

    let ScanState::CollectingRows(header) = state else {
        return Err(ParseError::MissingHeader);
    };

    let mut unified: Vec<String> = DEDUCTOR_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
    unified.extend(header);
    debug!(
        records = records.len(),
        rejected = stats.rejected_total(),
        "assembled records"
    );
    Ok(ParsedTable {
        header: unified,
        records,
        stats,
    })
}

fn assemble_record(section: &Section<'_>, cells: Vec<String>) -> Vec<String> {
    let mut record = Vec::with_capacity(DEDUCTOR_COLUMNS.len() + cells.len());
    record.push(section.deductor_id.to_owned());
    record.push(section.deductor_name.to_owned());
    record.push(section.tan.to_owned());
    record.extend(cells);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::split_sections;

    const HEADER_LINE: &str =
        "Sr. No.^Amount Paid / Credited(Rs.)^Tax Deducted(Rs.)^TDS Deposited(Rs.)";

    fn sections_of(text: &str) -> String {
        format!("^PART-I - Details of Tax Deducted at Source^\n{text}")
    }

    #[test]
    fn every_record_matches_unified_header_arity() {
        let doc = sections_of(&format!(
            "01^Acme Corp^TAN123\n{HEADER_LINE}\n1^1000^100^100\n2^2000^200^200"
        ));
        let sections = split_sections(&doc).unwrap();
        let parsed = parse_table(&sections).unwrap();
        assert_eq!(parsed.header.len(), 7);
        for record in &parsed.records {
            assert_eq!(record.len(), parsed.header.len());
        }
        assert_eq!(
            parsed.records[0],
            vec!["01", "Acme Corp", "TAN123", "1", "1000", "100", "100"]
        );
    }

    #[test]
    fn first_header_classifies_all_sections() {
        let doc = sections_of(&format!(
            "01^Acme Corp^TAN123\n{HEADER_LINE}\n1^100^10^10\n\n\
             02^Globex^TAN999\n{HEADER_LINE}\n1^500^50^50"
        ));
        let sections = split_sections(&doc).unwrap();
        let parsed = parse_table(&sections).unwrap();
        assert_eq!(parsed.records.len(), 2);
        // the second section's header line is recognized and skipped, not
        // mistaken for data
        assert_eq!(parsed.stats.repeated_header, 1);
        assert_eq!(parsed.records[1][1], "Globex");
    }

    #[test]
    fn total_row_is_rejected_as_non_numeric_lead() {
        let doc = sections_of(&format!(
            "01^Acme Corp^TAN123\n{HEADER_LINE}\n1^1000^100^100\nTotal^1000^100^100"
        ));
        let sections = split_sections(&doc).unwrap();
        let parsed = parse_table(&sections).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.stats.non_numeric_lead, 1);
    }

    #[test]
    fn wrong_arity_row_is_rejected() {
        let doc = sections_of(&format!(
            "01^Acme Corp^TAN123\n{HEADER_LINE}\n1^1000^100\n1^1000^100^100^extra"
        ));
        let sections = split_sections(&doc).unwrap();
        let parsed = parse_table(&sections).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.stats.arity_mismatch, 2);
    }

    #[test]
    fn missing_header_is_fatal() {
        let doc = sections_of("01^Acme Corp^TAN123\n1^1000^100^100");
        let sections = split_sections(&doc).unwrap();
        let err = parse_table(&sections).unwrap_err();
        assert_eq!(err, ParseError::MissingHeader);
    }

    #[test]
    fn classify_row_reports_reasons() {
        let header: Vec<String> = ["Sr. No.", "A", "B"].iter().map(|s| s.to_string()).collect();
        let rows = [
            ("", RejectReason::Blank),
            ("Sr. No.^A^B", RejectReason::RepeatedHeader),
            ("Total^1^2", RejectReason::NonNumericLead),
            ("1^2", RejectReason::ArityMismatch),
        ];
        for (line, reason) in rows {
            assert_eq!(
                classify_row(split_cells(line), &header),
                RowOutcome::Rejected(reason),
                "line {line:?}"
            );
        }
        assert_eq!(
            classify_row(split_cells("1^2^3"), &header),
            RowOutcome::Data(vec!["1".into(), "2".into(), "3".into()])
        );
    }
}
