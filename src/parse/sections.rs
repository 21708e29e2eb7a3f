// src/parse/sections.rs

use tracing::{debug, instrument, trace};

use super::ParseError;

/// Fixed literal separating the document preamble from the tabular region.
pub const PART_I_MARKER: &str = "^PART-I - Details of Tax Deducted at Source^";

/// One deductor's block of the document: the metadata line split into its
/// three fields, plus every following raw line of the block. Borrows from the
/// normalized text for the duration of the parse.
#[derive(Debug, PartialEq, Eq)]
pub struct Section<'a> {
    pub deductor_id: &'a str,
    pub deductor_name: &'a str,
    pub tan: &'a str,
    pub lines: Vec<&'a str>,
}

/// Split the normalized text into deductor sections.
///
/// Everything before the first marker occurrence is preamble and discarded;
/// the marker itself is a hard precondition ([`ParseError::MissingMarker`]).
/// The tail is split on blank-line boundaries, and a candidate block whose
/// first line does not carry the three `^`-delimited deductor fields
/// (id, name, TAN) is dropped silently.
#[instrument(level = "debug", skip(text), fields(bytes = text.len()))]
pub fn split_sections(text: &str) -> Result<Vec<Section<'_>>, ParseError> {
    let (_, tail) = text
        .split_once(PART_I_MARKER)
        .ok_or(ParseError::MissingMarker)?;

    let mut sections = Vec::new();
    for candidate in tail.split("\n\n") {
        let block = candidate.trim();
        if block.is_empty() {
            continue;
        }

        let mut lines = block.lines();
        let Some(meta) = lines.next() else {
            continue;
        };
        let fields: Vec<&str> = meta.split('^').map(str::trim).collect();
        if fields.len() < 3 {
            trace!(line = meta, "dropping block without deductor metadata");
            continue;
        }

        sections.push(Section {
            deductor_id: fields[0],
            deductor_name: fields[1],
            tan: fields[2],
            lines: lines.collect(),
        });
    }

    debug!(sections = sections.len(), "split document tail");
    Ok(sections)
}
