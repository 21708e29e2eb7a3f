// src/normalize/mod.rs

use tracing::{debug, instrument};

/// Per-deductor totals line. The source format is supposed to put a blank line
/// after it, separating one deductor block from the next, but real exports
/// frequently omit it and two blocks run together.
pub const TOTALS_HEADER_LINE: &str = "Sr. No.^Name of Deductor^TAN of Deductor^^^^^Total Amount Paid / Credited(Rs.)^Total Tax Deducted(Rs.)^Total TDS Deposited(Rs.)";

/// Ensure every line equal to `target` (modulo surrounding whitespace) is
/// followed by a blank line. Pure transform: the input is never mutated and
/// a text without the target comes back unchanged.
///
/// Idempotent: when the following line is already empty nothing is inserted,
/// so applying the transform twice equals applying it once.
#[instrument(level = "debug", skip(text, target), fields(bytes = text.len()))]
pub fn insert_break_after(text: &str, target: &str) -> String {
    let target = target.trim();
    let lines: Vec<&str> = text.split('\n').collect();

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 4);
    let mut inserted = 0usize;
    for (i, line) in lines.iter().enumerate() {
        out.push(line);
        if line.trim() == target {
            let already_blank = lines.get(i + 1).is_some_and(|next| next.is_empty());
            if !already_blank {
                out.push("");
                inserted += 1;
            }
        }
    }

    debug!(inserted, "normalized section breaks");
    out.join("\n")
}
