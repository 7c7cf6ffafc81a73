//! Inline citation markers.
//!
//! Markers are placed at the end of each supported span. All offsets refer to
//! the original text: the output is assembled by copying slices of the input,
//! so an inserted marker never shifts a later span.

use grounded_types::{GroundingMetadata, GroundingSupport};
use std::ops::Range;

/// Insert `[n]` markers (1-based) after every validly-bounded supported span.
///
/// Text is returned unchanged when there is no metadata, no supports or no
/// text. Invalid spans are skipped, never panicked on.
pub fn insert_citations(text: &str, metadata: Option<&GroundingMetadata>) -> String {
    let Some(metadata) = metadata else {
        return text.to_string();
    };
    if text.is_empty() || metadata.supports.is_empty() {
        return text.to_string();
    }

    let mut placements: Vec<(Range<usize>, String)> = metadata
        .supports
        .iter()
        .filter_map(|support| {
            let range = support.segment.byte_range(text)?;
            let marker = marker_group(support)?;
            Some((range, marker))
        })
        .collect();

    if placements.is_empty() {
        return text.to_string();
    }

    // Stable: equal end offsets keep their original support order.
    placements.sort_by_key(|(range, _)| range.end);

    let extra: usize = placements.iter().map(|(_, m)| m.len() + 1).sum();
    let mut out = String::with_capacity(text.len() + extra);
    let mut cursor = 0;
    let mut last_insert = None;
    for (range, marker) in &placements {
        out.push_str(&text[cursor..range.end]);
        // Groups sharing an insertion point share one separating space.
        if last_insert != Some(range.end) {
            out.push(' ');
        }
        out.push_str(marker);
        cursor = range.end;
        last_insert = Some(range.end);
    }
    out.push_str(&text[cursor..]);
    out
}

/// `"[1][3]"` for evidence indices `[0, 2]`; `None` when nothing is citable.
fn marker_group(support: &GroundingSupport) -> Option<String> {
    let labels: String = support
        .evidence_indices
        .iter()
        .filter(|&&i| i >= 0)
        .map(|i| format!("[{}]", i + 1))
        .collect();
    (!labels.is_empty()).then_some(labels)
}
