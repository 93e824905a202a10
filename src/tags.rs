//! Tag input normalization.
//!
//! Turns free-form comma-or-paste input into a deduplicated tag list,
//! preserving first-seen order. Dedupe is exact-match: tags keep whatever
//! case the user typed, only titles get case-folded comparison elsewhere.

/// Merge comma-separated input into an existing tag list. Pieces are
/// trimmed, empties dropped, duplicates skipped, first-seen order kept,
/// and the result truncated to `max_tags` when one is set.
pub fn merge_tags(existing: &[String], raw: &str, max_tags: Option<usize>) -> Vec<String> {
    let mut next: Vec<String> = existing.to_vec();
    for piece in raw.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if !next.iter().any(|t| t == piece) {
            next.push(piece.to_string());
        }
    }
    if let Some(max) = max_tags {
        next.truncate(max);
    }
    next
}

/// Remove exactly the entry at `index`; everything else keeps its relative
/// order. Out-of-range indexes are a no-op.
pub fn remove_tag(tags: &[String], index: usize) -> Vec<String> {
    tags.iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, t)| t.clone())
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────
