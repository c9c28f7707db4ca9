//! UTF-8 Safe String Utilities
//!
//! Cursor offsets reach the editing core from two places: egui reports
//! character indices, while the splice operations work on byte offsets.
//! These helpers convert between the two and snap arbitrary byte offsets to
//! character boundaries so slicing never panics on multi-byte text.

// ─────────────────────────────────────────────────────────────────────────────
// Boundaries
// ─────────────────────────────────────────────────────────────────────────────

/// Nearest char boundary at or before `index`, capped at `s.len()`.
#[inline]
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    let index = index.min(s.len());
    (0..=index)
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0)
}

/// Nearest char boundary at or after `index`, capped at `s.len()`.
#[inline]
pub fn ceil_char_boundary(s: &str, index: usize) -> usize {
    (index.min(s.len())..=s.len())
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(s.len())
}

/// Normalize a selection range: clamp to the text, snap to character
/// boundaries and order the endpoints.
pub fn normalize_range(s: &str, start: usize, end: usize) -> (usize, usize) {
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    (floor_char_boundary(s, start), ceil_char_boundary(s, end))
}

// ─────────────────────────────────────────────────────────────────────────────
// Char / Byte Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Byte offset of the `char_index`-th character, or `s.len()` past the end.
pub fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    match s.char_indices().nth(char_index) {
        Some((byte, _)) => byte,
        None => s.len(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
