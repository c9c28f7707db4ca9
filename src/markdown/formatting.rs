//! Markdown Formatting Operations
//!
//! Cursor-aware text insertion for the raw editor. Every command here is
//! a pure splice over the article text: existing text is never dropped or
//! reordered, only wrapped or prefixed.
//!
//! # Usage
//! ```ignore
//! use crate::markdown::formatting::insert_at;
//!
//! let result = insert_at("Hello world", 0, 5, "**", "**");
//! assert_eq!(result.text, "**Hello** world");
//! assert_eq!(result.selection, (2, 7));
//! ```

use crate::markdown::parser::HeadingLevel;
use crate::string_utils::normalize_range;

// ─────────────────────────────────────────────────────────────────────────────
// Format Command Enum
// ─────────────────────────────────────────────────────────────────────────────

/// Formatting shortcuts available in the raw editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkdownFormatCommand {
    /// Bold text (**text**)
    Bold,
    /// Italic text (*text*)
    Italic,
    /// Heading prefix for the current line
    Heading(HeadingLevel),
}

impl MarkdownFormatCommand {
    /// Get the keyboard shortcut label for this command.
    pub fn shortcut_label(&self) -> &'static str {
        match self {
            Self::Bold => "Ctrl+B",
            Self::Italic => "Ctrl+I",
            Self::Heading(HeadingLevel::H1) => "Ctrl+1",
            Self::Heading(HeadingLevel::H2) => "Ctrl+2",
            Self::Heading(HeadingLevel::H3) => "Ctrl+3",
        }
    }

    /// Get the icon for this command (for toolbar).
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Bold => "B",
            Self::Italic => "I",
            Self::Heading(HeadingLevel::H1) => "H1",
            Self::Heading(HeadingLevel::H2) => "H2",
            Self::Heading(HeadingLevel::H3) => "H3",
        }
    }

    /// Get the tooltip text for this command.
    pub fn tooltip(&self) -> String {
        let name = match self {
            Self::Bold => "Bold".to_string(),
            Self::Italic => "Italic".to_string(),
            Self::Heading(level) => format!("Heading {}", level.as_u8()),
        };
        format!("{} ({})", name, self.shortcut_label())
    }

    /// All toolbar commands, in display order.
    pub fn toolbar() -> [MarkdownFormatCommand; 5] {
        [
            Self::Bold,
            Self::Italic,
            Self::Heading(HeadingLevel::H1),
            Self::Heading(HeadingLevel::H2),
            Self::Heading(HeadingLevel::H3),
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Insert Result
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a splice: the new text and where the selection ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertResult {
    /// The new text after insertion
    pub text: String,
    /// New selection range (start, end) in byte offsets
    pub selection: (usize, usize),
}

/// A selection captured at the moment an insertion was requested.
///
/// Asynchronous insertions (a generated image dropped at the cursor) hold
/// on to this instead of re-reading the cursor when the result arrives,
/// since focus may have moved in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapturedCursor {
    pub start: usize,
    pub end: usize,
}

impl CapturedCursor {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Splice Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Wrap `text[start..end]` with `before` and `after`.
///
/// Produces `text[..start] + before + text[start..end] + after + text[end..]`
/// and shifts the selection by `before.len()`. Offsets are clamped to the
/// text and snapped to character boundaries; reversed ranges are reordered.
pub fn insert_at(text: &str, start: usize, end: usize, before: &str, after: &str) -> InsertResult {
    let (start, end) = normalize_range(text, start, end);

    let mut new_text = String::with_capacity(text.len() + before.len() + after.len());
    new_text.push_str(&text[..start]);
    new_text.push_str(before);
    new_text.push_str(&text[start..end]);
    new_text.push_str(after);
    new_text.push_str(&text[end..]);

    InsertResult {
        text: new_text,
        selection: (start + before.len(), end + before.len()),
    }
}

/// Apply a formatting command to the selection `(start, end)`.
pub fn apply_format(
    text: &str,
    start: usize,
    end: usize,
    command: MarkdownFormatCommand,
) -> InsertResult {
    match command {
        MarkdownFormatCommand::Bold => insert_at(text, start, end, "**", "**"),
        MarkdownFormatCommand::Italic => insert_at(text, start, end, "*", "*"),
        MarkdownFormatCommand::Heading(level) => apply_heading_prefix(text, start, end, level),
    }
}

/// Prefix the line containing `start` with a heading marker.
///
/// An existing heading marker on that line is replaced rather than
/// stacked; the selection follows the text it covered.
fn apply_heading_prefix(text: &str, start: usize, end: usize, level: HeadingLevel) -> InsertResult {
    let (start, end) = normalize_range(text, start, end);
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &text[line_start..];

    let existing = [HeadingLevel::H3, HeadingLevel::H2, HeadingLevel::H1]
        .into_iter()
        .find(|l| line.starts_with(l.prefix()))
        .map(|l| l.prefix().len())
        .unwrap_or(0);

    // Remove the old marker, then insert the new one at the line start.
    let stripped = format!("{}{}", &text[..line_start], &text[line_start + existing..]);
    let shift = |offset: usize| offset.saturating_sub(existing).max(line_start);
    let result = insert_at(&stripped, line_start, line_start, level.prefix(), "");

    let added = level.prefix().len();
    InsertResult {
        text: result.text,
        selection: (shift(start) + added, shift(end) + added),
    }
}

/// Markdown for an image reference on its own line.
pub fn image_markdown(alt: &str, url: &str) -> String {
    format!("\n![{}]({})\n", alt, url)
}

/// Insert an image reference at a previously captured cursor.
///
/// The image goes after the captured selection so selected text is kept.
pub fn insert_image_at(text: &str, cursor: CapturedCursor, alt: &str, url: &str) -> InsertResult {
    let markdown = image_markdown(alt, url);
    let (_, end) = normalize_range(text, cursor.start, cursor.end);
    let result = insert_at(text, end, end, &markdown, "");
    let after = end + markdown.len();
    InsertResult {
        text: result.text,
        selection: (after, after),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────────────────
    // insert_at Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_insert_at_wraps_selection() {
        let result = insert_at("Hello world", 0, 5, "**", "**");
        assert_eq!(result.text, "**Hello** world");
        assert_eq!(result.selection, (2, 7));
    }

    #[test]
    fn test_insert_at_collapsed_cursor() {
        let result = insert_at("Hello", 5, 5, "**", "**");
        assert_eq!(result.text, "Hello****");
        assert_eq!(result.selection, (7, 7));
    }

    #[test]
    fn test_insert_at_reversed_range() {
        let result = insert_at("Hello world", 11, 6, "*", "*");
        assert_eq!(result.text, "Hello *world*");
        assert_eq!(result.selection, (7, 12));
    }

    #[test]
    fn test_insert_at_clamps_out_of_bounds() {
        let result = insert_at("abc", 10, 20, "[", "]");
        assert_eq!(result.text, "abc[]");
        assert_eq!(result.selection, (4, 4));
    }

    #[test]
    fn test_insert_at_preserves_all_text() {
        let text = "Hei på deg 你好 🎉";
        for i in 0..=text.len() + 2 {
            for j in i..=text.len() + 2 {
                let result = insert_at(text, i, j, "<", ">");
                let restored = result.text.replacen('<', "", 1).replacen('>', "", 1);
                assert_eq!(restored, text);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Format Command Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_bold_and_italic() {
        let bold = apply_format("Hello world", 0, 5, MarkdownFormatCommand::Bold);
        assert_eq!(bold.text, "**Hello** world");

        let italic = apply_format("Hello world", 6, 11, MarkdownFormatCommand::Italic);
        assert_eq!(italic.text, "Hello *world*");
        assert_eq!(italic.selection, (7, 12));
    }

    #[test]
    fn test_heading_prefix_on_second_line() {
        let result = apply_format(
            "Intro\nTitle here",
            8,
            8,
            MarkdownFormatCommand::Heading(HeadingLevel::H2),
        );
        assert_eq!(result.text, "Intro\n## Title here");
        assert_eq!(result.selection, (11, 11));
    }

    #[test]
    fn test_heading_replaces_existing_marker() {
        let result = apply_format(
            "# Title",
            4,
            7,
            MarkdownFormatCommand::Heading(HeadingLevel::H3),
        );
        assert_eq!(result.text, "### Title");
        assert_eq!(&result.text[result.selection.0..result.selection.1], "tle");
    }

    #[test]
    fn test_tooltips() {
        let tooltip = MarkdownFormatCommand::Bold.tooltip();
        assert!(tooltip.contains("Bold"));
        assert!(tooltip.contains("Ctrl+B"));
        assert_eq!(
            MarkdownFormatCommand::Heading(HeadingLevel::H2).tooltip(),
            "Heading 2 (Ctrl+2)"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Image Insertion Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_insert_image_at_captured_cursor() {
        let cursor = CapturedCursor::new(5, 5);
        let result = insert_image_at("Hello world", cursor, "cat", "data:x");
        assert_eq!(result.text, "Hello\n![cat](data:x)\n world");
    }

    #[test]
    fn test_insert_image_after_selection() {
        let cursor = CapturedCursor::new(0, 5);
        let result = insert_image_at("Hello world", cursor, "a", "u");
        assert!(result.text.starts_with("Hello\n![a](u)\n"));
    }

    #[test]
    fn test_insert_image_cursor_past_end_is_clamped() {
        let cursor = CapturedCursor::new(100, 100);
        let result = insert_image_at("short", cursor, "a", "u");
        assert_eq!(result.text, "short\n![a](u)\n");
        assert_eq!(result.selection, (result.text.len(), result.text.len()));
    }
}
