//! Article statistics for the status line
//!
//! Words are counted over the parsed blocks rather than the raw text, so
//! markdown markers (`#`, `-`, `**`, table pipes) and image references do
//! not inflate the count.

use crate::markdown::{parse_blocks, runs_to_plain_text, ParsedBlock};

/// Average silent reading speed used for the estimate.
pub const WORDS_PER_MINUTE: usize = 200;

// ─────────────────────────────────────────────────────────────────────────────
// TextStats
// ─────────────────────────────────────────────────────────────────────────────

/// Counts shown under the article.
///
/// # Example
///
/// ```ignore
/// let stats = TextStats::from_markdown("# Title\n\nSome **bold** words.");
/// assert_eq!(stats.words, 4);
/// assert_eq!(stats.headings, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    /// Words of visible text
    pub words: usize,
    /// Characters of the raw markdown, including whitespace
    pub characters: usize,
    /// Paragraph, list and table blocks
    pub paragraphs: usize,
    pub headings: usize,
    /// Inline image references
    pub images: usize,
}

impl TextStats {
    pub fn from_markdown(text: &str) -> Self {
        let mut stats = Self {
            characters: text.chars().count(),
            ..Self::default()
        };

        for block in parse_blocks(text) {
            match block {
                ParsedBlock::Heading { text, .. } => {
                    stats.headings += 1;
                    stats.words += count_words(&text);
                }
                ParsedBlock::Paragraph(runs) => {
                    stats.paragraphs += 1;
                    stats.words += count_words(&runs_to_plain_text(&runs));
                }
                ParsedBlock::List(items) => {
                    stats.paragraphs += 1;
                    stats.words += items
                        .iter()
                        .map(|runs| count_words(&runs_to_plain_text(runs)))
                        .sum::<usize>();
                }
                ParsedBlock::Table { headers, rows } => {
                    stats.paragraphs += 1;
                    stats.words += headers
                        .iter()
                        .chain(rows.iter().flatten())
                        .map(|cell| count_words(cell))
                        .sum::<usize>();
                }
                ParsedBlock::Image { .. } => stats.images += 1,
            }
        }
        stats
    }

    /// Estimated reading time in whole minutes; at least one for any text.
    pub fn reading_minutes(&self) -> usize {
        if self.words == 0 {
            0
        } else {
            self.words.div_ceil(WORDS_PER_MINUTE)
        }
    }

    /// Returns a compact string like "850 words | 5 min read | 2 images"
    pub fn format_compact(&self) -> String {
        let mut parts = vec![
            format!("{} word{}", self.words, plural(self.words)),
            format!("{} min read", self.reading_minutes()),
        ];
        if self.images > 0 {
            parts.push(format!("{} image{}", self.images, plural(self.images)));
        }
        parts.join(" | ")
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_empty_text() {
        let stats = TextStats::from_markdown("");
        assert_eq!(stats, TextStats::default());
        assert_eq!(stats.reading_minutes(), 0);
    }

    #[test]
    fn test_markers_are_not_words() {
        let stats = TextStats::from_markdown("# Title\n\nSome **bold** words.\n- a b\n* c");
        assert_eq!(stats.words, 7);
        assert_eq!(stats.headings, 1);
        assert_eq!(stats.paragraphs, 2);
    }

    #[test]
    fn test_tables_and_images() {
        let text = "| A | B c |\n|---|---|\n| 1 | 2 |\n\n![a long alt text](http://x/y.png)";
        let stats = TextStats::from_markdown(text);
        assert_eq!(stats.words, 5);
        assert_eq!(stats.images, 1);
        assert_eq!(stats.characters, text.chars().count());
    }

    #[test]
    fn test_reading_time_rounds_up() {
        let text = vec!["word"; 201].join(" ");
        let stats = TextStats::from_markdown(&text);
        assert_eq!(stats.words, 201);
        assert_eq!(stats.reading_minutes(), 2);

        assert_eq!(TextStats::from_markdown("one").reading_minutes(), 1);
    }

    #[test]
    fn test_format_compact() {
        let stats = TextStats::from_markdown("Hello there\n\n![x](y)");
        assert_eq!(stats.format_compact(), "2 words | 1 min read | 1 image");
        assert_eq!(
            TextStats::from_markdown("Hi").format_compact(),
            "1 word | 1 min read"
        );
    }
}
