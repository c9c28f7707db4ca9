//! Lightweight markdown parser
//!
//! Converts article text into a flat sequence of [`ParsedBlock`]s. The
//! accepted format is a deliberately small subset of markdown: headings up
//! to level 3, paragraphs, bullet lists, pipe tables, standalone images and
//! `**bold**` inline runs. Anything else degrades to a paragraph.
//!
//! Both the preview and the HTML export consume the output of
//! [`parse_blocks`], so they always agree on block structure.

use regex::Regex;
use std::sync::OnceLock;

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Heading level (H1-H3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
}

impl HeadingLevel {
    /// Numeric level, 1-3.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Markdown prefix for this level, including the trailing space.
    pub fn prefix(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "# ",
            HeadingLevel::H2 => "## ",
            HeadingLevel::H3 => "### ",
        }
    }
}

/// A run of inline text. No nesting, no styles other than bold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineRun {
    PlainText(String),
    Bold(String),
}

impl InlineRun {
    /// The visible text of this run, without markers.
    pub fn text(&self) -> &str {
        match self {
            InlineRun::PlainText(t) | InlineRun::Bold(t) => t,
        }
    }
}

/// One structural unit derived from the article text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedBlock {
    /// `#`, `##` or `###` heading
    Heading { level: HeadingLevel, text: String },
    /// Any other non-blank line
    Paragraph(Vec<InlineRun>),
    /// Consecutive `- ` / `* ` lines, one entry per item
    List(Vec<Vec<InlineRun>>),
    /// Pipe table: header cells plus body rows
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Standalone `![alt](url)` line
    Image { url: String, alt: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

static BOLD_PATTERN: OnceLock<Regex> = OnceLock::new();
static IMAGE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn bold_pattern() -> &'static Regex {
    BOLD_PATTERN.get_or_init(|| Regex::new(r"\*\*.*?\*\*").expect("bold pattern is valid"))
}

fn image_pattern() -> &'static Regex {
    IMAGE_PATTERN
        .get_or_init(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("image pattern is valid"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Accumulation state for blocks that span several lines.
///
/// Only one of the two buffers is ever non-empty.
#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<ParsedBlock>,
    list_items: Vec<Vec<InlineRun>>,
    table_rows: Vec<String>,
}

impl BlockBuilder {
    fn flush_list(&mut self) {
        if !self.list_items.is_empty() {
            let items = std::mem::take(&mut self.list_items);
            self.blocks.push(ParsedBlock::List(items));
        }
    }

    fn flush_table(&mut self) {
        let rows = std::mem::take(&mut self.table_rows);
        // Header plus separator is the minimum; shorter tables are dropped.
        if rows.len() < 2 {
            return;
        }
        let headers = split_table_row(&rows[0]);
        let body = rows[2..]
            .iter()
            .map(|row| split_table_row(row))
            .filter(|cells| !cells.is_empty())
            .collect();
        self.blocks.push(ParsedBlock::Table {
            headers,
            rows: body,
        });
    }

    fn finish(mut self) -> Vec<ParsedBlock> {
        self.flush_list();
        self.flush_table();
        self.blocks
    }
}

/// Parse article text into an ordered block sequence.
///
/// Pure and deterministic: the same input always yields the same blocks.
///
/// # Example
/// ```ignore
/// let blocks = parse_blocks("# Title\n\nSome **bold** text");
/// assert_eq!(blocks.len(), 2);
/// ```
pub fn parse_blocks(text: &str) -> Vec<ParsedBlock> {
    let mut builder = BlockBuilder::default();

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('|') {
            builder.flush_list();
            builder.table_rows.push(trimmed.to_string());
            continue;
        }
        builder.flush_table();

        if let Some(item) = list_item_content(trimmed) {
            builder.list_items.push(parse_inline(item));
            continue;
        }
        builder.flush_list();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("![") {
            if let Some((alt, url)) = parse_image(trimmed) {
                builder.blocks.push(ParsedBlock::Image { url, alt });
                continue;
            }
        }

        if let Some((level, heading)) = parse_heading(line) {
            builder.blocks.push(ParsedBlock::Heading {
                level,
                // Everything after the prefix, minus trailing whitespace
                text: heading.trim_end().to_string(),
            });
            continue;
        }

        builder.blocks.push(ParsedBlock::Paragraph(parse_inline(trimmed)));
    }

    builder.finish()
}

/// Split a table row on `|`, trimming cells and dropping empty edge splits.
fn split_table_row(row: &str) -> Vec<String> {
    row.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Content of a bullet list item, if the trimmed line is one.
fn list_item_content(trimmed: &str) -> Option<&str> {
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
}

/// Heading level and remainder. Longer prefixes are checked first.
fn parse_heading(line: &str) -> Option<(HeadingLevel, &str)> {
    [HeadingLevel::H3, HeadingLevel::H2, HeadingLevel::H1]
        .into_iter()
        .find_map(|level| line.strip_prefix(level.prefix()).map(|rest| (level, rest)))
}

/// Extract `(alt, url)` from an image line.
fn parse_image(trimmed: &str) -> Option<(String, String)> {
    let caps = image_pattern().captures(trimmed)?;
    let alt = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let url = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    Some((alt.to_string(), url.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Split a line into plain and bold runs, in original order.
pub fn parse_inline(content: &str) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut last = 0;

    for m in bold_pattern().find_iter(content) {
        if m.start() > last {
            runs.push(InlineRun::PlainText(content[last..m.start()].to_string()));
        }
        let inner = &m.as_str()[2..m.as_str().len() - 2];
        runs.push(InlineRun::Bold(inner.to_string()));
        last = m.end();
    }

    if last < content.len() {
        runs.push(InlineRun::PlainText(content[last..].to_string()));
    }

    runs
}

/// Plain text of a run sequence, markers removed.
pub fn runs_to_plain_text(runs: &[InlineRun]) -> String {
    runs.iter().map(InlineRun::text).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
