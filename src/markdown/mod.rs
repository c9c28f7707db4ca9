//! Lightweight markdown parsing and editing
//!
//! Article text is parsed into a flat sequence of blocks (headings,
//! paragraphs, lists, tables, images) with inline bold runs. The same block
//! sequence drives the egui preview and the HTML export.
//!
//! # Example
//! ```ignore
//! use crate::markdown::{parse_blocks, insert_at, ParsedBlock};
//!
//! let blocks = parse_blocks("# Hello\n\nThis is **bold** text.");
//! assert!(matches!(blocks[0], ParsedBlock::Heading { .. }));
//!
//! let result = insert_at("Hello world", 0, 5, "**", "**");
//! assert_eq!(result.text, "**Hello** world");
//! ```

pub mod formatting;
mod parser;

pub use formatting::{
    apply_format, insert_at, insert_image_at, CapturedCursor, InsertResult, MarkdownFormatCommand,
};
pub use parser::{
    parse_blocks, runs_to_plain_text, HeadingLevel, InlineRun, ParsedBlock,
};
