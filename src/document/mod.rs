//! Document model
//!
//! The article being authored: canonical markdown text plus the candidate
//! images generated for it. Blocks for preview and export are derived from
//! `text` on demand and never stored here.

mod images;

pub use images::{clamp_image_count, ImageRef, ImageSet, MAX_IMAGES};

use crate::markdown::{parse_blocks, ParsedBlock};

/// Markdown text and generated images for one authoring session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub images: ImageSet,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: ImageSet::new(),
        }
    }

    /// Parse the current text into renderable blocks.
    pub fn blocks(&self) -> Vec<ParsedBlock> {
        parse_blocks(&self.text)
    }

    /// First heading in the text, used as a title for history entries.
    pub fn title(&self) -> Option<String> {
        self.blocks().into_iter().find_map(|block| match block {
            ParsedBlock::Heading { text, .. } if !text.is_empty() => Some(text),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.images.clear();
    }
}
