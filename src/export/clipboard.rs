//! Clipboard Operations for Article Export
//!
//! Rich copy puts rendered HTML on the clipboard with the markdown as the
//! plain-text alternative. Platforms without HTML clipboard support get the
//! markdown alone.

// - enum_variant_names: Error variants follow standard naming convention
#![allow(clippy::enum_variant_names)]

use super::html::generate_html_fragment;
use arboard::Clipboard;
use log::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Error
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during clipboard operations.
#[derive(Debug)]
pub enum ClipboardError {
    /// Failed to access clipboard
    AccessError(String),
    /// Failed to set clipboard content
    WriteError(String),
}

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardError::AccessError(msg) => write!(f, "Clipboard access error: {}", msg),
            ClipboardError::WriteError(msg) => write!(f, "Clipboard write error: {}", msg),
        }
    }
}

impl std::error::Error for ClipboardError {}

impl From<ClipboardError> for crate::error::Error {
    fn from(err: ClipboardError) -> Self {
        crate::error::Error::Application(err.to_string())
    }
}

/// What actually landed on the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// HTML with a markdown alternative
    Rich,
    /// Markdown only
    PlainText,
}

impl CopyOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            CopyOutcome::Rich => "Copied formatted article",
            CopyOutcome::PlainText => "Copied article as markdown",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Clipboard Operations
// ─────────────────────────────────────────────────────────────────────────────

/// Minimal clipboard surface, so the fallback logic can be tested.
pub trait ClipboardSink {
    fn set_html(&mut self, html: &str, alt_text: &str) -> Result<(), ClipboardError>;
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The system clipboard through arboard.
pub struct SystemClipboard(Clipboard);

impl SystemClipboard {
    pub fn open() -> Result<Self, ClipboardError> {
        Clipboard::new()
            .map(SystemClipboard)
            .map_err(|e| ClipboardError::AccessError(e.to_string()))
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_html(&mut self, html: &str, alt_text: &str) -> Result<(), ClipboardError> {
        self.0
            .set_html(html, Some(alt_text))
            .map_err(|e| ClipboardError::WriteError(e.to_string()))
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.0
            .set_text(text)
            .map_err(|e| ClipboardError::WriteError(e.to_string()))
    }
}

/// Copy an article as rich text, falling back to plain markdown.
pub fn copy_article(
    sink: &mut dyn ClipboardSink,
    markdown: &str,
) -> Result<CopyOutcome, ClipboardError> {
    let html = generate_html_fragment(markdown);
    match sink.set_html(&html, markdown) {
        Ok(()) => {
            info!("Copied article as HTML ({} bytes)", html.len());
            Ok(CopyOutcome::Rich)
        }
        Err(e) => {
            warn!("Rich copy unavailable ({}), copying markdown", e);
            sink.set_text(markdown)?;
            Ok(CopyOutcome::PlainText)
        }
    }
}

/// Copy an article to the system clipboard.
pub fn copy_article_to_clipboard(markdown: &str) -> Result<CopyOutcome, ClipboardError> {
    let mut clipboard = SystemClipboard::open()?;
    copy_article(&mut clipboard, markdown)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
