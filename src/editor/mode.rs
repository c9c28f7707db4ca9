//! Edit-mode controller
//!
//! Tracks preview vs raw editing, the last known selection in the raw
//! editor, and whether a generation stream currently owns the document.
//! While a stream is active every user mutation is refused.

use crate::config::EditMode;
use crate::document::{Document, ImageRef};
use crate::error::{Error, Result};
use crate::markdown::{
    apply_format, insert_at, insert_image_at, CapturedCursor, InsertResult, MarkdownFormatCommand,
};
use crate::string_utils::normalize_range;
use log::debug;

#[derive(Debug, Clone, Default)]
pub struct EditModeController {
    mode: EditMode,
    selection: (usize, usize),
    stream_active: bool,
}

impl EditModeController {
    pub fn new(mode: EditMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode.is_editing()
    }

    pub fn is_locked(&self) -> bool {
        self.stream_active
    }

    /// Mark whether a generation stream is writing into the document.
    pub fn set_stream_active(&mut self, active: bool) {
        self.stream_active = active;
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.stream_active {
            debug!("Rejected edit while stream is active");
            return Err(Error::StreamActive);
        }
        Ok(())
    }

    /// Flip between preview and raw editing.
    pub fn toggle(&mut self) -> Result<EditMode> {
        self.ensure_unlocked()?;
        self.mode = self.mode.toggle();
        Ok(self.mode)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────

    /// Record the editor's selection in byte offsets.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.selection = (start, end);
    }

    pub fn selection(&self) -> (usize, usize) {
        self.selection
    }

    /// Freeze the current selection for an insertion that completes later.
    pub fn capture_cursor(&self, text: &str) -> CapturedCursor {
        let (start, end) = normalize_range(text, self.selection.0, self.selection.1);
        CapturedCursor::new(start, end)
    }

    /// Text currently selected, or the paragraph around a collapsed cursor.
    pub fn selection_context<'a>(&self, text: &'a str) -> &'a str {
        let (start, end) = normalize_range(text, self.selection.0, self.selection.1);
        if start < end {
            return &text[start..end];
        }
        let from = text[..start].rfind("\n\n").map(|i| i + 2).unwrap_or(0);
        let to = text[start..]
            .find("\n\n")
            .map(|i| start + i)
            .unwrap_or(text.len());
        &text[from..to]
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the whole text with what the user typed.
    pub fn replace_text(&mut self, document: &mut Document, text: String) -> Result<()> {
        self.ensure_unlocked()?;
        document.text = text;
        Ok(())
    }

    /// Wrap the current selection with `before` and `after`.
    pub fn insert(&mut self, document: &mut Document, before: &str, after: &str) -> Result<()> {
        self.ensure_unlocked()?;
        let (start, end) = self.selection;
        let result = insert_at(&document.text, start, end, before, after);
        self.apply(document, result);
        Ok(())
    }

    /// Apply a formatting command to the current selection.
    pub fn format(&mut self, document: &mut Document, command: MarkdownFormatCommand) -> Result<()> {
        self.ensure_unlocked()?;
        let (start, end) = self.selection;
        let result = apply_format(&document.text, start, end, command);
        self.apply(document, result);
        Ok(())
    }

    /// Insert an image reference at a cursor captured earlier.
    pub fn insert_image(
        &mut self,
        document: &mut Document,
        cursor: CapturedCursor,
        image: &ImageRef,
    ) -> Result<()> {
        self.ensure_unlocked()?;
        let result = insert_image_at(&document.text, cursor, &image.alt_text(), &image.data_uri);
        self.apply(document, result);
        Ok(())
    }

    fn apply(&mut self, document: &mut Document, result: InsertResult) {
        document.text = result.text;
        self.selection = result.selection;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
