//! Streaming assembler
//!
//! Appends arriving text fragments to a buffer and copies the buffer into
//! the document at most once per [`FLUSH_INTERVAL`]. Completion and failure
//! both force a final flush, so the document always ends up holding exactly
//! the text that was received.
//!
//! Time is passed in by the caller. The assembler never reads the clock
//! itself, which keeps it deterministic under test.

use super::session::SessionToken;
use crate::document::Document;
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Minimum time between two visible updates of the document text.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(32);

/// Text accumulated for one generation session.
#[derive(Debug, Clone)]
pub struct StreamBuffer {
    pub token: SessionToken,
    pub accumulated: String,
    pub last_flush: Instant,
    pub fragments: usize,
}

impl StreamBuffer {
    fn new(token: SessionToken, now: Instant) -> Self {
        Self {
            token,
            accumulated: String::new(),
            last_flush: now,
            fragments: 0,
        }
    }
}

/// How a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Completed,
    Failed,
}

/// Throttled merge of text fragments into a [`Document`].
#[derive(Debug, Default)]
pub struct StreamAssembler {
    buffer: Option<StreamBuffer>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, discarding any buffer from a superseded one.
    ///
    /// The document text is cleared; the new article replaces the old one.
    pub fn start(&mut self, token: SessionToken, now: Instant, document: &mut Document) {
        if let Some(previous) = self.buffer.take() {
            debug!(
                "Stream {} superseded by {} after {} fragments",
                previous.token, token, previous.fragments
            );
        }
        document.text.clear();
        self.buffer = Some(StreamBuffer::new(token, now));
    }

    pub fn is_active(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn active_token(&self) -> Option<SessionToken> {
        self.buffer.as_ref().map(|b| b.token)
    }

    /// Text received so far, including anything not yet flushed.
    pub fn accumulated(&self) -> Option<&str> {
        self.buffer.as_ref().map(|b| b.accumulated.as_str())
    }

    /// Append a fragment. Returns `true` if the document text was updated.
    ///
    /// Fragments for a token other than the active one are ignored.
    pub fn push_fragment(
        &mut self,
        token: SessionToken,
        fragment: &str,
        now: Instant,
        document: &mut Document,
    ) -> bool {
        let Some(buffer) = self.buffer.as_mut().filter(|b| b.token == token) else {
            debug!("Dropping fragment for inactive stream {}", token);
            return false;
        };

        buffer.accumulated.push_str(fragment);
        buffer.fragments += 1;

        if now.saturating_duration_since(buffer.last_flush) > FLUSH_INTERVAL {
            document.text.clone_from(&buffer.accumulated);
            buffer.last_flush = now;
            true
        } else {
            false
        }
    }

    /// End the stream, forcing the document text to everything received.
    ///
    /// Returns `false` when `token` is not the active stream.
    pub fn finish(&mut self, token: SessionToken, end: StreamEnd, document: &mut Document) -> bool {
        if self.active_token() != Some(token) {
            debug!("Ignoring end of inactive stream {}", token);
            return false;
        }
        let Some(buffer) = self.buffer.take() else {
            return false;
        };

        document.text = buffer.accumulated;
        match end {
            StreamEnd::Completed => info!(
                "Stream {} completed: {} fragments, {} bytes",
                token,
                buffer.fragments,
                document.text.len()
            ),
            StreamEnd::Failed => warn!(
                "Stream {} failed after {} fragments; keeping {} bytes",
                token,
                buffer.fragments,
                document.text.len()
            ),
        }
        true
    }

    /// Drop the active stream without touching the document.
    pub fn abandon(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            debug!("Abandoned stream {}", buffer.token);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
