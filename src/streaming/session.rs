//! Session tokens
//!
//! Every asynchronous operation is tagged with the token that was current
//! when it started. Starting a new session of the same kind invalidates the
//! previous token, so late results can be recognized and dropped.

use std::fmt;

/// Identifies one generation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues tokens for one kind of operation and remembers the latest.
#[derive(Debug, Clone, Default)]
pub struct SessionCounter {
    next: u64,
    current: Option<SessionToken>,
}

impl SessionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session, invalidating the previous one.
    pub fn begin(&mut self) -> SessionToken {
        self.next += 1;
        let token = SessionToken(self.next);
        self.current = Some(token);
        token
    }

    /// Invalidate the current session without starting another.
    pub fn cancel(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<SessionToken> {
        self.current
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.current == Some(token)
    }
}
