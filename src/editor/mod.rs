//! Editor module for Draftsmith
//!
//! Edit-mode state for the article workspace and the statistics shown in
//! its status line.

mod mode;
mod stats;

pub use mode::EditModeController;
pub use stats::TextStats;
