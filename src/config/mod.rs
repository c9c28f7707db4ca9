//! Settings model and its JSON file
//!
//! `settings` holds the serde types; `persistence` finds the per-user
//! directory and reads and writes `settings.json`.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
