//! Streaming assembly of generated content
//!
//! Session tokens for cancellation and the throttled assembler that merges
//! text fragments into the document.

mod assembler;
mod session;

pub use assembler::{StreamAssembler, StreamEnd};
pub use session::{SessionCounter, SessionToken};
