//! Generation collaborator
//!
//! The [`GenerationService`] port, request types and prompt building, retry
//! with backoff, response parsing, an offline [`ScriptedGenerator`], and the
//! background worker that runs service calls off the UI thread.

mod error;
mod request;
mod response;
mod retry;
mod scripted;
mod service;
mod worker;

pub use error::GenerationError;
pub use request::{
    ArticleLength, AspectRatio, EditRequest, GenerationConfig, ImageRequest, ImageSize, Tone,
};
pub use retry::RetryPolicy;
pub use scripted::{decode_data_uri, ScriptedGenerator};
pub use service::GenerationService;
pub use worker::{
    GenerationEvent, GenerationJob, GenerationWorker, ImageTarget, RepaintCallback,
};
