//! Generation service trait definition
//!
//! The single seam between the authoring core and whatever produces text
//! and images. The desktop shell runs against [`ScriptedGenerator`]; a
//! network-backed implementation only has to implement this trait.
//!
//! [`ScriptedGenerator`]: super::ScriptedGenerator

use super::error::GenerationResult;
use super::request::{EditRequest, GenerationConfig, ImageRequest};
use crate::document::ImageRef;
use futures::stream::BoxStream;

/// A stream of article text fragments, in delivery order.
pub type FragmentStream = BoxStream<'static, GenerationResult<String>>;

/// Collaborator that produces article text and images.
#[async_trait::async_trait]
pub trait GenerationService: Send + Sync {
    /// Get service name
    fn name(&self) -> &str;

    /// Open a text stream for an article.
    ///
    /// An error from this call means the stream never started; errors inside
    /// the stream end it after some fragments may already have arrived.
    async fn stream_text(&self, config: &GenerationConfig) -> GenerationResult<FragmentStream>;

    /// Generate up to `request.count` images. Zero images is a valid result.
    async fn generate_images(&self, request: &ImageRequest) -> GenerationResult<Vec<ImageRef>>;

    /// Modify one image according to an instruction and optional mask.
    async fn edit_image(&self, request: &EditRequest) -> GenerationResult<ImageRef>;

    /// Pick a short keyword describing a passage of text.
    async fn extract_keyword(&self, text: &str) -> GenerationResult<String>;

    /// Suggest keywords for a topic within a category.
    async fn suggest_keywords(&self, topic: &str, category: &str)
        -> GenerationResult<Vec<String>>;

    /// Produce a short originality report for an article.
    async fn analyze_originality(&self, text: &str) -> GenerationResult<String>;
}
