//! Generation requests: article configuration and prompt construction.

use crate::document::{clamp_image_count, ImageRef};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Tone
// ─────────────────────────────────────────────────────────────────────────────

/// Writing tone requested for the article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Informative,
    Persuasive,
    Humorous,
}

impl Tone {
    pub fn label(&self) -> &'static str {
        match self {
            Tone::Professional => "Professional",
            Tone::Casual => "Casual",
            Tone::Informative => "Informative",
            Tone::Persuasive => "Persuasive",
            Tone::Humorous => "Humorous",
        }
    }

    pub fn all() -> &'static [Tone] {
        &[
            Tone::Professional,
            Tone::Casual,
            Tone::Informative,
            Tone::Persuasive,
            Tone::Humorous,
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Article Length
// ─────────────────────────────────────────────────────────────────────────────

/// Target article length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArticleLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl ArticleLength {
    pub fn label(&self) -> &'static str {
        match self {
            ArticleLength::Short => "Short",
            ArticleLength::Medium => "Medium",
            ArticleLength::Long => "Long",
        }
    }

    /// Approximate word target passed to the prompt.
    pub fn target_words(&self) -> usize {
        match self {
            ArticleLength::Short => 500,
            ArticleLength::Medium => 1000,
            ArticleLength::Long => 2000,
        }
    }

    pub fn all() -> &'static [ArticleLength] {
        &[ArticleLength::Short, ArticleLength::Medium, ArticleLength::Long]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Image Hints
// ─────────────────────────────────────────────────────────────────────────────

/// Aspect ratio hint for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:4")]
    Tall,
}

impl AspectRatio {
    /// The ratio string sent to the service.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Standard => "4:3",
            AspectRatio::Tall => "3:4",
        }
    }

    /// Width and height for a given long edge.
    pub fn dimensions(&self, long_edge: u32) -> (u32, u32) {
        let (w, h) = match self {
            AspectRatio::Square => (1, 1),
            AspectRatio::Landscape => (16, 9),
            AspectRatio::Portrait => (9, 16),
            AspectRatio::Standard => (4, 3),
            AspectRatio::Tall => (3, 4),
        };
        if w >= h {
            (long_edge, long_edge * h / w)
        } else {
            (long_edge * w / h, long_edge)
        }
    }

    pub fn all() -> &'static [AspectRatio] {
        &[
            AspectRatio::Square,
            AspectRatio::Landscape,
            AspectRatio::Portrait,
            AspectRatio::Standard,
            AspectRatio::Tall,
        ]
    }
}

/// Resolution hint for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }

    pub fn long_edge(&self) -> u32 {
        match self {
            ImageSize::OneK => 1024,
            ImageSize::TwoK => 2048,
            ImageSize::FourK => 4096,
        }
    }

    pub fn all() -> &'static [ImageSize] {
        &[ImageSize::OneK, ImageSize::TwoK, ImageSize::FourK]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generation Config
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the user fills in before generating an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub topic: String,
    pub tone: Tone,
    pub length: ArticleLength,
    pub language: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub image_count: usize,
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            tone: Tone::default(),
            length: ArticleLength::default(),
            language: String::from("English"),
            category: String::new(),
            keywords: Vec::new(),
            image_count: 1,
            aspect_ratio: AspectRatio::default(),
            image_size: ImageSize::default(),
        }
    }
}

impl GenerationConfig {
    /// Reject input that must never reach the service.
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(Error::Validation("Topic must not be empty".to_string()));
        }
        if self.language.trim().is_empty() {
            return Err(Error::Validation("Language must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn clamped_image_count(&self) -> usize {
        clamp_image_count(self.image_count)
    }

    /// Keywords with blanks removed and surrounding whitespace trimmed.
    pub fn clean_keywords(&self) -> Vec<&str> {
        self.keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect()
    }

    /// Prompt for the article body.
    pub fn article_prompt(&self) -> String {
        let mut prompt = format!(
            "Write a {} article of about {} words in {} about \"{}\".",
            self.tone.label().to_lowercase(),
            self.length.target_words(),
            self.language.trim(),
            self.topic.trim()
        );
        if !self.category.trim().is_empty() {
            prompt.push_str(&format!(" Category: {}.", self.category.trim()));
        }
        let keywords = self.clean_keywords();
        if !keywords.is_empty() {
            prompt.push_str(&format!(" Work in these keywords: {}.", keywords.join(", ")));
        }
        prompt.push_str(
            " Format the result as markdown using #, ## and ### headings, \
             paragraphs, '- ' bullet lists, **bold** emphasis and pipe tables where useful.",
        );
        prompt
    }

    /// Prompt for the cover image set.
    pub fn cover_image_prompt(&self) -> String {
        let mut prompt = format!(
            "A {} editorial illustration for an article about {}",
            self.tone.label().to_lowercase(),
            self.topic.trim()
        );
        if !self.category.trim().is_empty() {
            prompt.push_str(&format!(" in the {} category", self.category.trim()));
        }
        prompt.push_str(". No text in the image.");
        prompt
    }

    /// Request for the cover image set.
    pub fn image_request(&self) -> ImageRequest {
        ImageRequest {
            prompt: self.cover_image_prompt(),
            size: self.image_size,
            aspect_ratio: self.aspect_ratio,
            count: self.clamped_image_count(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Image Requests
// ─────────────────────────────────────────────────────────────────────────────

/// A request for one or more images from a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: ImageSize,
    pub aspect_ratio: AspectRatio,
    /// Always within `[1, 5]` once built through [`ImageRequest::new`]
    pub count: usize,
}

impl ImageRequest {
    pub fn new(
        prompt: impl Into<String>,
        size: ImageSize,
        aspect_ratio: AspectRatio,
        count: usize,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            size,
            aspect_ratio,
            count: clamp_image_count(count),
        }
    }
}

/// A request to modify an existing image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub image: ImageRef,
    pub instruction: String,
    /// Optional mask as a data URI; painted areas are the ones to change
    pub mask: Option<String>,
}

impl EditRequest {
    pub fn validate(&self) -> Result<()> {
        if self.instruction.trim().is_empty() {
            return Err(Error::Validation(
                "Edit instruction must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config(topic: &str) -> GenerationConfig {
        GenerationConfig {
            topic: topic.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_rejects_empty_topic() {
        assert!(matches!(config("   ").validate(), Err(Error::Validation(_))));
        assert!(config("Rust").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_language() {
        let mut cfg = config("Rust");
        cfg.language = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_clamped_image_count() {
        let mut cfg = config("x");
        cfg.image_count = 7;
        assert_eq!(cfg.clamped_image_count(), 5);
        cfg.image_count = 0;
        assert_eq!(cfg.clamped_image_count(), 1);
        assert_eq!(cfg.image_request().count, 1);
    }

    #[test]
    fn test_article_prompt_includes_settings() {
        let cfg = GenerationConfig {
            topic: " Home composting ".to_string(),
            tone: Tone::Casual,
            length: ArticleLength::Short,
            language: "Norwegian".to_string(),
            category: "Garden".to_string(),
            keywords: vec!["soil".to_string(), "  ".to_string(), " worms".to_string()],
            ..Default::default()
        };
        let prompt = cfg.article_prompt();
        assert!(prompt.contains("casual article of about 500 words in Norwegian"));
        assert!(prompt.contains("\"Home composting\""));
        assert!(prompt.contains("Category: Garden."));
        assert!(prompt.contains("keywords: soil, worms."));
    }

    #[test]
    fn test_cover_prompt_without_category() {
        let prompt = config("Tea").cover_image_prompt();
        assert!(prompt.contains("about Tea."));
        assert!(!prompt.contains("category"));
    }

    #[test]
    fn test_image_request_new_clamps() {
        let req = ImageRequest::new("p", ImageSize::TwoK, AspectRatio::Square, 12);
        assert_eq!(req.count, 5);
    }

    #[test]
    fn test_aspect_ratio_serialization_and_dimensions() {
        assert_eq!(
            serde_json::to_string(&AspectRatio::Landscape).unwrap(),
            "\"16:9\""
        );
        assert_eq!(AspectRatio::Landscape.dimensions(1024), (1024, 576));
        assert_eq!(AspectRatio::Portrait.dimensions(1024), (576, 1024));
        assert_eq!(AspectRatio::Square.dimensions(512), (512, 512));
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let cfg: GenerationConfig = serde_json::from_str(r#"{"topic": "Bees"}"#).unwrap();
        assert_eq!(cfg.topic, "Bees");
        assert_eq!(cfg.language, "English");
        assert_eq!(cfg.tone, Tone::Professional);
    }

    #[test]
    fn test_edit_request_validation() {
        let req = EditRequest {
            image: ImageRef::new("data:x", "p"),
            instruction: " ".to_string(),
            mask: None,
        };
        assert!(req.validate().is_err());
    }
}
