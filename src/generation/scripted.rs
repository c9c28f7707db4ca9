//! Offline generation service
//!
//! Produces a deterministic article and flat-colour PNG images from the
//! request alone. Every reply is shaped like a `candidates[].content.parts[]`
//! response and read back through the same parsers a network client uses,
//! so a reply without usable data is dropped exactly as it would be there.
//! Failure knobs make it usable as a test double for the overload,
//! mid-stream failure and image shortfall paths.

use super::error::{GenerationError, GenerationResult};
use super::request::{EditRequest, GenerationConfig, ImageRequest};
use super::response::{parse_image_response, parse_text_response};
use super::service::{FragmentStream, GenerationService};
use crate::document::ImageRef;
use base64::Engine;
use futures::stream::{self, StreamExt};
use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};
use log::debug;
use serde_json::{json, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Placeholders are this many times smaller than the requested resolution.
const PLACEHOLDER_SCALE: u32 = 8;

/// A [`GenerationService`] that never touches the network.
#[derive(Debug)]
pub struct ScriptedGenerator {
    fragment_delay: Duration,
    article: Option<String>,
    fail_after: Option<usize>,
    overloaded_calls: AtomicU32,
    image_limit: Option<usize>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            fragment_delay: Duration::from_millis(15),
            article: None,
            fail_after: None,
            overloaded_calls: AtomicU32::new(0),
            image_limit: None,
        }
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_overload(&self) -> GenerationResult<()> {
        let remaining = self
            .overloaded_calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match remaining {
            Ok(_) => Err(GenerationError::Overloaded),
            Err(_) => Ok(()),
        }
    }
}

#[cfg(test)]
impl ScriptedGenerator {
    /// Pause between streamed fragments.
    pub fn with_fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = delay;
        self
    }

    /// Stream this text instead of a synthesized article.
    pub fn with_article(mut self, article: impl Into<String>) -> Self {
        self.article = Some(article.into());
        self
    }

    /// End every text stream with a network error after `fragments` fragments.
    pub fn failing_after(mut self, fragments: usize) -> Self {
        self.fail_after = Some(fragments);
        self
    }

    /// Answer the next `calls` service calls with `Overloaded`.
    pub fn overloaded_for(self, calls: u32) -> Self {
        self.overloaded_calls.store(calls, Ordering::SeqCst);
        self
    }

    /// Answer image slots past `limit` with a text-only refusal.
    pub fn with_image_limit(mut self, limit: usize) -> Self {
        self.image_limit = Some(limit);
        self
    }
}

#[async_trait::async_trait]
impl GenerationService for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_text(&self, config: &GenerationConfig) -> GenerationResult<FragmentStream> {
        self.check_overload()?;
        debug!("Prompt: {}", config.article_prompt());

        let article = self
            .article
            .clone()
            .unwrap_or_else(|| synthesize_article(config));
        let mut chunks: Vec<GenerationResult<Value>> = split_fragments(&article)
            .into_iter()
            .map(|fragment| Ok(text_reply(&fragment)))
            .collect();
        if let Some(limit) = self.fail_after {
            chunks.truncate(limit);
            chunks.push(Err(GenerationError::Network(
                "connection reset by peer".to_string(),
            )));
        }
        debug!("Scripted stream of {} chunks", chunks.len());

        let delay = self.fragment_delay;
        let stream = stream::iter(chunks).then(move |chunk| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let chunk = chunk?;
            parse_text_response(&chunk).ok_or_else(|| {
                GenerationError::InvalidResponse("stream chunk without text".to_string())
            })
        });
        Ok(stream.boxed())
    }

    async fn generate_images(&self, request: &ImageRequest) -> GenerationResult<Vec<ImageRef>> {
        self.check_overload()?;

        let edge = request.size.long_edge() / PLACEHOLDER_SCALE;
        let (width, height) = request.aspect_ratio.dimensions(edge);
        let mut images = Vec::with_capacity(request.count);
        for i in 0..request.count {
            let reply = match self.image_limit {
                Some(limit) if i >= limit => text_reply("I can't draw that one."),
                _ => {
                    let data = render_png(width, height, seed_for(&request.prompt, i as u64))?;
                    image_reply("image/png", &data)
                }
            };
            match parse_image_response(&reply, &request.prompt) {
                Some(image) => images.push(image),
                None => debug!("Image slot {} came back without image data", i),
            }
        }
        Ok(images)
    }

    async fn edit_image(&self, request: &EditRequest) -> GenerationResult<ImageRef> {
        self.check_overload()?;

        let bytes = decode_data_uri(&request.image.data_uri).ok_or_else(|| {
            GenerationError::InvalidRequest("image is not a base64 data URI".to_string())
        })?;
        let source = image::load_from_memory(&bytes)
            .map_err(|e| GenerationError::InvalidRequest(e.to_string()))?;
        let (width, height) = source.dimensions();
        let prompt = format!("{} ({})", request.image.prompt, request.instruction.trim());
        let data = render_png(width, height, seed_for(&prompt, 0))?;
        parse_image_response(&image_reply("image/png", &data), &prompt).ok_or_else(|| {
            GenerationError::InvalidResponse("edit reply without image data".to_string())
        })
    }

    async fn extract_keyword(&self, text: &str) -> GenerationResult<String> {
        self.check_overload()?;
        let keyword = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| word.chars().count() > 3)
            .max_by_key(|word| word.chars().count())
            .map(|word| word.to_lowercase())
            .unwrap_or_default();
        read_text(&text_reply(&keyword), "no keyword found")
    }

    async fn suggest_keywords(
        &self,
        topic: &str,
        category: &str,
    ) -> GenerationResult<Vec<String>> {
        self.check_overload()?;
        let topic = topic.trim().to_lowercase();
        if topic.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "topic must not be empty".to_string(),
            ));
        }
        let mut keywords = vec![
            topic.clone(),
            format!("{} guide", topic),
            format!("{} tips", topic),
        ];
        let category = category.trim().to_lowercase();
        if !category.is_empty() {
            keywords.push(format!("{} {}", category, topic));
        }
        let reply = read_text(&text_reply(&keywords.join("\n")), "no keywords")?;
        Ok(reply.lines().map(str::to_string).collect())
    }

    async fn analyze_originality(&self, text: &str) -> GenerationResult<String> {
        self.check_overload()?;
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return Ok("Nothing to analyze yet.".to_string());
        }
        let unique: std::collections::HashSet<&str> = words.iter().map(String::as_str).collect();
        let ratio = unique.len() as f32 / words.len() as f32;
        let verdict = if ratio > 0.6 {
            "varied vocabulary, low risk of repetition"
        } else if ratio > 0.4 {
            "some repeated phrasing"
        } else {
            "heavily repetitive wording"
        };
        let report = format!(
            "Originality score: {:.0}% ({} unique of {} words): {}.",
            ratio * 100.0,
            unique.len(),
            words.len(),
            verdict
        );
        read_text(&text_reply(&report), "empty originality report")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Replies
// ─────────────────────────────────────────────────────────────────────────────

fn text_reply(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

fn image_reply(mime_type: &str, data: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [
        { "text": "Here is your image." },
        { "inlineData": { "mimeType": mime_type, "data": data } }
    ] } }] })
}

fn read_text(reply: &Value, missing: &str) -> GenerationResult<String> {
    parse_text_response(reply).ok_or_else(|| GenerationError::InvalidResponse(missing.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Split text into word-sized fragments whose concatenation is the input.
pub fn split_fragments(text: &str) -> Vec<String> {
    text.split_inclusive(char::is_whitespace)
        .map(str::to_string)
        .collect()
}

fn synthesize_article(config: &GenerationConfig) -> String {
    let topic = config.topic.trim();
    let keywords = config.clean_keywords();
    let focus = keywords.first().copied().unwrap_or(topic);

    let mut article = format!("# {}\n\n", topic);
    article.push_str(&format!(
        "This {} piece looks at **{}** and what it means in practice.\n\n",
        config.tone.label().to_lowercase(),
        topic
    ));
    article.push_str("## Key points\n\n");
    article.push_str(&format!("- Why **{}** matters\n", focus));
    article.push_str("- Where to start\n");
    article.push_str("- Common mistakes to avoid\n\n");

    article.push_str("## In depth\n\n");
    // One paragraph per 250 target words, cycling through the keywords
    for n in 0..config.length.target_words() / 250 {
        let subject = keywords
            .get(n % keywords.len().max(1))
            .copied()
            .unwrap_or(focus);
        article.push_str(&format!(
            "Part {} of the story is about {}. Small, steady steps beat one big push.\n\n",
            n + 1,
            subject
        ));
    }

    article.push_str("## At a glance\n\n");
    article.push_str("| Aspect | Notes |\n|---|---|\n");
    article.push_str(&format!("| Language | {} |\n", config.language.trim()));
    article.push_str(&format!("| Length | {} |\n\n", config.length.label()));
    article.push_str("### Conclusion\n\n");
    article.push_str(&format!(
        "A little preparation goes a long way with {}.\n",
        topic
    ));
    article
}

fn seed_for(prompt: &str, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    prompt.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// Render a two-tone gradient and return it as base64-encoded PNG.
fn render_png(width: u32, height: u32, seed: u64) -> GenerationResult<String> {
    let [r, g, b, ..] = seed.to_le_bytes();
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let shade = ((x + y) * 255 / (width + height).max(1)) as u8;
        Rgba([r / 2 + shade / 2, g / 2 + shade / 4, b / 2, 255])
    });

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| GenerationError::Api(format!("failed to encode image: {}", e)))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Decode the payload of a `data:<mime>;base64,<data>` URI.
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    base64::engine::general_purpose::STANDARD.decode(data).ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::request::{ArticleLength, AspectRatio, ImageSize};

    fn config(topic: &str) -> GenerationConfig {
        GenerationConfig {
            topic: topic.to_string(),
            ..Default::default()
        }
    }

    async fn collect(stream: FragmentStream) -> Vec<GenerationResult<String>> {
        stream.collect().await
    }

    #[test]
    fn test_split_fragments_concatenates_to_input() {
        let text = "# Title\n\nSome  words\there.";
        let fragments = split_fragments(text);
        assert!(fragments.len() > 3);
        assert_eq!(fragments.concat(), text);
    }

    #[test]
    fn test_synthesized_article_parses_into_all_block_kinds() {
        use crate::markdown::{parse_blocks, ParsedBlock};
        let blocks = parse_blocks(&synthesize_article(&config("Sourdough")));
        assert!(blocks.iter().any(|b| matches!(b, ParsedBlock::Heading { .. })));
        assert!(blocks.iter().any(|b| matches!(b, ParsedBlock::List(items) if items.len() == 3)));
        assert!(blocks.iter().any(|b| matches!(b, ParsedBlock::Table { rows, .. } if rows.len() == 2)));
    }

    #[test]
    fn test_article_grows_with_requested_length() {
        let mut cfg = config("Beekeeping");
        cfg.keywords = vec!["hives".to_string(), "honey".to_string()];
        cfg.length = ArticleLength::Short;
        let short = synthesize_article(&cfg);
        cfg.length = ArticleLength::Long;
        let long = synthesize_article(&cfg);

        assert_eq!(short.matches("Part ").count(), 2);
        assert_eq!(long.matches("Part ").count(), 8);
        assert!(long.contains("Part 2 of the story is about honey."));
    }

    #[test]
    fn test_replies_round_trip_through_parsers() {
        assert_eq!(read_text(&text_reply("hi"), "x").unwrap(), "hi");
        assert!(matches!(
            read_text(&text_reply(""), "nothing"),
            Err(GenerationError::InvalidResponse(_))
        ));
        let image = parse_image_response(&image_reply("image/png", "aGk="), "p").unwrap();
        assert_eq!(image.data_uri, "data:image/png;base64,aGk=");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_text_yields_article() {
        let generator = ScriptedGenerator::new().with_article("one two three");
        let fragments = collect(generator.stream_text(&config("x")).await.unwrap()).await;
        let text: String = fragments.into_iter().map(Result::unwrap).collect();
        assert_eq!(text, "one two three");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_text_fails_midway() {
        let generator = ScriptedGenerator::new()
            .with_article("one two three")
            .failing_after(2);
        let fragments = collect(generator.stream_text(&config("x")).await.unwrap()).await;
        assert_eq!(fragments.len(), 3);
        assert!(matches!(fragments[2], Err(GenerationError::Network(_))));
    }

    #[tokio::test]
    async fn test_overload_counts_down() {
        let generator = ScriptedGenerator::new().overloaded_for(2);
        let request = ImageRequest::new("p", ImageSize::OneK, AspectRatio::Square, 1);
        assert_eq!(
            generator.generate_images(&request).await.unwrap_err(),
            GenerationError::Overloaded
        );
        assert!(generator.generate_images(&request).await.is_err());
        assert_eq!(generator.generate_images(&request).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_images_respects_count_and_limit() {
        let request = ImageRequest::new("a fox", ImageSize::OneK, AspectRatio::Landscape, 3);
        let images = ScriptedGenerator::new().generate_images(&request).await.unwrap();
        assert_eq!(images.len(), 3);
        assert!(images.iter().all(|i| i.mime_type() == Some("image/png")));
        assert_ne!(images[0], images[1]);

        let limited = ScriptedGenerator::new().with_image_limit(1);
        assert_eq!(limited.generate_images(&request).await.unwrap().len(), 1);

        let none = ScriptedGenerator::new().with_image_limit(0);
        assert!(none.generate_images(&request).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_image_keeps_dimensions() {
        let generator = ScriptedGenerator::new();
        let request = ImageRequest::new("a fox", ImageSize::OneK, AspectRatio::Portrait, 1);
        let original = generator.generate_images(&request).await.unwrap().remove(0);

        let edited = generator
            .edit_image(&EditRequest {
                image: original.clone(),
                instruction: "make it night".to_string(),
                mask: None,
            })
            .await
            .unwrap();
        assert_ne!(edited, original);
        assert!(edited.prompt.contains("make it night"));

        let before = image::load_from_memory(&decode_data_uri(&original.data_uri).unwrap()).unwrap();
        let after = image::load_from_memory(&decode_data_uri(&edited.data_uri).unwrap()).unwrap();
        assert_eq!(before.dimensions(), after.dimensions());
    }

    #[tokio::test]
    async fn test_edit_image_rejects_non_data_uri() {
        let result = ScriptedGenerator::new()
            .edit_image(&EditRequest {
                image: ImageRef::new("http://x/y.png", "p"),
                instruction: "brighter".to_string(),
                mask: None,
            })
            .await;
        assert!(matches!(result, Err(GenerationError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_keyword_helpers() {
        let generator = ScriptedGenerator::new();
        assert_eq!(
            generator.extract_keyword("The fermentation of dough").await.unwrap(),
            "fermentation"
        );
        assert!(generator.extract_keyword("a b").await.is_err());

        let suggested = generator.suggest_keywords("Bread", "Food").await.unwrap();
        assert_eq!(suggested[0], "bread");
        assert!(suggested.contains(&"food bread".to_string()));
    }

    #[tokio::test]
    async fn test_analyze_originality() {
        let generator = ScriptedGenerator::new();
        let report = generator.analyze_originality("one two three four").await.unwrap();
        assert!(report.starts_with("Originality score: 100%"));
        let repetitive = generator.analyze_originality("la la la la la").await.unwrap();
        assert!(repetitive.contains("heavily repetitive"));
    }

    #[test]
    fn test_decode_data_uri() {
        assert_eq!(decode_data_uri("data:image/png;base64,aGk="), Some(b"hi".to_vec()));
        assert_eq!(decode_data_uri("data:image/png,hi"), None);
        assert_eq!(decode_data_uri("http://x"), None);
    }
}
