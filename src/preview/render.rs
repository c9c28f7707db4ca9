//! Read-only article rendering
//!
//! Draws the block sequence from the markdown parser with egui widgets.
//! Images embedded as `data:` URIs are decoded once and cached as textures;
//! anything else is shown as its alt text.

use crate::config::Theme;
use crate::generation::decode_data_uri;
use crate::markdown::{HeadingLevel, InlineRun, ParsedBlock};
use eframe::egui::{self, Color32, ColorImage, RichText, TextureHandle, Ui};
use image::GenericImageView;
use log::{debug, warn};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

// ─────────────────────────────────────────────────────────────────────────────
// Theme Colors
// ─────────────────────────────────────────────────────────────────────────────

/// Theme-aware colors for the article preview.
#[derive(Debug, Clone)]
pub struct ArticleColors {
    pub text: Color32,
    pub heading: Color32,
    pub strong: Color32,
    pub muted: Color32,
    pub list_marker: Color32,
}

impl ArticleColors {
    pub fn from_theme(theme: Theme, visuals: &egui::Visuals) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
            Theme::System => {
                if visuals.dark_mode {
                    Self::dark()
                } else {
                    Self::light()
                }
            }
        }
    }

    pub fn dark() -> Self {
        Self {
            text: Color32::from_rgb(220, 220, 220),
            heading: Color32::from_rgb(100, 180, 255),
            strong: Color32::from_rgb(245, 245, 245),
            muted: Color32::from_rgb(150, 150, 150),
            list_marker: Color32::from_rgb(150, 150, 150),
        }
    }

    pub fn light() -> Self {
        Self {
            text: Color32::from_rgb(30, 30, 30),
            heading: Color32::from_rgb(0, 100, 180),
            strong: Color32::from_rgb(0, 0, 0),
            muted: Color32::from_rgb(100, 100, 100),
            list_marker: Color32::from_rgb(100, 100, 100),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Image Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Decode a `data:` URI into pixels egui can upload.
pub fn decode_image(uri: &str) -> Option<ColorImage> {
    let bytes = decode_data_uri(uri)?;
    let image = match image::load_from_memory(&bytes) {
        Ok(image) => image,
        Err(e) => {
            warn!("Failed to decode embedded image: {}", e);
            return None;
        }
    };
    let (width, height) = image.dimensions();
    let rgba = image.to_rgba8();
    Some(ColorImage::from_rgba_unmultiplied(
        [width as usize, height as usize],
        rgba.as_raw(),
    ))
}

/// Uploaded textures keyed by image URI.
///
/// Failed decodes are cached too, so a broken image is not retried each frame.
#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<u64, Option<TextureHandle>>,
}

impl TextureCache {
    const MAX_ENTRIES: usize = 64;

    pub fn new() -> Self {
        Self::default()
    }

    fn key(uri: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        uri.hash(&mut hasher);
        hasher.finish()
    }

    /// Texture for `uri`, decoding and uploading it on first use.
    pub fn get_or_load(&mut self, ctx: &egui::Context, uri: &str) -> Option<TextureHandle> {
        let key = Self::key(uri);
        if !self.textures.contains_key(&key) {
            if self.textures.len() >= Self::MAX_ENTRIES {
                debug!("Texture cache full, clearing");
                self.textures.clear();
            }
            let texture = decode_image(uri).map(|image| {
                ctx.load_texture(
                    format!("article-image-{:x}", key),
                    image,
                    egui::TextureOptions::LINEAR,
                )
            });
            self.textures.insert(key, texture);
        }
        self.textures.get(&key).cloned().flatten()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Draw a texture scaled to fit `max_width`, keeping its aspect ratio.
pub fn show_texture(ui: &mut Ui, texture: &TextureHandle, max_width: f32) -> egui::Response {
    let size = texture.size_vec2();
    let scale = if size.x > max_width {
        max_width / size.x
    } else {
        1.0
    };
    let image = egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture))
        .fit_to_exact_size(size * scale);
    ui.add(image)
}

/// Render parsed blocks top to bottom.
pub fn render_blocks(
    ui: &mut Ui,
    blocks: &[ParsedBlock],
    textures: &mut TextureCache,
    colors: &ArticleColors,
    font_size: f32,
) {
    for (index, block) in blocks.iter().enumerate() {
        match block {
            ParsedBlock::Heading { level, text } => {
                let (scale, margin) = match level {
                    HeadingLevel::H1 => (1.8, 8.0),
                    HeadingLevel::H2 => (1.5, 6.0),
                    HeadingLevel::H3 => (1.3, 4.0),
                };
                ui.add_space(margin);
                ui.label(
                    RichText::new(text)
                        .size(font_size * scale)
                        .strong()
                        .color(colors.heading),
                );
            }
            ParsedBlock::Paragraph(runs) => {
                render_runs(ui, runs, colors, font_size);
                ui.add_space(font_size * 0.5);
            }
            ParsedBlock::List(items) => {
                for item in items {
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing.x = 0.0;
                        ui.label(
                            RichText::new("  •  ")
                                .size(font_size)
                                .color(colors.list_marker),
                        );
                        runs_inline(ui, item, colors, font_size);
                    });
                }
                ui.add_space(font_size * 0.5);
            }
            ParsedBlock::Table { headers, rows } => {
                egui::Grid::new(ui.id().with("table").with(index))
                    .striped(true)
                    .spacing([16.0, 6.0])
                    .show(ui, |ui| {
                        for cell in headers {
                            ui.label(RichText::new(cell).size(font_size).strong());
                        }
                        ui.end_row();
                        for row in rows {
                            for cell in row {
                                ui.label(RichText::new(cell).size(font_size).color(colors.text));
                            }
                            ui.end_row();
                        }
                    });
                ui.add_space(font_size * 0.5);
            }
            ParsedBlock::Image { url, alt } => {
                let max_width = ui.available_width().min(720.0);
                match textures.get_or_load(ui.ctx(), url) {
                    Some(texture) => {
                        show_texture(ui, &texture, max_width).on_hover_text(alt);
                    }
                    None => {
                        ui.label(
                            RichText::new(format!("🖼 {}", alt))
                                .italics()
                                .color(colors.muted),
                        );
                    }
                }
                ui.add_space(font_size * 0.5);
            }
        }
    }
}

fn render_runs(ui: &mut Ui, runs: &[InlineRun], colors: &ArticleColors, font_size: f32) {
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        runs_inline(ui, runs, colors, font_size);
    });
}

fn runs_inline(ui: &mut Ui, runs: &[InlineRun], colors: &ArticleColors, font_size: f32) {
    for run in runs {
        let text = match run {
            InlineRun::PlainText(text) => RichText::new(text).color(colors.text),
            InlineRun::Bold(text) => RichText::new(text).strong().color(colors.strong),
        };
        ui.label(text.size(font_size));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_data_uri(width: u32, height: u32) -> String {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes.into_inner())
        )
    }

    #[test]
    fn test_decode_png_data_uri() {
        let image = decode_image(&png_data_uri(4, 3)).unwrap();
        assert_eq!(image.size, [4, 3]);
        assert_eq!(image.pixels[0], Color32::from_rgb(10, 20, 30));
    }

    #[test]
    fn test_decode_rejects_non_images() {
        assert!(decode_image("http://x/y.png").is_none());
        assert!(decode_image("data:image/png;base64,AAAA").is_none());
    }

    #[test]
    fn test_cache_remembers_failures() {
        let ctx = egui::Context::default();
        let mut cache = TextureCache::new();
        assert!(cache.get_or_load(&ctx, "http://x/y.png").is_none());
        assert!(cache.get_or_load(&ctx, "http://x/y.png").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_colors_follow_visuals_for_system_theme() {
        let dark = ArticleColors::from_theme(Theme::System, &egui::Visuals::dark());
        assert_eq!(dark.text, ArticleColors::dark().text);
        let light = ArticleColors::from_theme(Theme::System, &egui::Visuals::light());
        assert_eq!(light.text, ArticleColors::light().text);
    }
}
