//! Persisted preferences
//!
//! Everything the user can change in the Settings screen, plus the window
//! geometry remembered between runs. Unknown or missing keys fall back to
//! defaults so older settings files keep loading.

use crate::document::clamp_image_count;
use crate::generation::{ArticleLength, AspectRatio, GenerationConfig, ImageSize, Tone};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Theme
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    /// Follow the OS preference
    System,
}

impl Theme {
    pub fn label(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::System => "System",
        }
    }

    pub fn all() -> &'static [Theme] {
        &[Theme::Light, Theme::Dark, Theme::System]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Edit Mode
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the article workspace shows rendered blocks or raw markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Preview,
    Editing,
}

impl EditMode {
    pub fn toggle(&self) -> Self {
        match self {
            EditMode::Preview => EditMode::Editing,
            EditMode::Editing => EditMode::Preview,
        }
    }

    pub fn is_editing(&self) -> bool {
        *self == EditMode::Editing
    }

    pub fn label(&self) -> &'static str {
        match self {
            EditMode::Preview => "Preview",
            EditMode::Editing => "Edit",
        }
    }

    /// Toolbar glyph
    pub fn icon(&self) -> &'static str {
        match self {
            EditMode::Preview => "👁",
            EditMode::Editing => "📝",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Window Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// Last known size of the main window, in logical points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub maximized: bool,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            maximized: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Contents of `settings.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    /// Mode a freshly generated article opens in
    pub default_edit_mode: EditMode,
    /// Point size shared by the preview and the raw editor
    pub font_size: f32,

    // Seeds for the generation form
    pub default_tone: Tone,
    pub default_length: ArticleLength,
    /// Cover images per generation, 1..=5
    pub default_image_count: usize,
    pub default_aspect_ratio: AspectRatio,
    pub default_image_size: ImageSize,

    /// Save the draft after every applied change
    pub auto_save: bool,
    /// History entries kept before the oldest is dropped
    pub max_history: usize,

    pub window_size: WindowSize,

    pub last_export_directory: Option<PathBuf>,
    /// Launch the exported file with the system handler
    pub open_after_export: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            default_edit_mode: EditMode::Preview,
            font_size: 14.0,
            default_tone: Tone::default(),
            default_length: ArticleLength::default(),
            default_image_count: 3,
            default_aspect_ratio: AspectRatio::default(),
            default_image_size: ImageSize::default(),
            auto_save: true,
            max_history: 50,
            window_size: WindowSize::default(),
            last_export_directory: None,
            open_after_export: false,
        }
    }
}

impl Settings {
    pub const MIN_FONT_SIZE: f32 = 8.0;
    pub const MAX_FONT_SIZE: f32 = 72.0;
    pub const MIN_HISTORY: usize = 1;
    pub const MAX_HISTORY: usize = 500;
    const WINDOW_EDGE: RangeInclusive<f32> = 200.0..=10000.0;

    /// Pull every numeric field back into its allowed range.
    ///
    /// Hand-edited files can carry anything; the rest of the app assumes
    /// these bounds hold.
    pub fn sanitize(&mut self) {
        self.font_size = self.font_size.clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE);
        self.default_image_count = clamp_image_count(self.default_image_count);
        self.max_history = self.max_history.clamp(Self::MIN_HISTORY, Self::MAX_HISTORY);

        let edge = Self::WINDOW_EDGE;
        let window = &mut self.window_size;
        window.width = window.width.clamp(*edge.start(), *edge.end());
        window.height = window.height.clamp(*edge.start(), *edge.end());
    }

    /// Deserialize, then `sanitize`.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(|mut settings| {
            settings.sanitize();
            settings
        })
    }

    /// A blank generation form carrying the user's defaults.
    pub fn new_generation_config(&self, language: &str) -> GenerationConfig {
        GenerationConfig {
            tone: self.default_tone,
            length: self.default_length,
            language: language.to_string(),
            image_count: clamp_image_count(self.default_image_count),
            aspect_ratio: self.default_aspect_ratio,
            image_size: self.default_image_size,
            ..GenerationConfig::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.theme, Theme::Light);
        assert_eq!(s.default_edit_mode, EditMode::Preview);
        assert_eq!(s.default_image_count, 3);
        assert_eq!(s.max_history, 50);
        assert!(s.auto_save);
        assert!(!s.window_size.maximized);
    }

    #[test]
    fn test_enums_use_lowercase_names() {
        assert_eq!(serde_json::to_value(Theme::System).unwrap(), "system");
        assert_eq!(serde_json::to_value(EditMode::Editing).unwrap(), "editing");
        let mode: EditMode = serde_json::from_str("\"preview\"").unwrap();
        assert_eq!(mode, EditMode::Preview);
    }

    #[test]
    fn test_edit_mode_toggle() {
        assert_eq!(EditMode::Preview.toggle(), EditMode::Editing);
        assert_eq!(EditMode::Editing.toggle(), EditMode::Preview);
        assert!(EditMode::Editing.is_editing());
        assert!(!EditMode::Preview.is_editing());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let s: Settings = serde_json::from_str(r#"{"default_tone": "casual"}"#).unwrap();
        assert_eq!(s.default_tone, Tone::Casual);
        assert_eq!(s.theme, Theme::Light);
        assert_eq!(s.font_size, 14.0);

        let empty: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Settings::default());
    }

    #[test]
    fn test_settings_survive_json() {
        let s = Settings {
            theme: Theme::Dark,
            default_tone: Tone::Humorous,
            default_aspect_ratio: AspectRatio::Portrait,
            last_export_directory: Some(PathBuf::from("/tmp/out")),
            ..Settings::default()
        };
        let back: Settings = serde_json::from_str(&serde_json::to_string(&s).unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_sanitize_clamps_every_field() {
        let mut s = Settings {
            font_size: 300.0,
            default_image_count: 0,
            max_history: 10_000,
            window_size: WindowSize {
                width: 10.0,
                height: 99_999.0,
                maximized: true,
            },
            ..Settings::default()
        };
        s.sanitize();
        assert_eq!(s.font_size, Settings::MAX_FONT_SIZE);
        assert_eq!(s.default_image_count, 1);
        assert_eq!(s.max_history, Settings::MAX_HISTORY);
        assert_eq!(s.window_size.width, 200.0);
        assert_eq!(s.window_size.height, 10000.0);
        assert!(s.window_size.maximized);
    }

    #[test]
    fn test_from_json_sanitized_caps_image_count() {
        let s = Settings::from_json_sanitized(r#"{"default_image_count": 12}"#).unwrap();
        assert_eq!(s.default_image_count, 5);
        assert!(Settings::from_json_sanitized("{").is_err());
        assert!(Settings::from_json_sanitized("42").is_err());
    }

    #[test]
    fn test_new_generation_config_uses_defaults() {
        let s = Settings {
            default_tone: Tone::Casual,
            default_image_count: 2,
            ..Settings::default()
        };
        let config = s.new_generation_config("Spanish");
        assert_eq!(config.tone, Tone::Casual);
        assert_eq!(config.image_count, 2);
        assert_eq!(config.language, "Spanish");
        assert!(config.topic.is_empty());
    }
}
