//! Article preview module for Draftsmith
//!
//! Renders the parsed block sequence of the current article, including
//! generated images decoded into egui textures.

mod render;

pub use render::{render_blocks, show_texture, ArticleColors, TextureCache};
