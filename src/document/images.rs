//! Generated image set with a tracked selection.

use crate::error::{Error, Result};
use log::warn;
use serde::{Deserialize, Serialize};

/// Upper bound on images requested or kept per set.
pub const MAX_IMAGES: usize = 5;

/// Lower bound on images requested per call.
pub const MIN_IMAGES: usize = 1;

/// Clamp a requested image count into `[MIN_IMAGES, MAX_IMAGES]`.
pub fn clamp_image_count(requested: usize) -> usize {
    requested.clamp(MIN_IMAGES, MAX_IMAGES)
}

// ─────────────────────────────────────────────────────────────────────────────
// ImageRef
// ─────────────────────────────────────────────────────────────────────────────

/// A generated image, addressable by a transport-encoded URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Usually `data:<mime>;base64,<payload>`
    pub data_uri: String,
    /// The prompt that produced this image
    pub prompt: String,
}

impl ImageRef {
    pub fn new(data_uri: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            data_uri: data_uri.into(),
            prompt: prompt.into(),
        }
    }

    /// Build a data URI from a MIME type and an already base64-encoded payload.
    pub fn from_base64(mime_type: &str, data: &str, prompt: impl Into<String>) -> Self {
        Self::new(format!("data:{};base64,{}", mime_type, data), prompt)
    }

    /// MIME type declared in the data URI, if any.
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.data_uri.strip_prefix("data:")?;
        let end = rest.find([';', ','])?;
        Some(&rest[..end])
    }

    /// Short alt text derived from the prompt, used when inserting markdown.
    pub fn alt_text(&self) -> String {
        let alt: String = self
            .prompt
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | '\n'))
            .take(60)
            .collect();
        let alt = alt.trim();
        if alt.is_empty() {
            "image".to_string()
        } else {
            alt.to_string()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ImageSet
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered candidate images with at most one selected.
///
/// `selected` is `Some(i)` with `i < images.len()` whenever the set is
/// non-empty, and `None` when it is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    images: Vec<ImageRef>,
    selected: Option<usize>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set. Selection resets to the first image.
    pub fn set_all(&mut self, mut images: Vec<ImageRef>) {
        if images.len() > MAX_IMAGES {
            warn!(
                "Received {} images, keeping the first {}",
                images.len(),
                MAX_IMAGES
            );
            images.truncate(MAX_IMAGES);
        }
        self.selected = if images.is_empty() { None } else { Some(0) };
        self.images = images;
    }

    /// Replace a single slot. The selection is left alone.
    pub fn replace_at(&mut self, index: usize, image: ImageRef) -> Result<()> {
        let len = self.images.len();
        match self.images.get_mut(index) {
            Some(slot) => {
                *slot = image;
                Ok(())
            }
            None => Err(Error::ImageIndexOutOfRange { index, len }),
        }
    }

    /// Select an image. Fails without changing state if `index` is invalid.
    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.images.len() {
            return Err(Error::ImageIndexOutOfRange {
                index,
                len: self.images.len(),
            });
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Move the selection forward, wrapping around.
    pub fn select_next(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some((i + 1) % self.images.len());
        }
    }

    /// Move the selection backward, wrapping around.
    pub fn select_previous(&mut self) {
        if let Some(i) = self.selected {
            let len = self.images.len();
            self.selected = Some((i + len - 1) % len);
        }
    }

    pub fn clear(&mut self) {
        self.set_all(Vec::new());
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&ImageRef> {
        self.selected.and_then(|i| self.images.get(i))
    }

    pub fn get(&self, index: usize) -> Option<&ImageRef> {
        self.images.get(index)
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Rebuild a set from persisted parts, repairing an invalid selection.
    pub fn from_parts(images: Vec<ImageRef>, selected: Option<usize>) -> Self {
        let mut set = Self::new();
        set.set_all(images);
        if let Some(index) = selected {
            let _ = set.select(index);
        }
        set
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn images(n: usize) -> Vec<ImageRef> {
        (0..n)
            .map(|i| ImageRef::new(format!("data:image/png;base64,{}", i), format!("p{}", i)))
            .collect()
    }

    fn assert_selection_valid(set: &ImageSet) {
        match set.selected_index() {
            Some(i) => assert!(i < set.len()),
            None => assert!(set.is_empty()),
        }
    }

    #[test]
    fn test_clamp_image_count() {
        assert_eq!(clamp_image_count(7), 5);
        assert_eq!(clamp_image_count(0), 1);
        assert_eq!(clamp_image_count(3), 3);
    }

    #[test]
    fn test_set_all_resets_selection() {
        let mut set = ImageSet::new();
        set.set_all(images(3));
        set.select(2).unwrap();
        set.set_all(images(2));
        assert_eq!(set.selected_index(), Some(0));

        set.set_all(Vec::new());
        assert_eq!(set.selected_index(), None);
        assert_selection_valid(&set);
    }

    #[test]
    fn test_set_all_truncates_to_max() {
        let mut set = ImageSet::new();
        set.set_all(images(8));
        assert_eq!(set.len(), MAX_IMAGES);
    }

    #[test]
    fn test_select_in_range_and_out_of_range() {
        for k in 1..=5 {
            let mut set = ImageSet::new();
            set.set_all(images(k));
            for i in 0..k {
                set.select(i).unwrap();
                assert_eq!(set.selected_index(), Some(i));
            }
            let before = set.clone();
            let err = set.select(k).unwrap_err();
            assert!(matches!(err, Error::ImageIndexOutOfRange { index, len } if index == k && len == k));
            assert_eq!(set, before);
        }
    }

    #[test]
    fn test_select_on_empty_set_fails() {
        let mut set = ImageSet::new();
        assert!(set.select(0).is_err());
        assert_selection_valid(&set);
    }

    #[test]
    fn test_replace_at_changes_only_that_slot() {
        let mut set = ImageSet::new();
        set.set_all(images(4));
        set.select(3).unwrap();

        let replacement = ImageRef::new("data:image/png;base64,new", "edited");
        set.replace_at(1, replacement.clone()).unwrap();

        let original = images(4);
        assert_eq!(set.get(0), Some(&original[0]));
        assert_eq!(set.get(1), Some(&replacement));
        assert_eq!(set.get(2), Some(&original[2]));
        assert_eq!(set.get(3), Some(&original[3]));
        assert_eq!(set.selected_index(), Some(3));
    }

    #[test]
    fn test_replace_at_out_of_range() {
        let mut set = ImageSet::new();
        set.set_all(images(2));
        let before = set.clone();
        assert!(set.replace_at(2, ImageRef::new("x", "y")).is_err());
        assert_eq!(set, before);
    }

    #[test]
    fn test_select_next_and_previous_wrap() {
        let mut set = ImageSet::new();
        set.set_all(images(3));
        set.select_previous();
        assert_eq!(set.selected_index(), Some(2));
        set.select_next();
        assert_eq!(set.selected_index(), Some(0));

        let mut empty = ImageSet::new();
        empty.select_next();
        assert_eq!(empty.selected_index(), None);
    }

    #[test]
    fn test_from_parts_repairs_selection() {
        let set = ImageSet::from_parts(images(2), Some(9));
        assert_eq!(set.selected_index(), Some(0));
        let set = ImageSet::from_parts(images(2), Some(1));
        assert_eq!(set.selected_index(), Some(1));
    }

    #[test]
    fn test_image_ref_helpers() {
        let image = ImageRef::from_base64("image/png", "AAAA", "A [red] fox\nat dusk");
        assert_eq!(image.data_uri, "data:image/png;base64,AAAA");
        assert_eq!(image.mime_type(), Some("image/png"));
        assert_eq!(image.alt_text(), "A red foxat dusk");
        assert_eq!(ImageRef::new("x", "  ").alt_text(), "image");
    }
}
