//! Article Export Module for Draftsmith
//!
//! # Supported Export Formats
//!
//! - **Markdown File**: The article text as written
//! - **HTML File**: Complete HTML document with inlined theme CSS and the cover image
//! - **Clipboard**: Rendered HTML with markdown as the plain-text alternative
//!
//! # Architecture
//!
//! - `options.rs` - Export formats and file naming
//! - `html.rs` - HTML document generation with theme styling
//! - `clipboard.rs` - Platform clipboard operations

pub mod clipboard;
pub mod html;
pub mod options;

pub use clipboard::copy_article_to_clipboard;
pub use options::{suggested_file_name, ExportFormat};

use html::generate_html_document;

use crate::config::{write_atomic, Theme};
use crate::document::Document;
use crate::error::Result;
use log::info;
use std::path::Path;

/// Write a document to `path` in the given file format.
///
/// Clipboard is not a file format; it is handled by [`copy_article_to_clipboard`].
pub fn export_to_file(
    document: &Document,
    format: ExportFormat,
    theme: Theme,
    path: &Path,
) -> Result<()> {
    let contents = match format {
        ExportFormat::Markdown => document.text.clone(),
        ExportFormat::Html => {
            let title = document.title();
            generate_html_document(
                &document.text,
                title.as_deref(),
                document.images.selected(),
                theme,
            )
        }
        ExportFormat::Clipboard => {
            return Err(crate::error::Error::Validation(
                "Clipboard export has no file".to_string(),
            ))
        }
    };
    write_atomic(path, &contents)?;
    info!("Exported {} to {}", format.label(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ImageRef;

    #[test]
    fn test_export_markdown_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        let doc = Document::with_text("# Tea\n\nGreen.");
        export_to_file(&doc, ExportFormat::Markdown, Theme::Light, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Tea\n\nGreen.");
    }

    #[test]
    fn test_export_html_file_with_cover() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.html");
        let mut doc = Document::with_text("# Tea\n\nGreen.");
        doc.images
            .set_all(vec![ImageRef::new("data:image/png;base64,AA==", "leaves")]);
        export_to_file(&doc, ExportFormat::Html, Theme::Light, &path).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<title>Tea</title>"));
        assert!(html.contains("class=\"cover\""));
    }

    #[test]
    fn test_clipboard_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::new();
        assert!(export_to_file(
            &doc,
            ExportFormat::Clipboard,
            Theme::Light,
            &dir.path().join("x")
        )
        .is_err());
    }
}
