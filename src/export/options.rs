//! Export formats and file naming.

use serde::{Deserialize, Serialize};

/// Supported export targets for an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Raw markdown file
    #[default]
    Markdown,
    /// Standalone HTML file with inline styles
    Html,
    /// Rich copy to the clipboard
    Clipboard,
}

impl ExportFormat {
    /// Get the display label for this format.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "Markdown File",
            ExportFormat::Html => "HTML File",
            ExportFormat::Clipboard => "Copy to Clipboard",
        }
    }

    /// Get the file extension for this format (if applicable).
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ExportFormat::Markdown => Some("md"),
            ExportFormat::Html => Some("html"),
            ExportFormat::Clipboard => None,
        }
    }

    /// Get an icon for this format.
    pub fn icon(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "📄",
            ExportFormat::Html => "🌐",
            ExportFormat::Clipboard => "📋",
        }
    }

    /// Get all available export formats.
    pub fn all() -> &'static [ExportFormat] {
        &[
            ExportFormat::Markdown,
            ExportFormat::Html,
            ExportFormat::Clipboard,
        ]
    }
}

/// File name for an exported article: a slug of the title plus extension.
pub fn suggested_file_name(title: &str, extension: &str) -> String {
    let mut slug = String::new();
    for c in title.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.chars().count() >= 60 {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "article" } else { slug };
    format!("{}.{}", slug, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_extensions() {
        assert_eq!(ExportFormat::Markdown.extension(), Some("md"));
        assert_eq!(ExportFormat::Html.extension(), Some("html"));
        assert_eq!(ExportFormat::Clipboard.extension(), None);
        assert_eq!(ExportFormat::all().len(), 3);
    }

    #[test]
    fn test_suggested_file_name() {
        assert_eq!(
            suggested_file_name("Home Composting: A Guide!", "md"),
            "home-composting-a-guide.md"
        );
        assert_eq!(suggested_file_name("  ", "html"), "article.html");
        assert_eq!(suggested_file_name("Ærlig talt", "md"), "ærlig-talt.md");
    }
}
