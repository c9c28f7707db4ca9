//! HTML Export Generation
//!
//! Builds a standalone HTML document from the same block sequence the
//! preview renders, so both show identical structure. Styles are inlined;
//! images stay as data URIs, so the file has no external references.

use crate::config::Theme;
use crate::document::ImageRef;
use crate::markdown::{parse_blocks, InlineRun, ParsedBlock};
use std::fmt::Write as _;

// ─────────────────────────────────────────────────────────────────────────────
// HTML Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Generate a complete HTML document from article markdown.
///
/// `cover` is placed above the article body when present.
pub fn generate_html_document(
    markdown: &str,
    title: Option<&str>,
    cover: Option<&ImageRef>,
    theme: Theme,
) -> String {
    let body = generate_html_fragment(markdown);
    let cover_html = cover
        .map(|image| {
            format!(
                "        <img class=\"cover\" src=\"{}\" alt=\"{}\">\n",
                html_escape(&image.data_uri),
                html_escape(&image.alt_text())
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="Draftsmith">
    <title>{title}</title>
    <style>
{base_css}
{theme_css}
    </style>
</head>
<body>
    <article class="article">
{cover}{body}
    </article>
</body>
</html>"#,
        title = html_escape(title.unwrap_or("Untitled article")),
        base_css = BASE_CSS,
        theme_css = theme_css(theme),
        cover = cover_html,
        body = body,
    )
}

/// Generate an HTML fragment (no doctype or head) for the clipboard.
pub fn generate_html_fragment(markdown: &str) -> String {
    blocks_to_html(&parse_blocks(markdown))
}

/// Render blocks one element each, in order.
pub fn blocks_to_html(blocks: &[ParsedBlock]) -> String {
    let mut html = String::new();
    for block in blocks {
        match block {
            ParsedBlock::Heading { level, text } => {
                let n = level.as_u8();
                let _ = writeln!(html, "<h{n}>{}</h{n}>", html_escape(text));
            }
            ParsedBlock::Paragraph(runs) => {
                let _ = writeln!(html, "<p>{}</p>", runs_to_html(runs));
            }
            ParsedBlock::List(items) => {
                html.push_str("<ul>\n");
                for item in items {
                    let _ = writeln!(html, "  <li>{}</li>", runs_to_html(item));
                }
                html.push_str("</ul>\n");
            }
            ParsedBlock::Table { headers, rows } => {
                html.push_str("<table>\n  <thead>\n    <tr>");
                for cell in headers {
                    let _ = write!(html, "<th>{}</th>", html_escape(cell));
                }
                html.push_str("</tr>\n  </thead>\n  <tbody>\n");
                for row in rows {
                    html.push_str("    <tr>");
                    for cell in row {
                        let _ = write!(html, "<td>{}</td>", html_escape(cell));
                    }
                    html.push_str("</tr>\n");
                }
                html.push_str("  </tbody>\n</table>\n");
            }
            ParsedBlock::Image { url, alt } => {
                let _ = writeln!(
                    html,
                    "<figure><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>",
                    html_escape(url),
                    html_escape(alt),
                    html_escape(alt)
                );
            }
        }
    }
    html
}

fn runs_to_html(runs: &[InlineRun]) -> String {
    runs.iter()
        .map(|run| match run {
            InlineRun::PlainText(text) => html_escape(text),
            InlineRun::Bold(text) => format!("<strong>{}</strong>", html_escape(text)),
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// CSS Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Base CSS for article layout and typography.
const BASE_CSS: &str = r#"
*, *::before, *::after {
    box-sizing: border-box;
}

body {
    margin: 0;
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
    font-size: 17px;
    line-height: 1.65;
}

.article {
    max-width: 760px;
    margin: 0 auto;
    padding: 40px 24px;
}

.article .cover {
    width: 100%;
    border-radius: 8px;
    margin-bottom: 24px;
}

.article h1, .article h2, .article h3 {
    margin: 28px 0 14px;
    line-height: 1.25;
    font-weight: 650;
}

.article h1 { font-size: 2.1em; }
.article h2 { font-size: 1.5em; border-bottom: 1px solid; padding-bottom: 0.25em; }
.article h3 { font-size: 1.2em; }

.article p, .article ul, .article table, .article figure {
    margin: 0 0 18px;
}

.article ul { padding-left: 1.6em; }
.article li + li { margin-top: 4px; }

.article table {
    border-collapse: collapse;
    width: 100%;
}

.article th, .article td {
    padding: 8px 12px;
    border: 1px solid;
    text-align: left;
}

.article figure img {
    max-width: 100%;
    border-radius: 6px;
}

.article figcaption {
    font-size: 0.85em;
    opacity: 0.7;
}
"#;

fn theme_css(theme: Theme) -> String {
    let (background, text, border, header) = match theme {
        Theme::Dark => ("#1e1f22", "#dcdde0", "#3a3c42", "#2a2c31"),
        Theme::Light | Theme::System => ("#ffffff", "#1f2328", "#d0d7de", "#f6f8fa"),
    };
    format!(
        "body {{ background: {background}; color: {text}; }}\n\
         .article h2, .article th, .article td {{ border-color: {border}; }}\n\
         .article th {{ background: {header}; }}"
    )
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>\"&'"), "&lt;b&gt;&quot;&amp;&#39;");
    }

    #[test]
    fn test_fragment_block_semantics() {
        let html = generate_html_fragment(
            "# Title\n\nSome **bold** text\n\n- one\n- **two**\n\n| A | B |\n|---|---|\n| 1 | 2 |\n\n![a cat](http://x/y.png)",
        );
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<p>Some <strong>bold</strong> text</p>"));
        assert!(html.contains("<li>one</li>"));
        assert!(html.contains("<li><strong>two</strong></li>"));
        assert!(html.contains("<th>A</th><th>B</th>"));
        assert!(html.contains("<td>1</td><td>2</td>"));
        assert!(html.contains("<img src=\"http://x/y.png\" alt=\"a cat\">"));
    }

    #[test]
    fn test_single_row_table_is_dropped() {
        let html = generate_html_fragment("| A | B |");
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = generate_html_fragment("<script>alert(1)</script>");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_document_structure() {
        let cover = ImageRef::new("data:image/png;base64,AA==", "Cover art");
        let html = generate_html_document("# Hi", Some("A & B"), Some(&cover), Theme::Dark);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("<style>"));
        assert!(html.contains("#1e1f22"));
        assert!(html.contains("class=\"cover\" src=\"data:image/png;base64,AA==\""));
        assert!(html.contains("<h1>Hi</h1>"));
    }

    #[test]
    fn test_document_without_title_or_cover() {
        let html = generate_html_document("", None, None, Theme::Light);
        assert!(html.contains("<title>Untitled article</title>"));
        assert!(!html.contains("class=\"cover\""));
    }
}
