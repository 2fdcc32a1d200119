//! Markup to plain text
//!
//! Strips tags from (X)HTML content documents and reduces block structure to
//! line breaks, which the normalizer later turns into paragraphs. Script,
//! style and head content is dropped. Parsing goes through html5ever, so
//! malformed markup (stray `<`, unclosed or mismatched tags) is repaired
//! rather than truncated, and every HTML5 named entity is decoded.

use super::preprocessor::Preprocessor;
use anyhow::Result;
use scraper::node::Node;
use scraper::{ElementRef, Html};
use std::path::Path;

const BLOCK_TAGS: [&str; 19] = [
    "p", "div", "br", "hr", "li", "ul", "ol", "table", "tr", "td", "th", "h1", "h2", "h3", "h4",
    "h5", "h6", "blockquote", "pre",
];

/// Block tags that never have content; they emit a single break.
const VOID_BLOCK_TAGS: [&str; 2] = ["br", "hr"];

const IGNORED_TAGS: [&str; 3] = ["script", "style", "head"];

pub fn html_to_text(html_bytes: &[u8]) -> String {
    let markup = String::from_utf8_lossy(html_bytes);
    let document = Html::parse_document(&markup);
    if !document.errors.is_empty() {
        log::debug!("recovered from {} markup errors", document.errors.len());
    }

    let mut chunks = String::with_capacity(markup.len() / 2);
    collect_text(document.root_element(), &mut chunks);
    chunks
}

fn collect_text(element: ElementRef<'_>, chunks: &mut String) {
    let tag = element.value().name();
    if IGNORED_TAGS.contains(&tag) {
        return;
    }
    if VOID_BLOCK_TAGS.contains(&tag) {
        chunks.push('\n');
        return;
    }

    let block = BLOCK_TAGS.contains(&tag);
    if block {
        chunks.push('\n');
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => chunks.push_str(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, chunks);
                }
            }
            _ => {}
        }
    }
    if block {
        chunks.push('\n');
    }
}

/// Preprocessor for standalone HTML/XHTML files.
pub struct HtmlPreprocessor;

impl Preprocessor for HtmlPreprocessor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        Ok(html_to_text(bytes))
    }

    fn name(&self) -> &str {
        "html"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "html" | "htm" | "xhtml"))
            .unwrap_or(false)
    }
}
