//! Source Preprocessors
//!
//! This module provides the preprocessing layer for turning source documents
//! into the single raw text block the cleaning core consumes.
//!
//! ## Architecture
//!
//! ```text
//! Document (EPUB, HTML, TXT)
//!     ↓
//! [Format-specific Preprocessor]
//!     ↓
//! raw text (content sections in reading order)
//!     ↓
//! [clean_text]
//!     ↓
//! CleanResult
//! ```
//!
//! ## Available Preprocessors
//!
//! - `EpubPreprocessor` - EPUB 2/3 containers, spine order, XHTML content
//! - `HtmlPreprocessor` - standalone HTML/XHTML files
//! - `PlainTextPreprocessor` - everything else, read as UTF-8

pub mod epub;
pub mod html_text;
pub mod plain_text;
pub mod preprocessor;

use std::path::Path;

pub use epub::EpubPreprocessor;
pub use html_text::{html_to_text, HtmlPreprocessor};
pub use plain_text::PlainTextPreprocessor;
pub use preprocessor::Preprocessor;

/// Picks the preprocessor for `path` by file extension.
pub fn preprocessor_for(path: &Path) -> Box<dyn Preprocessor> {
    let candidates: [Box<dyn Preprocessor>; 2] = [Box::new(EpubPreprocessor), Box::new(HtmlPreprocessor)];
    candidates
        .into_iter()
        .find(|p| p.supports_file_type(path))
        .unwrap_or_else(|| Box::new(PlainTextPreprocessor))
}
