// Preprocessor abstraction for source documents
//
// This module defines the boundary between source-format handling
// (EPUB, HTML, plain text -> one raw text block) and the cleaning core
// (raw text -> CleanResult). Everything after this point is format-agnostic.

use anyhow::{Context, Result};
use std::path::Path;

/// Preprocessor trait - converts a source document into raw text
///
/// Preprocessors handle:
/// - Container parsing and content ordering (EPUB spine)
/// - Markup stripping, with block structure reduced to line breaks
///
/// The returned text is the concatenation, in document order, of the
/// plain-text renderings of the document's content sections.
pub trait Preprocessor {
    /// Convert document bytes to raw text
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;

    /// Convenience method: Process from file path
    fn process_file(&self, input: &Path) -> Result<String> {
        let bytes = std::fs::read(input)
            .with_context(|| format!("Failed to read input: {}", input.display()))?;
        self.extract_text(&bytes)
            .with_context(|| format!("{} preprocessor failed on {}", self.name(), input.display()))
    }

    /// Get preprocessor name for debugging/logging
    fn name(&self) -> &str;

    /// Check if preprocessor supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}
