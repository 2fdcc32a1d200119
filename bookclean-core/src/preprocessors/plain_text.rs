use super::preprocessor::Preprocessor;
use anyhow::Result;
use std::path::Path;

/// Fallback for anything that isn't a container or markup: bytes are text.
pub struct PlainTextPreprocessor;

impl Preprocessor for PlainTextPreprocessor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn name(&self) -> &str {
        "text"
    }

    fn supports_file_type(&self, _path: &Path) -> bool {
        true
    }
}
