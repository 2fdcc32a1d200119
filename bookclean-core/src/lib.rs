// Bookclean Core Library
//
// Provides book text cleaning with pluggable preprocessor architecture.
// Main interface for turning EPUB/HTML/TXT books into clean body text
// plus an audit trail of everything the rules removed.

pub mod config;
pub mod error;
pub mod normalize;
pub mod preprocessors;
pub mod processor;
pub mod rules;
pub mod segmenter;
pub mod types;

// Re-export main types and functions for easy use
pub use config::{CleanConfig, LoadOptions};
pub use error::ConfigError;
pub use normalize::normalize_text;
pub use preprocessors::{preprocessor_for, Preprocessor};
pub use processor::{clean_text, DocumentProcessor, StageTimer};
pub use rules::{HeadingMatcher, Rule, RuleKind};
pub use types::*;
