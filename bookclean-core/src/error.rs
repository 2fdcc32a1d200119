// Configuration errors
//
// Everything that can go wrong while turning a rule file into `Rule`s and a
// `HeadingMatcher`. The text pipeline itself never fails, so this is the only
// typed error in the crate; preprocessors use anyhow with context instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules file: {0}")]
    Parse(String),

    #[error("unsupported rules version: {0}")]
    UnsupportedVersion(String),

    #[error("unsupported regex flag: {0:?}")]
    InvalidFlag(char),

    #[error("invalid regex pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("missing required \"heading\" section in rules file")]
    MissingHeading,

    #[error("invalid heading config: {0}")]
    InvalidHeading(String),

    #[error("invalid rule entry #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    #[error("unknown rule kind: {0:?}")]
    UnknownKind(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
