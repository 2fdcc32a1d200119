use crate::error::ConfigError;
use crate::rules::{HeadingMatcher, Rule, RuleKind};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

pub const SUPPORTED_VERSION: i64 = 1;

// Default value functions for serde
fn default_max_len() -> i64 {
    80
}

fn default_true() -> bool {
    true
}

fn default_leading_title_max_len() -> i64 {
    20
}

/// A pattern in the rules file: either a bare string or `{pattern, flags}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Plain(String),
    Detailed {
        pattern: String,
        #[serde(default)]
        flags: Option<String>,
    },
}

impl PatternSpec {
    pub fn pattern(&self) -> &str {
        match self {
            PatternSpec::Plain(p) => p,
            PatternSpec::Detailed { pattern, .. } => pattern,
        }
    }

    pub fn flags(&self) -> Option<&str> {
        match self {
            PatternSpec::Plain(_) => None,
            PatternSpec::Detailed { flags, .. } => flags.as_deref(),
        }
    }

    pub fn compile(&self) -> Result<Regex, ConfigError> {
        if self.pattern().is_empty() {
            return Err(ConfigError::InvalidHeading(
                "pattern must be a non-empty string".to_string(),
            ));
        }
        compile_pattern(self.pattern(), self.flags())
    }
}

/// The `heading` section as written in the file, before validation.
#[derive(Debug, Clone, Deserialize)]
struct HeadingSection {
    strict_chapter_title: Option<PatternSpec>,
    generic_heading: Option<PatternSpec>,
    other_headings: Option<Value>,
    #[serde(default = "default_max_len")]
    max_len: i64,
    #[serde(default = "default_true")]
    digit_only: bool,
    #[serde(default)]
    skip_leading_titles: i64,
    #[serde(default = "default_leading_title_max_len")]
    leading_title_max_len: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Fail on malformed rule entries instead of skipping them.
    pub strict: bool,
}

impl LoadOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Everything the cleaner needs, parsed once and reused across documents.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    pub rules: Vec<Rule>,
    pub headings: HeadingMatcher,
}

impl CleanConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_from_file_with(path, LoadOptions::default())
    }

    /// `.json` files are read as JSON, anything else as YAML.
    pub fn load_from_file_with(
        path: impl AsRef<Path>,
        options: LoadOptions,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content, options)
        } else {
            Self::from_yaml_str(&content, options)
        }
    }

    pub fn from_json_str(content: &str, options: LoadOptions) -> Result<Self, ConfigError> {
        let data: Value = serde_json::from_str(content)?;
        Self::from_value(&data, options)
    }

    pub fn from_yaml_str(content: &str, options: LoadOptions) -> Result<Self, ConfigError> {
        let data: Value = serde_yaml::from_str(content)?;
        Self::from_value(&data, options)
    }

    pub fn from_value(data: &Value, options: LoadOptions) -> Result<Self, ConfigError> {
        let Some(root) = data.as_object() else {
            return Err(ConfigError::Parse("rules file must be an object".to_string()));
        };
        let rules = parse_rules(root, options)?;
        let heading = root.get("heading").ok_or(ConfigError::MissingHeading)?;
        let headings = parse_heading_matcher(heading)?;
        log::debug!(
            "loaded {} rules, strict chapter title {:?}",
            rules.len(),
            headings.strict_chapter_title.as_str()
        );
        Ok(Self { rules, headings })
    }
}

/// Builds a regex from a pattern and a flag string over `{i, m, s}`.
pub fn compile_pattern(pattern: &str, flags: Option<&str>) -> Result<Regex, ConfigError> {
    let mut builder = RegexBuilder::new(pattern);
    for ch in flags.unwrap_or_default().chars() {
        match ch {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            other => return Err(ConfigError::InvalidFlag(other)),
        };
    }
    builder.build().map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Parses the `version` and `rules` keys.
///
/// Non-object entries and entries without a usable pattern are skipped
/// unless `options.strict` is set. Bad flags, bad regexes and unknown kinds
/// are always fatal.
pub fn parse_rules(root: &Map<String, Value>, options: LoadOptions) -> Result<Vec<Rule>, ConfigError> {
    if let Some(version) = root.get("version") {
        if version.as_i64() != Some(SUPPORTED_VERSION) {
            return Err(ConfigError::UnsupportedVersion(version.to_string()));
        }
    }

    let entries = match root.get("rules") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(ConfigError::Parse("rules must be a list".to_string())),
    };

    let mut rules = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        match parse_rule_entry(entry)? {
            Ok(rule) => rules.push(rule),
            Err(reason) if options.strict => {
                return Err(ConfigError::InvalidRule { index, reason });
            }
            Err(reason) => {
                log::warn!("skipping rule entry #{index}: {reason}");
            }
        }
    }
    Ok(rules)
}

/// Outer error is fatal; inner `Err` is a skippable malformed entry.
fn parse_rule_entry(entry: &Value) -> Result<Result<Rule, String>, ConfigError> {
    let Some(obj) = entry.as_object() else {
        return Ok(Err("entry is not an object".to_string()));
    };

    let (pattern, nested_flags) = match obj.get("pattern") {
        Some(Value::String(p)) if !p.is_empty() => (p.clone(), None),
        Some(Value::Object(inner)) => match inner.get("pattern") {
            Some(Value::String(p)) if !p.is_empty() => {
                (p.clone(), flags_field(inner, "pattern.flags")?)
            }
            _ => return Ok(Err("missing pattern".to_string())),
        },
        _ => return Ok(Err("missing pattern".to_string())),
    };

    let kind = match text_field(obj, "kind") {
        Some(kind) => kind.parse::<RuleKind>()?,
        None => RuleKind::Drop,
    };
    let flags = match nested_flags {
        Some(flags) => Some(flags),
        None => flags_field(obj, "flags")?,
    };
    let regex = compile_pattern(&pattern, flags.as_deref())?;

    let name = text_field(obj, "name").unwrap_or_else(|| "rule".to_string());
    let mut rule = Rule::new(&name, kind, regex);
    if let Some(bucket) = text_field(obj, "bucket") {
        rule = rule.with_bucket(&bucket);
    }
    if let Some(replacement) = text_field(obj, "replacement") {
        rule = rule.with_replacement(&replacement);
    }
    Ok(Ok(rule))
}

/// Non-empty scalar rendered as text. Null, empty strings and containers
/// count as absent, so defaults apply.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flags_field(obj: &Map<String, Value>, label: &str) -> Result<Option<String>, ConfigError> {
    match obj.get("flags") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ConfigError::Parse(format!("{label} must be a string"))),
    }
}

pub fn parse_heading_matcher(data: &Value) -> Result<HeadingMatcher, ConfigError> {
    if !data.is_object() {
        return Err(ConfigError::InvalidHeading("\"heading\" must be an object".to_string()));
    }
    let section = HeadingSection::deserialize(data)
        .map_err(|e| ConfigError::InvalidHeading(e.to_string()))?;

    if section.max_len <= 0 {
        return Err(ConfigError::InvalidHeading(
            "max_len must be a positive integer".to_string(),
        ));
    }
    if section.skip_leading_titles < 0 {
        return Err(ConfigError::InvalidHeading(
            "skip_leading_titles must be a non-negative integer".to_string(),
        ));
    }
    if section.leading_title_max_len <= 0 {
        return Err(ConfigError::InvalidHeading(
            "leading_title_max_len must be a positive integer".to_string(),
        ));
    }

    let (Some(strict), Some(generic), Some(others)) = (
        section.strict_chapter_title,
        section.generic_heading,
        section.other_headings,
    ) else {
        return Err(ConfigError::InvalidHeading(
            "heading must include \"strict_chapter_title\", \"generic_heading\", and \"other_headings\""
                .to_string(),
        ));
    };
    let Value::Array(others) = others else {
        return Err(ConfigError::InvalidHeading(
            "other_headings must be a list".to_string(),
        ));
    };

    let other_headings = others
        .iter()
        .map(|entry| {
            PatternSpec::deserialize(entry)
                .map_err(|_| {
                    ConfigError::InvalidHeading(
                        "pattern entry must be a string or object".to_string(),
                    )
                })?
                .compile()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut matcher = HeadingMatcher::new(strict.compile()?, generic.compile()?);
    matcher.other_headings = other_headings;
    matcher.max_len = section.max_len as usize;
    matcher.digit_only = section.digit_only;
    matcher.skip_leading_titles = section.skip_leading_titles as usize;
    matcher.leading_title_max_len = section.leading_title_max_len as usize;
    Ok(matcher)
}
