use crate::error::ConfigError;
use crate::types::Match;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// What a rule does to a sentence its pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Sentence disappears; no later rule runs.
    Drop,
    /// Sentence is suppressed (becomes empty) but recorded for inspection.
    Extract,
    /// Every match is substituted with the rule's replacement.
    Replace,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Drop => "drop",
            RuleKind::Extract => "extract",
            RuleKind::Replace => "replace",
        }
    }

    /// Bucket used when a rule entry doesn't name one.
    pub fn default_bucket(&self) -> &'static str {
        match self {
            RuleKind::Extract => "solicitation",
            RuleKind::Drop | RuleKind::Replace => "noise",
        }
    }
}

impl FromStr for RuleKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop" => Ok(RuleKind::Drop),
            "extract" => Ok(RuleKind::Extract),
            "replace" => Ok(RuleKind::Replace),
            other => Err(ConfigError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compiled rule. Immutable once loaded; safe to share between runs.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    pub pattern: Regex,
    pub bucket: String,
    /// Only meaningful for `Replace`. Uses `$1` / `${name}` group references.
    pub replacement: String,
}

impl Rule {
    pub fn new(name: &str, kind: RuleKind, pattern: Regex) -> Self {
        Self {
            name: name.to_string(),
            kind,
            pattern,
            bucket: kind.default_bucket().to_string(),
            replacement: String::new(),
        }
    }

    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.bucket = bucket.to_string();
        self
    }

    pub fn with_replacement(mut self, replacement: &str) -> Self {
        self.replacement = replacement.to_string();
        self
    }

    /// Applies this rule to `text`.
    ///
    /// Returns the new value (`None` when dropped) and the audit record if the
    /// pattern matched. Empty text passes through untested.
    pub fn apply(&self, text: &str) -> (Option<String>, Option<Match>) {
        if text.is_empty() || !self.pattern.is_match(text) {
            return (Some(text.to_string()), None);
        }

        let audit = Match::new(&self.name, &self.bucket, text);
        let value = match self.kind {
            RuleKind::Drop => None,
            RuleKind::Extract => Some(String::new()),
            RuleKind::Replace => Some(
                self.pattern
                    .replace_all(text, self.replacement.as_str())
                    .into_owned(),
            ),
        };
        (value, Some(audit))
    }
}

/// Runs `rules` in order over one sentence.
///
/// Stops as soon as a `Drop` fires. Every rule that matched contributes a
/// `Match`, in firing order.
pub fn apply_rules(sentence: &str, rules: &[Rule]) -> (Option<String>, Vec<Match>) {
    let mut matches = Vec::new();
    let mut current = Some(sentence.to_string());

    for rule in rules {
        let Some(text) = current.as_deref() else {
            break;
        };
        let (next, hit) = rule.apply(text);
        if let Some(m) = hit {
            log::trace!("rule {} ({}) matched: {}", rule.name, rule.kind, m.text);
            matches.push(m);
        }
        current = next;
    }

    (current, matches)
}
