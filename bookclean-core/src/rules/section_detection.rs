// Section detection - decides which lines are headings and which of those
// open a chapter whose body should be kept.

use regex::Regex;
use std::sync::LazyLock;

static TITLE_LIKE_ALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Za-z\x{4e00}-\x{9fff}《》〈〉「」『』“”‘’·—\-？！!?… ]+$").unwrap()
});

/// Clause separators that rule a line out as a leading title.
const CLAUSE_SEPARATORS: [char; 7] = ['，', ',', ';', '；', ':', '：', '、'];

/// Heading classification settings, compiled once from the rules file.
#[derive(Debug, Clone)]
pub struct HeadingMatcher {
    pub max_len: usize,
    pub strict_chapter_title: Regex,
    pub generic_heading: Regex,
    pub other_headings: Vec<Regex>,
    pub digit_only: bool,
    pub skip_leading_titles: usize,
    pub leading_title_max_len: usize,
}

impl HeadingMatcher {
    pub fn new(strict_chapter_title: Regex, generic_heading: Regex) -> Self {
        Self {
            max_len: 80,
            strict_chapter_title,
            generic_heading,
            other_headings: Vec::new(),
            digit_only: true,
            skip_leading_titles: 0,
            leading_title_max_len: 20,
        }
    }

    /// Any structural line: chapter marker, section break, front/back matter.
    pub fn is_heading(&self, line: &str) -> bool {
        let Some(s) = self.candidate(line) else {
            return false;
        };
        if self.digit_only && s.chars().all(is_decimal_digit) {
            return true;
        }
        matches_at_start(&self.generic_heading, s)
            || self
                .other_headings
                .iter()
                .any(|pattern| matches_at_start(pattern, s))
    }

    /// A heading that opens a section whose body is kept.
    pub fn is_strict_chapter_title(&self, line: &str) -> bool {
        self.candidate(line)
            .is_some_and(|s| matches_at_start(&self.strict_chapter_title, s))
    }

    fn candidate<'a>(&self, line: &'a str) -> Option<&'a str> {
        let s = line.trim();
        if s.is_empty() || s.chars().count() > self.max_len {
            None
        } else {
            Some(s)
        }
    }
}

/// Heuristic for subtitle/epigraph lines right after a chapter heading:
/// short, no sentence or clause punctuation, only allow-listed glyphs.
pub fn looks_like_leading_title(line: &str, max_len: usize) -> bool {
    let s = line.trim();
    if s.is_empty() || s.chars().count() > max_len {
        return false;
    }
    if s.contains('。') || s.contains(CLAUSE_SEPARATORS) {
        return false;
    }
    TITLE_LIKE_ALLOWED.is_match(s)
}

fn is_decimal_digit(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c)
}

/// Leftmost-first search means any match starting at 0 is the one returned.
fn matches_at_start(pattern: &Regex, s: &str) -> bool {
    pattern.find(s).is_some_and(|m| m.start() == 0)
}
