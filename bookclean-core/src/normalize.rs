//! Text normalization
//!
//! Canonicalizes raw extracted text before any structural decision is made:
//! line endings, invisible characters, odd spaces, control characters and
//! whitespace runs. Total and idempotent.

use regex::Regex;
use std::sync::LazyLock;

static HORIZONTAL_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

static SPACE_AROUND_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());

static NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Every Unicode "other" category (Cc, Cf, Cn, Co) except the line break.
static OTHER_CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{C}&&[^\n]]").unwrap());

/// Zero-width and BOM characters removed outright.
const INVISIBLE: [char; 5] = ['\u{feff}', '\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}'];

/// Characters that read as a space but aren't U+0020.
const SPACE_LIKE: [char; 3] = ['\u{00a0}', '\u{3000}', '\t'];

pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let spaced: String = unified
        .chars()
        .filter(|c| !INVISIBLE.contains(c))
        .map(|c| if SPACE_LIKE.contains(&c) { ' ' } else { c })
        .collect();
    let filtered = OTHER_CATEGORY.replace_all(&spaced, "");

    let collapsed = HORIZONTAL_RUN.replace_all(&filtered, " ");
    let tightened = SPACE_AROUND_NEWLINE.replace_all(&collapsed, "\n");
    let separated = NEWLINE_RUN.replace_all(&tightened, "\n\n");
    separated.trim().to_string()
}
