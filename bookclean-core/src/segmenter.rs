//! Paragraph and sentence segmentation
//!
//! Paragraphs are the non-empty trimmed lines of normalized text. Sentences
//! come from a small character state machine: terminal punctuation arms a
//! pending break, closing quotes/brackets that follow are absorbed into the
//! same sentence, and the first other character commits the break. A single
//! `…` never ends a sentence; a `……` run does.

use std::str::Chars;

const ELLIPSIS: char = '…';

pub fn is_terminal(c: char) -> bool {
    matches!(c, '。' | '．' | '！' | '？' | '!' | '?' | '.')
}

/// Closing quotation and bracket glyphs. ASCII straight quotes live here only.
pub fn is_closing(c: char) -> bool {
    matches!(
        c,
        '”' | '’' | '」' | '』' | '》' | '〉' | '）' | ')' | ']' | '】' | '〕' | '}' | '"' | '\''
    )
}

pub fn is_opening(c: char) -> bool {
    matches!(
        c,
        '“' | '‘' | '「' | '『' | '《' | '〈' | '（' | '(' | '[' | '【' | '〔' | '{'
    )
}

/// Non-empty text made only of closing glyphs.
pub fn only_closing(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_closing)
}

/// Non-empty text made only of opening glyphs.
pub fn only_opening(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_opening)
}

/// Non-empty trimmed lines, in order.
pub fn iter_paragraphs(text: &str) -> impl Iterator<Item = &str> + Clone {
    text.split('\n').map(str::trim).filter(|s| !s.is_empty())
}

pub fn iter_sentences(text: &str) -> Sentences<'_> {
    Sentences::new(text)
}

/// Lazy sentence iterator over one paragraph.
#[derive(Debug, Clone)]
pub struct Sentences<'a> {
    chars: Chars<'a>,
    buf: String,
    prev: Option<char>,
    pending_end: bool,
}

impl<'a> Sentences<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars(),
            buf: String::new(),
            prev: None,
            pending_end: false,
        }
    }

    fn reset(&mut self) {
        self.prev = None;
        self.pending_end = false;
    }

    /// Takes the buffer, returning it if anything but whitespace was in it.
    fn take_sentence(&mut self) -> Option<String> {
        let taken = std::mem::take(&mut self.buf);
        let trimmed = taken.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn push(&mut self, ch: char) {
        self.buf.push(ch);
        if is_terminal(ch) || (ch == ELLIPSIS && self.prev == Some(ELLIPSIS)) {
            self.pending_end = true;
        }
        self.prev = Some(ch);
    }
}

impl Iterator for Sentences<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(ch) = self.chars.next() {
            if ch == '\n' {
                self.reset();
                match self.take_sentence() {
                    Some(sentence) => return Some(sentence),
                    None => continue,
                }
            }

            if self.pending_end {
                if is_closing(ch) {
                    self.buf.push(ch);
                    self.prev = Some(ch);
                    continue;
                }
                self.reset();
                let done = self.take_sentence();
                self.push(ch);
                match done {
                    Some(sentence) => return Some(sentence),
                    None => continue,
                }
            }

            self.push(ch);
        }

        self.reset();
        self.take_sentence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(text: &str) -> Vec<String> {
        iter_sentences(text).collect()
    }

    #[test]
    fn test_paragraphs_skip_blank_lines() {
        let paragraphs: Vec<&str> = iter_paragraphs("甲\n\n  乙 \n\n\n丙").collect();
        assert_eq!(paragraphs, vec!["甲", "乙", "丙"]);
    }

    #[test]
    fn test_paragraphs_restartable() {
        let text = "一\n二";
        let first: Vec<&str> = iter_paragraphs(text).collect();
        let second: Vec<&str> = iter_paragraphs(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_basic_split() {
        assert_eq!(sentences("他来了。她走了！"), vec!["他来了。", "她走了！"]);
    }

    #[test]
    fn test_closing_quote_absorbed() {
        assert_eq!(sentences("A。\"B！"), vec!["A。\"", "B！"]);
        assert_eq!(
            sentences("“走吧。”他说。"),
            vec!["“走吧。”", "他说。"]
        );
    }

    #[test]
    fn test_multiple_closers_absorbed() {
        assert_eq!(sentences("「『好。』」然后"), vec!["「『好。』」", "然后"]);
    }

    #[test]
    fn test_single_ellipsis_does_not_split() {
        assert_eq!(sentences("打…住"), vec!["打…住"]);
    }

    #[test]
    fn test_double_ellipsis_splits() {
        assert_eq!(sentences("打……住"), vec!["打……", "住"]);
    }

    #[test]
    fn test_unterminated_tail_flushed() {
        assert_eq!(sentences("开头。没有结尾"), vec!["开头。", "没有结尾"]);
        assert_eq!(sentences("结尾。”"), vec!["结尾。”"]);
    }

    #[test]
    fn test_newline_flushes() {
        assert_eq!(sentences("第一行\n第二行"), vec!["第一行", "第二行"]);
    }

    #[test]
    fn test_whitespace_only_pieces_dropped() {
        assert_eq!(sentences("Hi.  "), vec!["Hi."]);
        assert!(sentences("   ").is_empty());
        assert!(sentences("").is_empty());
    }

    #[test]
    fn test_ascii_terminals() {
        assert_eq!(sentences("Stop! Go? Yes."), vec!["Stop!", "Go?", "Yes."]);
    }

    #[test]
    fn test_glyph_classes() {
        assert!(only_closing("”」"));
        assert!(!only_closing("”a"));
        assert!(!only_closing(""));
        assert!(only_opening("“「"));
        assert!(!only_opening("\""));
    }
}
