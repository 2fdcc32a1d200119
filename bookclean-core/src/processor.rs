use crate::config::CleanConfig;
use crate::normalize::normalize_text;
use crate::preprocessors::preprocessor_for;
use crate::rules::{apply_rules, looks_like_leading_title, HeadingMatcher, Rule};
use crate::segmenter::{is_closing, iter_paragraphs, iter_sentences, only_closing, only_opening};
use crate::types::{CleanResult, Match, PipelineStages};
use anyhow::Result;
use std::path::Path;
use std::time::{Duration, Instant};

/// Inclusion state for one cleaning run. Never shared between runs.
#[derive(Debug, Default)]
struct ScanState {
    include: bool,
    skip_leading: usize,
    /// Opening glyphs waiting for the next kept sentence.
    pending_prefix: String,
}

impl ScanState {
    fn enter_heading(&mut self, strict: bool, skip_leading_titles: usize) {
        self.include = strict;
        self.skip_leading = if strict { skip_leading_titles } else { 0 };
    }
}

/// Cleans one document: normalize, gate by headings, split, apply rules,
/// repair stray quotes, and emit one line per kept paragraph.
pub fn clean_text(text: &str, rules: &[Rule], headings: &HeadingMatcher) -> CleanResult {
    clean_normalized(&normalize_text(text), rules, headings)
}

fn clean_normalized(normalized: &str, rules: &[Rule], headings: &HeadingMatcher) -> CleanResult {
    let mut state = ScanState::default();
    let mut lines: Vec<String> = Vec::new();
    let mut extracted: Vec<Match> = Vec::new();
    let mut heading_count = 0usize;
    let mut leading_titles_skipped = 0usize;

    for paragraph in iter_paragraphs(normalized) {
        // A strict chapter title counts as a heading even when no generic
        // pattern covers it.
        let strict = headings.is_strict_chapter_title(paragraph);
        if strict || headings.is_heading(paragraph) {
            heading_count += 1;
            state.enter_heading(strict, headings.skip_leading_titles);
            continue;
        }
        if !state.include {
            continue;
        }
        if state.skip_leading > 0
            && looks_like_leading_title(paragraph, headings.leading_title_max_len)
        {
            state.skip_leading -= 1;
            leading_titles_skipped += 1;
            continue;
        }
        state.skip_leading = 0;

        let body = attach_leading_closers(paragraph, &mut lines);
        if body.is_empty() {
            continue;
        }

        let mut kept = clean_sentences(body, rules, &mut state.pending_prefix, &mut extracted);
        if !state.pending_prefix.is_empty() {
            let prefix = std::mem::take(&mut state.pending_prefix);
            if let Some(last) = kept.last_mut() {
                last.push_str(&prefix);
            } else if let Some(last) = lines.last_mut() {
                last.push_str(&prefix);
            } else {
                state.pending_prefix = prefix;
            }
        }

        let line = join_sentences(&kept);
        if !line.is_empty() {
            lines.push(line);
        }
    }

    if !state.pending_prefix.is_empty() {
        log::debug!("dropping unattached prefix {:?}", state.pending_prefix);
    }
    log::debug!(
        "cleaned document: {} headings, {} leading titles skipped, {} lines, {} matches",
        heading_count,
        leading_titles_skipped,
        lines.len(),
        extracted.len()
    );

    CleanResult { lines, extracted }
}

/// Moves a paragraph's leading closing glyphs onto the previous line and
/// returns the rest. Without a previous line the paragraph is untouched.
fn attach_leading_closers<'a>(paragraph: &'a str, lines: &mut [String]) -> &'a str {
    let Some(last) = lines.last_mut() else {
        return paragraph;
    };
    let split = paragraph
        .char_indices()
        .find(|&(_, c)| !is_closing(c))
        .map_or(paragraph.len(), |(i, _)| i);
    if split == 0 {
        return paragraph;
    }
    last.push_str(&paragraph[..split]);
    paragraph[split..].trim_start()
}

/// Runs each sentence of `body` through the rules and returns the kept ones.
///
/// Opening-only sentences accumulate in `prefix` until a sentence is kept.
/// Closing-only sentences attach to the previous kept sentence when there is one.
fn clean_sentences(
    body: &str,
    rules: &[Rule],
    prefix: &mut String,
    extracted: &mut Vec<Match>,
) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();

    for sentence in iter_sentences(body) {
        let (cleaned, matches) = apply_rules(&sentence, rules);
        extracted.extend(matches);
        let Some(cleaned) = cleaned else {
            continue;
        };
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            continue;
        }

        if only_opening(cleaned) {
            prefix.push_str(cleaned);
            continue;
        }
        if only_closing(cleaned) {
            if let Some(last) = kept.last_mut() {
                last.push_str(cleaned);
                continue;
            }
        }

        let mut sentence = std::mem::take(prefix);
        sentence.push_str(cleaned);
        kept.push(sentence);
    }

    kept
}

/// Concatenates sentences, adding a space only between two ASCII
/// alphanumerics so Latin words and numbers don't run together.
pub fn join_sentences<S: AsRef<str>>(parts: &[S]) -> String {
    let mut line = String::new();
    for part in parts {
        let part = part.as_ref();
        let boundary = (line.chars().next_back(), part.chars().next());
        if let (Some(left), Some(right)) = boundary {
            if left.is_ascii_alphanumeric() && right.is_ascii_alphanumeric() {
                line.push(' ');
            }
        }
        line.push_str(part);
    }
    line
}

/// Wall-clock time spent in each pipeline stage of one run.
///
/// Disabled timers run the stage and record nothing.
#[derive(Debug, Default)]
pub struct StageTimer {
    enabled: bool,
    stages: Vec<(&'static str, Duration)>,
}

impl StageTimer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stages: Vec::new(),
        }
    }

    pub fn run<R>(&mut self, stage: &'static str, f: impl FnOnce() -> R) -> R {
        if !self.enabled {
            return f();
        }
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        log::info!("⏱️  {stage}: {}ms", elapsed.as_millis());
        self.stages.push((stage, elapsed));
        result
    }

    pub fn stages(&self) -> &[(&'static str, Duration)] {
        &self.stages
    }

    pub fn total(&self) -> Duration {
        self.stages.iter().map(|(_, d)| *d).sum()
    }

    /// One line per stage with its share of the total, then the total.
    pub fn report(&self) -> Vec<String> {
        if self.stages.is_empty() {
            return Vec::new();
        }
        let total = self.total();
        let mut lines: Vec<String> = self
            .stages
            .iter()
            .map(|(stage, elapsed)| {
                let share = if total.is_zero() {
                    0.0
                } else {
                    elapsed.as_secs_f64() / total.as_secs_f64() * 100.0
                };
                format!("{stage:.<20} {}ms ({share:.1}%)", elapsed.as_millis())
            })
            .collect();
        lines.push(format!("{:.<20} {}ms", "total", total.as_millis()));
        lines
    }

    /// Milliseconds per stage, in run order.
    pub fn millis(&self) -> Vec<(String, u64)> {
        self.stages
            .iter()
            .map(|(stage, elapsed)| {
                let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
                (stage.to_string(), ms)
            })
            .collect()
    }
}

/// Source file + rule config → CleanResult.
///
/// Holds the compiled config read-only, so one processor can clean any
/// number of documents.
pub struct DocumentProcessor {
    config: CleanConfig,
    profiling: bool,
}

impl DocumentProcessor {
    pub fn new(config: CleanConfig) -> Self {
        Self {
            config,
            profiling: false,
        }
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn config(&self) -> &CleanConfig {
        &self.config
    }

    pub fn process_text(&self, text: &str) -> CleanResult {
        clean_text(text, &self.config.rules, &self.config.headings)
    }

    pub fn process_file(&self, input: &Path) -> Result<CleanResult> {
        Ok(self.process_file_capture_stages(input)?.result)
    }

    /// Like `process_file`, but keeps every intermediate for inspection.
    pub fn process_file_capture_stages(&self, input: &Path) -> Result<PipelineStages> {
        let mut timer = StageTimer::new(self.profiling);
        let preprocessor = preprocessor_for(input);
        log::info!("using {} preprocessor for {}", preprocessor.name(), input.display());

        let raw_text = timer.run("extract", || preprocessor.process_file(input))?;
        let normalized_text = timer.run("normalize", || normalize_text(&raw_text));
        let result = timer.run("clean", || {
            clean_normalized(&normalized_text, &self.config.rules, &self.config.headings)
        });
        for line in timer.report() {
            log::info!("📊 {line}");
        }

        Ok(PipelineStages {
            preprocessor: preprocessor.name().to_string(),
            raw_text,
            normalized_text,
            result,
            timings_ms: timer.millis(),
        })
    }
}
