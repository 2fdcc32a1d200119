// Output writers: cleaned text, extracted-noise JSONL, and stage dumps.

use anyhow::{Context, Result};
use bookclean_core::{CleanResult, Match, PipelineStages};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// `book/<input stem>.txt`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    PathBuf::from("book").join(format!("{stem}.txt"))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// One paragraph per line, newline-terminated.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    ensure_parent(path)?;
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).with_context(|| format!("Failed to write: {}", path.display()))
}

/// JSON Lines, one `{"bucket","rule","text"}` object per match.
pub fn write_extracted_jsonl(path: &Path, matches: &[Match]) -> Result<()> {
    ensure_parent(path)?;
    let file =
        fs::File::create(path).with_context(|| format!("Failed to create: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for m in matches {
        serde_json::to_writer(&mut writer, m)?;
        writer.write_all(b"\n")?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write: {}", path.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Where a stage dump came from, recorded in `summary.json`.
pub struct StageSource<'a> {
    pub input: &'a Path,
    pub rules: &'a Path,
}

fn file_hash(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    Ok(sha256_hex(&bytes))
}

/// Writes every pipeline boundary to `output_dir` and returns the paths written.
pub fn save_stages(
    stages: &PipelineStages,
    source: &StageSource<'_>,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;
    let mut written = Vec::new();

    // Stage 1: extracted text
    let raw_path = output_dir.join("stage1_raw.txt");
    fs::write(&raw_path, &stages.raw_text)?;
    written.push(raw_path);

    // Stage 2: normalized text
    let normalized_path = output_dir.join("stage2_normalized.txt");
    fs::write(&normalized_path, &stages.normalized_text)?;
    written.push(normalized_path);

    // Stage 3: clean lines + audit
    let lines_path = output_dir.join("stage3_lines.txt");
    write_lines(&lines_path, &stages.result.lines)?;
    written.push(lines_path);

    let extracted_path = output_dir.join("stage3_extracted.jsonl");
    write_extracted_jsonl(&extracted_path, &stages.result.extracted)?;
    written.push(extracted_path);

    // Summary file: quick reference for comparing runs
    let summary = stage_summary(stages, source)?;
    let summary_path = output_dir.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    written.push(summary_path);

    Ok(written)
}

fn stage_summary(stages: &PipelineStages, source: &StageSource<'_>) -> Result<serde_json::Value> {
    let buckets: serde_json::Map<String, serde_json::Value> = stages
        .result
        .bucket_counts()
        .into_iter()
        .map(|(bucket, count)| (bucket, count.into()))
        .collect();
    let timings: serde_json::Map<String, serde_json::Value> = stages
        .timings_ms
        .iter()
        .map(|(stage, ms)| (stage.clone(), (*ms).into()))
        .collect();

    Ok(serde_json::json!({
        "input": source.input.display().to_string(),
        "input_sha256": file_hash(source.input)?,
        "rules": source.rules.display().to_string(),
        "rules_sha256": file_hash(source.rules)?,
        "preprocessor": stages.preprocessor,
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "stage_counts": {
            "raw_chars": stages.raw_text.chars().count(),
            "normalized_chars": stages.normalized_text.chars().count(),
            "lines": stages.result.lines.len(),
            "matches": stages.result.extracted.len(),
        },
        "bucket_counts": buckets,
        "timings_ms": timings,
    }))
}

/// Console summary lines for a finished run.
pub fn summary_lines(result: &CleanResult) -> Vec<String> {
    let mut out = vec![
        format!("   - Lines: {}", result.lines.len()),
        format!("   - Matches: {}", result.extracted.len()),
    ];
    for (bucket, count) in result.bucket_counts() {
        out.push(format!("     {bucket}: {count}"));
    }
    out
}
