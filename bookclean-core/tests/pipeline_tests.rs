//! Pipeline boundary tests: source file in, clean lines and audit out.
//!
//! Fixtures are written under a per-test directory in the system temp dir:
//!
//! - Boundary 1 (preprocessor output): EPUB spine order, markup stripping
//! - Boundary 2 (rule file): the shipped `configs/rules.json` loads and behaves
//! - Boundary 3 (clean output): heading gating, rule audit, quote repair
//!
//! The segmentation internals are covered by unit tests beside the code.

use bookclean_core::{CleanConfig, DocumentProcessor, LoadOptions};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

// ============================================================================
// Fixture helpers
// ============================================================================

fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("bookclean_pipeline_tests")
        .join(format!("{}_{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn shipped_rules() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../configs/rules.json")
}

const TEST_RULES: &str = r#"{
  "version": 1,
  "heading": {
    "strict_chapter_title": "^第.+章",
    "generic_heading": "^第.+[章卷]",
    "other_headings": ["^(后记|附录)"],
    "skip_leading_titles": 1
  },
  "rules": [
    {"name": "url", "kind": "drop", "pattern": "(?i)www\\.|https?://"},
    {"name": "follow", "kind": "extract", "pattern": "关注.{0,8}公众号"},
    {"name": "dash", "kind": "replace", "pattern": "-{2,}", "replacement": "——"}
  ]
}"#;

fn test_config() -> CleanConfig {
    CleanConfig::from_json_str(TEST_RULES, LoadOptions::default()).unwrap()
}

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn build_epub(chapters: &[(&str, &str)]) -> Vec<u8> {
    let mut manifest = String::new();
    let mut spine = String::new();
    for (i, (href, _)) in chapters.iter().enumerate() {
        manifest.push_str(&format!(
            r#"<item id="c{i}" href="{href}" media-type="application/xhtml+xml"/>"#
        ));
        spine.push_str(&format!(r#"<itemref idref="c{i}"/>"#));
    }
    let opf = format!(
        r#"<?xml version="1.0"?><package><manifest>{manifest}</manifest><spine>{spine}</spine></package>"#
    );
    let container = r#"<?xml version="1.0"?>
<container><rootfiles><rootfile full-path="OPS/book.opf"/></rootfiles></container>"#;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    writer.start_file("mimetype", options).unwrap();
    writer.write_all(b"application/epub+zip").unwrap();
    writer.start_file("META-INF/container.xml", options).unwrap();
    writer.write_all(container.as_bytes()).unwrap();
    writer.start_file("OPS/book.opf", options).unwrap();
    writer.write_all(opf.as_bytes()).unwrap();
    for (href, body) in chapters {
        writer.start_file(format!("OPS/{href}"), options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn sample_epub() -> Vec<u8> {
    build_epub(&[
        (
            "front.xhtml",
            "<html><head><title>书名</title></head><body><p>版权所有。</p></body></html>",
        ),
        (
            "ch1.xhtml",
            "<html><body><h2>第一章 起</h2><p>风起青萍</p>\
             <p>他说：“走吧。”</p><p>关注某某公众号。</p>\
             <p>那天--很冷。</p></body></html>",
        ),
        (
            "ch2.xhtml",
            "<html><body><h2>第二章</h2><p>“你来了。</p><p>”她笑了。</p>\
             <script>var ad = 1;</script><p>访问https://book-site/123。结束了。</p></body></html>",
        ),
        (
            "back.xhtml",
            "<html><body><h2>后记</h2><p>感谢读者&amp;编辑。</p></body></html>",
        ),
    ])
}

// ============================================================================
// Boundary 1: preprocessor output
// ============================================================================

mod preprocessor_boundary {
    use super::*;

    #[test]
    fn epub_raw_text_follows_spine_order() {
        let dir = fixture_dir("epub_raw");
        let path = write_file(&dir, "book.epub", &sample_epub());

        let stages = DocumentProcessor::new(test_config())
            .process_file_capture_stages(&path)
            .unwrap();

        assert_eq!(stages.preprocessor, "epub");
        let raw = &stages.raw_text;
        let front = raw.find("版权所有").unwrap();
        let ch1 = raw.find("第一章").unwrap();
        let ch2 = raw.find("第二章").unwrap();
        let back = raw.find("后记").unwrap();
        assert!(front < ch1 && ch1 < ch2 && ch2 < back);
        assert!(!raw.contains("书名"), "head content should be ignored");
        assert!(!raw.contains("var ad"), "script content should be ignored");
        assert!(raw.contains("感谢读者&编辑。"));
    }

    #[test]
    fn normalized_text_has_no_blank_runs() {
        let dir = fixture_dir("epub_normalized");
        let path = write_file(&dir, "book.epub", &sample_epub());

        let stages = DocumentProcessor::new(test_config())
            .process_file_capture_stages(&path)
            .unwrap();

        let normalized = &stages.normalized_text;
        assert!(!normalized.contains("\n\n\n"));
        assert!(!normalized.contains('\r'));
        assert_eq!(normalized.trim(), normalized.as_str());
    }

    #[test]
    fn html_and_text_sources_are_supported() {
        let dir = fixture_dir("html_text");
        let html = write_file(
            &dir,
            "chapter.html",
            "<html><body><p>第一章</p><p>正文&hellip;完。</p></body></html>".as_bytes(),
        );
        let txt = write_file(&dir, "chapter.txt", "第一章\r\n正文。\r\n".as_bytes());
        let processor = DocumentProcessor::new(test_config());

        assert_eq!(processor.process_file(&html).unwrap().lines, vec!["正文…完。"]);
        assert_eq!(processor.process_file(&txt).unwrap().lines, vec!["正文。"]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = fixture_dir("missing");
        let processor = DocumentProcessor::new(test_config());
        let err = processor.process_file(&dir.join("nope.txt")).unwrap_err();
        assert!(format!("{err:#}").contains("nope.txt"));
    }
}

// ============================================================================
// Boundary 2: rule file
// ============================================================================

mod rule_file_boundary {
    use super::*;

    #[test]
    fn shipped_rules_load() {
        let config = CleanConfig::load_from_file_with(shipped_rules(), LoadOptions::strict())
            .expect("configs/rules.json should load in strict mode");
        assert!(!config.rules.is_empty());
        assert!(config.headings.is_strict_chapter_title("第十二章 归来"));
        assert!(config.headings.is_heading("第三卷"));
        assert!(config.headings.is_heading("后记"));
        assert!(config.headings.is_heading("12"));
    }

    #[test]
    fn shipped_rules_clean_a_chapter() {
        let config = CleanConfig::load_from_file(shipped_rules()).unwrap();
        let result = DocumentProcessor::new(config)
            .process_text("序\n前言不要。\n第一章 开端\n他到了。请关注作者公众号。\n本章完\n");

        assert_eq!(result.lines, vec!["他到了。"]);
        let buckets = result.bucket_counts();
        assert!(buckets.contains(&("solicitation".to_string(), 1)));
        assert!(buckets.contains(&("noise".to_string(), 1)));
    }

    #[test]
    fn yaml_rule_file_matches_json() {
        let dir = fixture_dir("yaml_rules");
        let yaml = r#"
version: 1
heading:
  strict_chapter_title: "^第.+章"
  generic_heading: "^第.+[章卷]"
  other_headings: ["^(后记|附录)"]
  skip_leading_titles: 1
rules:
  - {name: url, kind: drop, pattern: "(?i)www\\.|https?://"}
  - {name: follow, kind: extract, pattern: "关注.{0,8}公众号"}
  - {name: dash, kind: replace, pattern: "-{2,}", replacement: "——"}
"#;
        let yaml_path = write_file(&dir, "rules.yaml", yaml.as_bytes());
        let epub_path = write_file(&dir, "book.epub", &sample_epub());

        let from_yaml = DocumentProcessor::new(CleanConfig::load_from_file(&yaml_path).unwrap())
            .process_file(&epub_path)
            .unwrap();
        let from_json = DocumentProcessor::new(test_config())
            .process_file(&epub_path)
            .unwrap();
        assert_eq!(from_yaml, from_json);
    }

    #[test]
    fn strict_mode_rejects_malformed_entry() {
        let data = r#"{"heading": {"strict_chapter_title": "^第", "generic_heading": "^第",
            "other_headings": []}, "rules": [{"name": "no pattern"}]}"#;
        assert!(CleanConfig::from_json_str(data, LoadOptions::default()).is_ok());
        assert!(CleanConfig::from_json_str(data, LoadOptions::strict()).is_err());
    }
}

// ============================================================================
// Boundary 3: clean output
// ============================================================================

mod clean_output {
    use super::*;

    fn clean_sample() -> bookclean_core::CleanResult {
        let dir = fixture_dir("clean_output");
        let path = write_file(&dir, "book.epub", &sample_epub());
        DocumentProcessor::new(test_config()).process_file(&path).unwrap()
    }

    #[test]
    fn body_lines_from_chapters_only() {
        let result = clean_sample();
        assert_eq!(
            result.lines,
            vec![
                "他说：“走吧。”",
                "那天——很冷。",
                "“你来了。”",
                "她笑了。",
                "结束了。",
            ]
        );
    }

    #[test]
    fn audit_trail_in_firing_order() {
        let result = clean_sample();
        let rules: Vec<&str> = result.extracted.iter().map(|m| m.rule_name.as_str()).collect();
        assert_eq!(rules, vec!["follow", "dash", "url"]);
        assert_eq!(result.extracted[0].bucket, "solicitation");
        assert_eq!(result.extracted[0].text, "关注某某公众号。");
        assert_eq!(result.extracted[1].text, "那天--很冷。");
        assert_eq!(result.extracted[2].bucket, "noise");
    }

    #[test]
    fn repeated_runs_are_identical() {
        let processor = DocumentProcessor::new(test_config());
        let text = "第一章\n甲。\n”\n乙--丙。";
        assert_eq!(processor.process_text(text), processor.process_text(text));
    }

    #[test]
    fn no_output_without_chapter_heading() {
        let result = DocumentProcessor::new(test_config()).process_text("只有前言。\n没有章节。");
        assert!(result.lines.is_empty());
        assert!(result.extracted.is_empty());
    }

    #[test]
    fn exact_chapter_title_gates_without_generic_cover() {
        let rules = r#"{
          "heading": {
            "strict_chapter_title": "^第.章$",
            "generic_heading": "^\\d+$",
            "other_headings": ["^附录$"]
          },
          "rules": []
        }"#;
        let config = CleanConfig::from_json_str(rules, LoadOptions::default()).unwrap();
        let result = DocumentProcessor::new(config).process_text("1\n第一章\n正文内容。\n附录\n应被忽略。");
        assert_eq!(result.lines, vec!["正文内容。"]);
    }
}
