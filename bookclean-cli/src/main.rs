use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use bookclean_cli::output::{self, StageSource};
use bookclean_core::{CleanConfig, DocumentProcessor, LoadOptions};

const DEFAULT_RULES: &str = "configs/rules.json";

#[derive(Parser)]
#[command(name = "bookclean")]
#[command(about = "Clean EPUB/HTML/text books into one paragraph per line")]
struct Args {
    /// Path to the book to clean (.epub, .html, or plain text)
    input: PathBuf,

    /// Rule file (JSON or YAML)
    #[arg(short, long, default_value = DEFAULT_RULES)]
    config: PathBuf,

    /// Output text path (default: book/<input stem>.txt)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write every extracted/dropped sentence as JSON Lines to this path
    #[arg(long)]
    extracted_out: Option<PathBuf>,

    /// Fail on malformed rule entries instead of skipping them
    #[arg(long)]
    strict_rules: bool,

    /// Dump all intermediate pipeline stage outputs to a directory
    #[arg(long)]
    dump_stages: bool,

    /// Directory for stage dump output
    #[arg(long, default_value = "stages")]
    stages_dir: PathBuf,

    /// Enable timing of each pipeline step
    #[arg(long)]
    profile: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8, profile: bool) {
    let level = match verbose {
        0 if profile => "info",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.profile);

    println!("📚 Bookclean");

    if let Err(e) = run(&args) {
        eprintln!("❌ {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let options = LoadOptions {
        strict: args.strict_rules,
    };
    let config = CleanConfig::load_from_file_with(&args.config, options)
        .with_context(|| format!("Failed to load rules from {}", args.config.display()))?;
    println!(
        "📋 Loaded {} rules from: {}",
        config.rules.len(),
        args.config.display()
    );

    let processor = DocumentProcessor::new(config).with_profiling(args.profile);

    println!("📄 Processing: {}", args.input.display());
    let result = if args.dump_stages {
        println!("\n🔬 Pipeline stage dump mode");
        let stages = processor
            .process_file_capture_stages(&args.input)
            .context("Stage dump failed")?;
        let source = StageSource {
            input: &args.input,
            rules: &args.config,
        };
        for path in output::save_stages(&stages, &source, &args.stages_dir)? {
            println!("  💾 {}", path.display());
        }
        println!("✅ All stages dumped to: {}", args.stages_dir.display());
        stages.result
    } else {
        processor
            .process_file(&args.input)
            .context("Processing failed")?
    };

    println!("✅ Successfully cleaned document");
    println!("📊 Summary:");
    for line in output::summary_lines(&result) {
        println!("{line}");
    }

    let out_path = match &args.out {
        Some(path) => path.clone(),
        None => output::default_output_path(&args.input),
    };
    output::write_lines(&out_path, &result.lines)?;
    println!("💾 Clean text saved to: {}", out_path.display());

    if let Some(path) = &args.extracted_out {
        write_extracted(path, &result.extracted)?;
    }

    Ok(())
}

fn write_extracted(path: &Path, matches: &[bookclean_core::Match]) -> Result<()> {
    output::write_extracted_jsonl(path, matches)?;
    println!("💾 {} extracted sentences saved to: {}", matches.len(), path.display());
    Ok(())
}
