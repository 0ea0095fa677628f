//! CLI tool for auditing PowerPoint decks for cross-slide inconsistencies.
//!
//! Pipeline: parse .pptx -> OCR embedded images -> aggregate per-slide text
//! -> send to Gemini with the audit prompt -> print the returned report.

mod config;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::Config;
use deckscan_core::{
    build_analysis_prompt, Presentation, PresentationFormat, ReportFormatter, SlideAggregator,
};
use deckscan_gemini::GeminiClient;
use deckscan_ocr::OcrEngine;
use deckscan_pptx::PptxParser;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Audit a PowerPoint deck for cross-slide inconsistencies using Gemini.
#[derive(Parser, Debug)]
#[command(name = "deckscan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input presentation file (.pptx)
    input: PathBuf,

    /// Path to config TOML (default: ./deckscan.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the analysis model from the config
    #[arg(short, long)]
    model: Option<String>,

    /// Skip OCR of embedded images
    #[arg(long)]
    no_ocr: bool,

    /// Print the aggregated slide text instead of calling the API
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let cfg = Config::resolve(args.config.as_deref())?;

    if args.verbose {
        eprintln!("[+] Starting analysis of '{}'...", args.input.display());
    }

    let mut presentation = load_presentation(&args.input)?;

    if args.verbose {
        eprintln!(
            "[+] Extracting text from {} slides...",
            presentation.slides.len()
        );
    }

    if cfg.ocr.enabled && !args.no_ocr {
        run_ocr_stage(&cfg, &mut presentation);
    } else {
        log::debug!("OCR disabled; {} images skipped", presentation.image_count());
    }

    if args.verbose {
        for slide in &presentation.slides {
            if slide.images.is_empty() {
                eprintln!("    - Extracted text from Slide {}", slide.number);
            } else {
                eprintln!(
                    "    - Extracted text and {} image(s) from Slide {}",
                    slide.images.len(),
                    slide.number
                );
            }
        }
        eprintln!("[+] Extraction complete. Consolidating text for analysis.");
    }

    let document = SlideAggregator::new().aggregate(&presentation);

    if args.dry_run {
        println!("{}", document);
        return Ok(());
    }

    let api_key = std::env::var(&cfg.analysis.api_key_env).map_err(|_| {
        deckscan_core::Error::MissingApiKey(cfg.analysis.api_key_env.clone())
    })?;

    let model = args.model.as_deref().unwrap_or(&cfg.analysis.model);
    let client = GeminiClient::new(api_key)?
        .with_model(model)
        .with_endpoint(&cfg.analysis.endpoint);

    if args.verbose {
        eprintln!(
            "[+] Sending data to {} for inconsistency analysis...",
            client.model()
        );
    }

    let prompt = build_analysis_prompt(&document);
    let report = client
        .generate(&prompt)
        .context("inconsistency analysis failed")?;

    if args.verbose {
        eprintln!("[+] Analysis Complete.\n");
    }

    println!("{}", ReportFormatter::new().format(&report));

    Ok(())
}

/// Open the input file, detect its format, and parse it.
fn load_presentation(input: &Path) -> Result<Presentation> {
    let file =
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let mut reader = BufReader::new(file);

    // Read magic bytes to detect format
    let mut magic = [0u8; 8];
    reader
        .read_exact(&mut magic)
        .with_context(|| "Failed to read file header")?;

    // Re-open for parsing; the ZIP reader needs to start at offset zero
    let file = File::open(input)?;
    let reader = BufReader::new(file);

    let format = PresentationFormat::from_magic(&magic)
        .or_else(|| {
            input
                .extension()
                .and_then(|e| e.to_str())
                .and_then(PresentationFormat::from_extension)
        })
        .ok_or_else(|| anyhow::anyhow!("Could not detect file format: {}", input.display()))?;

    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    match format {
        PresentationFormat::Pptx => {
            log::debug!("Parsing as PPTX");
            let parser = PptxParser::new();
            Ok(parser
                .parse(reader, filename)
                .map_err(|e| anyhow::anyhow!("{}", e))?)
        }
        PresentationFormat::Ppt => {
            bail!(
                "{}: legacy .ppt files are not supported; save the deck as .pptx first",
                input.display()
            )
        }
    }
}

/// OCR every embedded image, appending recognized text to its slide.
///
/// An unusable Tesseract install downgrades the whole stage to a warning;
/// individual image failures are logged inside the engine.
fn run_ocr_stage(cfg: &Config, presentation: &mut Presentation) {
    if presentation.image_count() == 0 {
        return;
    }

    let engine = OcrEngine::new()
        .with_executable(&cfg.ocr.tesseract_exe)
        .with_language(&cfg.ocr.language)
        .with_timeout_seconds(cfg.ocr.timeout_seconds);

    match engine.probe() {
        Ok(version) => log::debug!("OCR engine: {}", version),
        Err(e) => {
            log::warn!("OCR unavailable, image text will be missing: {}", e);
            return;
        }
    }

    for slide in &mut presentation.slides {
        // Detach the image list so recognized text can be appended to the slide
        let images = std::mem::take(&mut slide.images);
        let mut recognized = 0usize;
        for image in &images {
            if let Some(text) = engine.recognize(&image.bytes, &image.part_name) {
                slide.add_ocr_text(text);
                recognized += 1;
            }
        }
        if !images.is_empty() {
            log::debug!(
                "Slide {}: OCR produced text for {}/{} image(s)",
                slide.number,
                recognized,
                images.len()
            );
        }
        slide.images = images;
    }
}
