//! CLI tool for extracting per-slot photo sets from template slide decks.

use anyhow::{Context, Result};
use clap::Parser;
use slotdeck_core::config::{DEFAULT_MIN_SIZE_POINTS, DEFAULT_OUTPUT_DIR};
use slotdeck_core::{DeckExtractor, DeckReader, Error, ExtractionSummary, ExtractorConfig, Slide};
use slotdeck_pptx::PptxReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

/// Extract MAIN/SUB1-SUB4 photos from five-photo profile slides.
#[derive(Parser, Debug)]
#[command(name = "slotdeck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input deck (.pptx)
    deck: PathBuf,

    /// Output directory; slot folders go under <OUTPUT>/<deck name>/
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Minimum photo width in points
    #[arg(long, default_value_t = DEFAULT_MIN_SIZE_POINTS)]
    min_width_pt: i64,

    /// Minimum photo height in points
    #[arg(long, default_value_t = DEFAULT_MIN_SIZE_POINTS)]
    min_height_pt: i64,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// List picture and text shapes instead of extracting
    #[arg(long)]
    inspect: bool,

    /// Slides to list with --inspect, e.g. 1,3 (all when omitted)
    #[arg(long, value_delimiter = ',', requires = "inspect")]
    slides: Vec<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let result = if args.inspect {
        inspect(&args, &args.slides)
    } else {
        extract(&args)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the extraction and print the summary.
fn extract(args: &Args) -> Result<()> {
    let start = Instant::now();

    let config = ExtractorConfig::new().with_min_size_points(args.min_width_pt, args.min_height_pt);
    let extractor = DeckExtractor::new(PptxReader::new()).with_config(config);

    let summary = match extractor.extract(&args.deck, &args.output) {
        Ok(summary) => summary,
        Err(e @ Error::DeckNotFound(_)) => return Err(e.into()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to process {}", args.deck.display()))
        }
    };

    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", json);
    } else {
        print_summary(&summary);
    }

    eprintln!("elapsed: {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn print_summary(summary: &ExtractionSummary) {
    println!();
    println!("Done: {}", display_dir(&summary.output_dir));
    println!(
        "{} slides: {} extracted, {} skipped",
        summary.total,
        summary.extracted,
        summary.skipped_count()
    );
    if !summary.skipped.is_empty() {
        let list: Vec<String> = summary.skipped.iter().map(|i| i.to_string()).collect();
        println!("Skipped slides: {}", list.join(", "));
    }
}

fn display_dir(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Print the geometry of picture and text shapes, for tuning the template
/// thresholds. Writes nothing.
fn inspect(args: &Args, selected: &[usize]) -> Result<()> {
    if !args.deck.is_file() {
        return Err(Error::DeckNotFound(args.deck.clone()).into());
    }

    let deck = PptxReader::new()
        .read_deck(&args.deck)
        .with_context(|| format!("Failed to read {}", args.deck.display()))?;

    for slide in &deck.slides {
        if selected.is_empty() || selected.contains(&slide.index) {
            print_slide(slide, args.verbose);
        }
    }

    for index in selected {
        if *index == 0 || *index > deck.slides.len() {
            log::warn!("slide {} does not exist ({} slides)", index, deck.slides.len());
        }
    }

    Ok(())
}

fn print_slide(slide: &Slide, code_points: bool) {
    println!("{}", "=".repeat(60));
    println!("slide {}", slide.index);
    println!("{}", "=".repeat(60));

    println!("[pictures]");
    for (i, shape) in slide.shapes.iter().enumerate() {
        if let Some(image) = shape.image() {
            println!(
                "  #{}: left={}, top={}, width={}, height={}, name='{}', type={}, bytes={}",
                i,
                shape.left,
                shape.top,
                shape.width,
                shape.height,
                shape.name,
                image.media_type,
                image.data.as_ref().map_or(0, Vec::len)
            );
        }
    }

    println!("[text]");
    for (i, shape) in slide.shapes.iter().enumerate() {
        let text = match shape.text().map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ => continue,
        };
        println!("  #{}: left={}, top={}, text='{}'", i, shape.left, shape.top, text);
        if code_points {
            for (j, c) in text.chars().enumerate() {
                println!("    [{}] '{}' -> U+{:04X}", j, c, c as u32);
            }
        }
    }
}
