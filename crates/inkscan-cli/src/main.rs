//! Inkscan command-line interface.
//!
//! ```text
//! inkscan recognize note.jpg --best --format json
//! inkscan batch page1.png page2.png --config inkscan.toml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use inkscan::{RecognitionConfig, RecognitionResult, Recognizer, TesseractEngine};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inkscan", version, about = "Confidence-scored text recognition for notes and documents")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to a discovered inkscan.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recognize text in one image
    Recognize {
        image: PathBuf,

        /// Try every preprocessing variant and keep the best-scoring result
        #[arg(long)]
        best: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also list words below the confidence threshold (text format only)
        #[arg(long)]
        show_uncertain: bool,
    },

    /// Recognize several images concurrently, preserving input order
    Batch {
        #[arg(required = true)]
        images: Vec<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the effective configuration
    Config,

    /// Print version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "inkscan=debug",
        _ => "inkscan=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RecognitionConfig> {
    let config = match path {
        Some(path) => RecognitionConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RecognitionConfig::discover()
            .context("failed to load discovered config")?
            .unwrap_or_default(),
    };
    Ok(config)
}

fn load_image(path: &Path) -> Result<inkscan::DynamicImage> {
    inkscan::load_image(path).with_context(|| format!("failed to read image {}", path.display()))
}

fn print_text(result: &RecognitionResult, show_uncertain: bool) {
    println!("{}", result.full_text());

    if show_uncertain && !result.low_confidence_words().is_empty() {
        eprintln!();
        eprintln!("Uncertain words (average confidence {:.2}):", result.average_confidence());
        for word in result.low_confidence_words() {
            if word.alternatives().is_empty() {
                eprintln!("  {} ({:.2})", word.text(), word.confidence());
            } else {
                eprintln!(
                    "  {} ({:.2}) or: {}",
                    word.text(),
                    word.confidence(),
                    word.alternatives().join(", ")
                );
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Version => {
            println!("inkscan {}", env!("CARGO_PKG_VERSION"));
            println!("tesseract {}", TesseractEngine::version());
        }
        Command::Config => {
            let config = load_config(cli.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Recognize {
            image,
            best,
            format,
            show_uncertain,
        } => {
            let recognizer = Recognizer::tesseract(load_config(cli.config.as_deref())?)?;
            let image = load_image(&image)?;

            if best {
                let outcome = recognizer.recognize_best_detailed(&image).await?;
                tracing::info!(variant = %outcome.variant, score = outcome.score, "best variant");
                match format {
                    OutputFormat::Text => print_text(&outcome.result, show_uncertain),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                }
            } else {
                let result = recognizer.recognize(&image).await?;
                match format {
                    OutputFormat::Text => print_text(&result, show_uncertain),
                    OutputFormat::Json => println!("{}", result.to_json_pretty()?),
                }
            }
        }
        Command::Batch { images, format } => {
            let recognizer = Recognizer::tesseract(load_config(cli.config.as_deref())?)?;
            let decoded = images
                .iter()
                .map(|path| load_image(path))
                .collect::<Result<Vec<_>>>()?;

            let results = recognizer.recognize_batch_results(decoded).await?;
            match format {
                OutputFormat::Text => {
                    for (path, result) in images.iter().zip(&results) {
                        println!("==> {} <==", path.display());
                        println!("{}", result.full_text());
                    }
                }
                OutputFormat::Json => {
                    let entries: Vec<serde_json::Value> = images
                        .iter()
                        .zip(&results)
                        .map(|(path, result)| {
                            serde_json::json!({
                                "path": path.display().to_string(),
                                "result": result,
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).await
}
