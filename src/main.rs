//! Honyaku - chapter and novel translation
//!
//! Command line entry point: translates single chapters or whole ZIP archives
//! of chapters through a local Ollama model, keeping terminology consistent
//! with a glossary.

use anyhow::{bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use honyaku::chapter::{ChapterPipeline, ChapterTranslator};
use honyaku::cli::{Args, Commands};
use honyaku::config::Config;
use honyaku::detect::{get_language_name, get_supported_languages, LanguageDetector};
use honyaku::glossary::{Glossary, GlossaryOptions};
use honyaku::novel::NovelOrchestrator;
use honyaku::textio;
use honyaku::tone::ToneProcessor;

const DEFAULT_CONFIG_FILE: &str = "honyaku.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    let _log_guard = setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Chapter { input, text, target_lang, output } => {
            let pipeline = ChapterPipeline::new(&config);
            let mut glossary = load_chapter_glossary(&config)?;

            match (text, input, output) {
                (Some(text), _, None) => {
                    println!("{}", pipeline.translate_text(&text, &target_lang, &mut glossary).await);
                }
                (Some(text), _, Some(output)) => {
                    let translated = pipeline.translate_text(&text, &target_lang, &mut glossary).await;
                    textio::write_text(&output, &translated)?;
                    println!("Saved translation to {}", output.display());
                }
                (None, Some(input), Some(output)) => {
                    if !pipeline
                        .translate_and_save_chapter(&input, &output, &target_lang, &mut glossary)
                        .await
                    {
                        bail!("Failed to translate {}", input.display());
                    }
                    println!("Saved translation to {}", output.display());
                }
                (None, Some(input), None) => {
                    println!("{}", pipeline.translate_chapter(&input, &target_lang, &mut glossary).await?);
                }
                (None, None, _) => bail!("Either an input file or --text is required"),
            }

            if let Some(snapshot) = &config.glossary.snapshot_path {
                glossary.save(snapshot)?;
            }
        }
        Commands::Novel { archive, target_lang, output_dir } => {
            if output_dir.is_some() {
                config.novel.output_dir = output_dir;
            }

            let progress_bar = ProgressBar::new(0);
            progress_bar.set_style(ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"));

            let bar = progress_bar.clone();
            let novel = NovelOrchestrator::new(config).with_progress(move |progress| {
                bar.set_length(progress.total_chapters as u64);
                bar.set_position(progress.current_chapter as u64);
                bar.set_message(progress.status.clone());
            });

            let result = novel.translate_novel(&archive, &target_lang).await;
            progress_bar.finish_and_clear();
            let report = result?;

            println!("Translated novel written to {}", report.output_path.display());
            println!("Source language: {} ({})", report.source_lang, get_language_name(&report.source_lang));
            println!("Chapters translated: {}/{}", report.translated_count(), report.outcomes.len());

            let failed = report.failed_chapters();
            if !failed.is_empty() {
                println!("Chapters kept in the original language: {}", failed.join(", "));
            }
        }
        Commands::Validate { archive } => {
            let validation = NovelOrchestrator::new(config)
                .validate_novel_structure(&archive)
                .await;

            println!("{}", validation.message);
            if !validation.valid {
                bail!("{} is not a valid novel archive", archive.display());
            }
        }
        Commands::Detect { input } => {
            let text = textio::read_text_with(&input, &config.text.encoding, &config.text.fallback_encodings)?;
            let code = LanguageDetector::new(&config.detect).detect(&text);
            println!("{} ({})", code, get_language_name(&code));
        }
        Commands::Tone { input } => {
            let text = textio::read_text_with(&input, &config.text.encoding, &config.text.fallback_encodings)?;
            let summary = ToneProcessor::new(&config.tone).summary(&text)?;

            println!("Dominant tone: {} ({:.3})", summary.dominant, summary.confidence);
            println!("Significant tones: {}", summary.total_significant);
            for (label, weight) in &summary.significant {
                println!("  {:<10} {:.3}", label.as_str(), weight);
            }
        }
        Commands::Languages => {
            println!("{:<6} {}", "Code", "Language");
            println!("{}", "-".repeat(20));
            for (code, name) in get_supported_languages() {
                println!("{:<6} {}", code, name);
            }
        }
        Commands::GlossaryStats { snapshot, min_usage } => {
            let glossary = Glossary::from_file(&snapshot, GlossaryOptions::from(&config.glossary))?;
            let stats = glossary.get_statistics();

            println!("\n{}", glossary);
            println!("Total terms: {}", stats.total_terms);
            println!("Total usage: {}", stats.total_usage);
            println!("Average usage: {}", stats.avg_usage);
            if let Some(term) = &stats.most_used_term {
                println!("Most used: {} ({} uses)", term, stats.most_used_count);
            }
            println!("Terms with context: {}", stats.terms_with_context);

            if let Some(min_usage) = min_usage {
                println!("\n{:<40} {}", "Term", "Translation");
                println!("{}", "-".repeat(80));
                for (term, translation) in glossary.get_frequent_terms(min_usage) {
                    println!("{:<40} {}", term, translation);
                }
            }
        }
        Commands::InitConfig { path } => {
            Config::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

/// The chapter glossary persisted between runs, or a fresh one
fn load_chapter_glossary(config: &Config) -> Result<Glossary> {
    let options = GlossaryOptions::from(&config.glossary);
    match &config.glossary.snapshot_path {
        Some(snapshot) if snapshot.exists() => Ok(Glossary::from_file(snapshot, options)?),
        _ => Ok(Glossary::with_options(options)),
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".honyaku").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "honyaku.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("honyaku.log").display());

    Ok(guard)
}
