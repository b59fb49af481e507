use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a single chapter file or inline text
    Chapter {
        /// Input chapter file
        #[arg(required_unless_present = "text", conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Translate this text instead of a file
        #[arg(long)]
        text: Option<String>,

        /// Target language code
        #[arg(short, long, default_value = "en")]
        target_lang: String,

        /// Write the translation here instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Translate every chapter of a ZIP archive
    Novel {
        /// Input ZIP archive of chapter files
        archive: PathBuf,

        /// Target language code
        #[arg(short, long, default_value = "en")]
        target_lang: String,

        /// Directory for the translated archive
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Check that a ZIP archive looks like a novel
    Validate {
        /// ZIP archive to check
        archive: PathBuf,
    },

    /// Detect the language of a text file
    Detect {
        /// Text file to inspect
        input: PathBuf,
    },

    /// Summarize the emotional tone of a text file
    Tone {
        /// Text file to inspect
        input: PathBuf,
    },

    /// List supported language codes
    Languages,

    /// Show statistics for a saved glossary
    GlossaryStats {
        /// Glossary snapshot (JSON)
        snapshot: PathBuf,

        /// Also list terms used at least this many times
        #[arg(long)]
        min_usage: Option<u64>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(default_value = "honyaku.toml")]
        path: PathBuf,
    },
}
