//! Honyaku - Chapter and Novel Translation
//!
//! Translates prose between natural languages, a chapter at a time or as a
//! ZIP archive of chapters, through a pluggable backend (a local Ollama model,
//! or a marked placeholder when none is available). A glossary keeps repeated
//! passages and proper nouns consistent, and a light tone pass re-marks the
//! emotional register of the output.

pub mod cli;
pub mod config;
pub mod error;
pub mod detect;
pub mod chunker;
pub mod backend;
pub mod tone;
pub mod glossary;
pub mod textio;
pub mod archive;
pub mod chapter;
pub mod novel;
