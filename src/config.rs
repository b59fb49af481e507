use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, HonyakuError};
use crate::textio;

// Defaults that older config files may not carry
fn default_timeout_secs() -> u64 {
    300
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_context_history_limit() -> usize {
    5
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_fallback_encodings() -> Vec<String> {
    textio::DEFAULT_FALLBACK_ENCODINGS
        .iter()
        .map(|label| label.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub detect: DetectConfig,
    pub chunking: ChunkingConfig,
    pub backend: BackendConfig,
    pub tone: ToneConfig,
    pub glossary: GlossaryConfig,
    pub novel: NovelConfig,
    #[serde(default)]
    pub text: TextConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
    /// Number of leading characters inspected by the detector
    pub sample_chars: usize,
    /// Consult the statistical detector before the heuristic fallback
    pub use_statistical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per translation unit
    pub max_chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend kind: Ollama or Placeholder
    pub kind: BackendKind,
    /// Ollama endpoint URL
    pub endpoint: String,
    /// Model used when the source language is English
    pub en_to_many_model: String,
    /// Model used for every other source language (into English)
    pub many_to_en_model: String,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Ollama: real inference, degrading to placeholders when a model is missing
    Ollama,
    /// Placeholder: never calls a model, marks units with the target code
    Placeholder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneConfig {
    /// Apply the tone pass to translated units
    pub enabled: bool,
    /// Dominant tone weight below which text is left untouched
    pub min_intensity: f64,
    /// Dominant tone weight above which emphatic words are uppercased
    pub emphasis_intensity: f64,
    /// Derive the markers from the source unit instead of its translation
    #[serde(default)]
    pub score_source: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryConfig {
    /// Number of context strings retained per term
    #[serde(default = "default_context_history_limit")]
    pub context_history_limit: usize,
    /// Character-set overlap ratio used by similar-term search
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Snapshot used to persist the chapter glossary between runs
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NovelConfig {
    /// Directory receiving translated archives (system temp dir when unset)
    pub output_dir: Option<PathBuf>,
    /// Number of leading chapters sampled for language inference
    pub language_samples: usize,
    /// Cross-file occurrences required before a proper noun is pre-seeded
    pub min_term_occurrences: usize,
    /// Trimmed length below which a chapter counts as empty during validation
    pub min_chapter_chars: usize,
    /// Where to write the job glossary after translation, if anywhere
    pub glossary_snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Encoding tried first when reading chapter files
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Encodings tried in order when the preferred one fails to decode
    #[serde(default = "default_fallback_encodings")]
    pub fallback_encodings: Vec<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            encoding: default_encoding(),
            fallback_encodings: default_fallback_encodings(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detect: DetectConfig {
                sample_chars: 1000,
                use_statistical: true,
            },
            chunking: ChunkingConfig {
                max_chunk_size: 512,
            },
            backend: BackendConfig {
                kind: BackendKind::Ollama,
                endpoint: "http://localhost:11434".to_string(),
                en_to_many_model: "llama3.2:3b".to_string(),
                many_to_en_model: "llama3.2:3b".to_string(),
                timeout_secs: default_timeout_secs(),
            },
            tone: ToneConfig {
                enabled: true,
                min_intensity: 0.3,
                emphasis_intensity: 0.6,
                score_source: false,
            },
            glossary: GlossaryConfig {
                context_history_limit: default_context_history_limit(),
                similarity_threshold: default_similarity_threshold(),
                snapshot_path: None,
            },
            novel: NovelConfig {
                output_dir: None,
                language_samples: 3,
                min_term_occurrences: 2,
                min_chapter_chars: 10,
                glossary_snapshot: None,
            },
            text: TextConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HonyakuError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| HonyakuError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HonyakuError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| HonyakuError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Directory where finished novel archives are placed
    pub fn novel_output_dir(&self) -> PathBuf {
        self.novel
            .output_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("honyaku.toml");

        let mut config = Config::default();
        config.backend.kind = BackendKind::Placeholder;
        config.chunking.max_chunk_size = 256;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.backend.kind, BackendKind::Placeholder);
        assert_eq!(loaded.chunking.max_chunk_size, 256);
        assert_eq!(loaded.novel.language_samples, 3);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let toml_text = r#"
[detect]
sample_chars = 1000
use_statistical = false

[chunking]
max_chunk_size = 512

[backend]
kind = "Placeholder"
endpoint = "http://localhost:11434"
en_to_many_model = "a"
many_to_en_model = "b"

[tone]
enabled = true
min_intensity = 0.3
emphasis_intensity = 0.6

[glossary]

[novel]
language_samples = 3
min_term_occurrences = 2
min_chapter_chars = 10
"#;
        let config: Config = toml::from_str(toml_text).unwrap();
        assert_eq!(config.backend.timeout_secs, 300);
        assert_eq!(config.glossary.context_history_limit, 5);
        assert!((config.glossary.similarity_threshold - 0.7).abs() < f64::EPSILON);
        assert!(config.novel.output_dir.is_none());
        assert!(!config.tone.score_source);
        assert_eq!(config.text.encoding, "utf-8");
        assert_eq!(config.text.fallback_encodings, ["utf-8", "latin-1", "cp1252", "iso-8859-1"]);
    }

    #[test]
    fn test_unreadable_config_is_config_error() {
        let err = Config::from_file("/definitely/not/here/honyaku.toml").unwrap_err();
        assert!(matches!(err, HonyakuError::Config(_)));
    }
}
