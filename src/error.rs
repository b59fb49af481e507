use thiserror::Error;

#[derive(Error, Debug)]
pub enum HonyakuError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Language detection error: {0}")]
    Detection(String),

    #[error("Tone processing error: {0}")]
    Tone(String),

    #[error("Glossary error: {0}")]
    Glossary(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("Invalid or corrupted archive: {0}")]
    CorruptArchive(String),

    #[error("No chapters found in archive: {0}")]
    NoChapters(String),

    #[error("Unable to decode file with any supported encoding: {0}")]
    Decode(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, HonyakuError>;
