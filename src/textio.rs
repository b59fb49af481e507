// Text file primitives with encoding fallback

use encoding_rs::Encoding;
use std::path::Path;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use crate::error::{HonyakuError, Result};

/// Tried in order after the requested encoding
pub const DEFAULT_FALLBACK_ENCODINGS: [&str; 4] = ["utf-8", "latin-1", "cp1252", "iso-8859-1"];

/// Read a text file, trying the requested encoding first and then the
/// default fallback chain.
pub fn read_text<P: AsRef<Path>>(path: P, encoding: &str) -> Result<String> {
    read_text_with(path, encoding, &DEFAULT_FALLBACK_ENCODINGS)
}

/// Read a text file with an explicit fallback chain. Decoding is strict:
/// malformed input moves on to the next encoding instead of producing
/// replacement characters.
pub fn read_text_with<P, S>(path: P, encoding: &str, fallbacks: &[S]) -> Result<String>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Err(HonyakuError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;

    for label in std::iter::once(encoding).chain(fallbacks.iter().map(AsRef::as_ref)) {
        let Some(decoder) = Encoding::for_label(label.as_bytes()) else {
            warn!("Unknown encoding label '{}', skipping", label);
            continue;
        };

        if let Some(text) = decoder.decode_without_bom_handling_and_without_replacement(&bytes) {
            debug!("Read {} with encoding {}", path.display(), decoder.name());
            return Ok(text.into_owned());
        }
    }

    error!("Failed to read file {} with all encodings", path.display());
    Err(HonyakuError::Decode(path.display().to_string()))
}

/// Write UTF-8 text, creating parent directories as needed
pub fn write_text<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    std::fs::write(path, content)?;
    debug!("Wrote file: {}", path.display());
    Ok(())
}

pub fn copy_file<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> Result<()> {
    let (source, destination) = (source.as_ref(), destination.as_ref());
    ensure_parent(destination)?;
    std::fs::copy(source, destination)?;
    debug!("Copied file: {} -> {}", source.display(), destination.display());
    Ok(())
}

/// Recursively copy every file under `source` into `destination`
pub fn copy_tree<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> Result<usize> {
    let (source, destination) = (source.as_ref(), destination.as_ref());
    let mut copied = 0;

    for entry in WalkDir::new(source).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = pathdiff::diff_paths(entry.path(), source)
            .ok_or_else(|| HonyakuError::Io(std::io::Error::other(format!(
                "{} is not under {}", entry.path().display(), source.display()
            ))))?;
        copy_file(entry.path(), destination.join(relative))?;
        copied += 1;
    }

    Ok(copied)
}

/// Move a file, falling back to copy and remove across filesystems
pub fn move_file<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> Result<()> {
    let (source, destination) = (source.as_ref(), destination.as_ref());
    ensure_parent(destination)?;

    if std::fs::rename(source, destination).is_err() {
        std::fs::copy(source, destination)?;
        std::fs::remove_file(source)?;
    }

    debug!("Moved file: {} -> {}", source.display(), destination.display());
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
