// ZIP archive primitives
//
// Blocking; async callers go through tokio::task::spawn_blocking.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{HonyakuError, Result};

/// Entry names that could escape the extraction directory
fn is_unsafe_entry(name: &str) -> bool {
    name.starts_with('/') || name.starts_with('\\') || Path::new(name).is_absolute() || name.contains("..")
}

/// Extract every safe entry of `zip_path` into `extract_to`.
///
/// Returns the number of files written. Absolute names and names containing
/// ".." are skipped with a warning.
pub fn extract_zip<P: AsRef<Path>, Q: AsRef<Path>>(zip_path: P, extract_to: Q) -> Result<usize> {
    let (zip_path, extract_to) = (zip_path.as_ref(), extract_to.as_ref());
    if !zip_path.exists() {
        return Err(HonyakuError::ArchiveNotFound(zip_path.display().to_string()));
    }

    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| HonyakuError::CorruptArchive(format!("{}: {}", zip_path.display(), e)))?;

    std::fs::create_dir_all(extract_to)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| HonyakuError::CorruptArchive(format!("{} (entry {}): {}", zip_path.display(), i, e)))?;
        let name = entry.name().to_string();

        if is_unsafe_entry(&name) {
            warn!("Skipping potentially unsafe file: {}", name);
            continue;
        }

        let out_path = extract_to.join(&name);
        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }

    info!("Extracted {} files from {} to {}", extracted, zip_path.display(), extract_to.display());
    Ok(extracted)
}

/// Compress every file under `folder` into a deflated archive at `output`,
/// named by their path relative to `folder`.
pub fn create_zip<P: AsRef<Path>, Q: AsRef<Path>>(folder: P, output: Q) -> Result<usize> {
    let (folder, output) = (folder.as_ref(), output.as_ref());
    if !folder.exists() {
        return Err(HonyakuError::FileNotFound(folder.display().to_string()));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut zout = ZipWriter::new(File::create(output)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = 0;
    for entry in WalkDir::new(folder).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(relative) = pathdiff::diff_paths(entry.path(), folder) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zout.start_file(name, options)?;
        io::copy(&mut File::open(entry.path())?, &mut zout)?;
        written += 1;
    }

    zout.finish()?.flush()?;

    info!("Created archive {} with {} files", output.display(), written);
    Ok(written)
}
