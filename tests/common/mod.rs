/*!
 * Common test utilities for the honyaku integration tests
 */

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use honyaku::chapter::{ChapterPipeline, ChapterTranslator};
use honyaku::config::{BackendKind, Config};
use honyaku::detect::{LanguageDetector, StatisticalDetector};
use honyaku::error::{HonyakuError, Result};
use honyaku::glossary::Glossary;

/// Statistical detector that always answers with the same language
pub struct FixedDetector(pub &'static str);

impl StatisticalDetector for FixedDetector {
    fn detect(&self, _text: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

pub fn fixed_detector(lang: &'static str) -> LanguageDetector {
    LanguageDetector::with_statistical(Box::new(FixedDetector(lang)))
}

/// Placeholder-backend config writing finished archives to `output_dir`
pub fn test_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.backend.kind = BackendKind::Placeholder;
    config.novel.output_dir = Some(output_dir.to_path_buf());
    config
}

pub fn placeholder_pipeline(config: &Config, lang: &'static str) -> ChapterPipeline {
    ChapterPipeline::new(config).with_detector(fixed_detector(lang))
}

/// Delegates to a real pipeline but fails on one filename
pub struct FailingTranslator {
    pub inner: ChapterPipeline,
    pub fail_on: &'static str,
}

#[async_trait]
impl ChapterTranslator for FailingTranslator {
    async fn translate_chapter(
        &self,
        path: &Path,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> Result<String> {
        self.check(path)?;
        self.inner.translate_chapter(path, target_lang, glossary).await
    }

    async fn translate_chapter_from(
        &self,
        path: &Path,
        source_lang: &str,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> Result<String> {
        self.check(path)?;
        self.inner
            .translate_chapter_from(path, source_lang, target_lang, glossary)
            .await
    }
}

impl FailingTranslator {
    fn check(&self, path: &Path) -> Result<()> {
        if path.file_name().is_some_and(|name| name == self.fail_on) {
            return Err(HonyakuError::Translation("simulated model crash".to_string()));
        }
        Ok(())
    }
}

/// Write a ZIP archive with the given (name, content) entries
pub fn build_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut zout = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        zout.start_file(*name, SimpleFileOptions::default()).unwrap();
        zout.write_all(content.as_bytes()).unwrap();
    }
    zout.finish().unwrap();
}

/// Write a ZIP archive whose entries carry raw bytes
pub fn build_zip_bytes(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zout = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        zout.start_file(*name, SimpleFileOptions::default()).unwrap();
        zout.write_all(content).unwrap();
    }
    zout.finish().unwrap();
}

/// All file entries of an archive, by name, as raw bytes
pub fn read_zip_bytes(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        if entry.is_dir() {
            continue;
        }
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        entries.insert(entry.name().to_string(), data);
    }
    entries
}

/// All file entries of an archive, by name
pub fn read_zip(path: &Path) -> BTreeMap<String, String> {
    read_zip_bytes(path)
        .into_iter()
        .map(|(name, data)| (name, String::from_utf8(data).unwrap()))
        .collect()
}
