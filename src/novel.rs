// Novel archive orchestration
//
// Extracts a ZIP of chapter files, infers the source language from a few
// leading chapters, pre-seeds a job glossary with recurring proper nouns and
// translates chapters one by one in filename order. A chapter that fails is
// copied verbatim and recorded; it never aborts the job.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::archive;
use crate::chapter::{ChapterPipeline, ChapterTranslator};
use crate::config::Config;
use crate::detect::{LanguageDetector, DEFAULT_LANGUAGE};
use crate::error::{HonyakuError, Result};
use crate::glossary::{Glossary, GlossaryOptions, GlossaryStatistics};
use crate::textio;

const CHAPTER_EXTENSIONS: [&str; 2] = [".txt", ".text"];

/// Characters of each sampled chapter used for language inference
const LANGUAGE_SAMPLE_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationProgress {
    pub current_chapter: usize,
    pub total_chapters: usize,
    pub progress_percent: f64,
    pub status: String,
}

impl TranslationProgress {
    pub fn new(current_chapter: usize, total_chapters: usize) -> Self {
        let progress_percent = if total_chapters > 0 {
            let percent = current_chapter as f64 / total_chapters as f64 * 100.0;
            (percent * 100.0).round() / 100.0
        } else {
            0.0
        };

        Self {
            current_chapter,
            total_chapters,
            progress_percent,
            status: format!("Processing chapter {} of {}", current_chapter, total_chapters),
        }
    }
}

/// What happened to one chapter file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChapterOutcome {
    Translated { filename: String },
    /// Copied as is because the novel is already in the target language
    Unchanged { filename: String },
    /// Translation failed; the original file was copied instead
    Fallback { filename: String, cause: String },
}

impl ChapterOutcome {
    pub fn filename(&self) -> &str {
        match self {
            ChapterOutcome::Translated { filename }
            | ChapterOutcome::Unchanged { filename }
            | ChapterOutcome::Fallback { filename, .. } => filename,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ChapterOutcome::Fallback { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NovelReport {
    pub job_id: Uuid,
    pub output_path: PathBuf,
    pub source_lang: String,
    pub target_lang: String,
    pub outcomes: Vec<ChapterOutcome>,
    pub glossary_stats: GlossaryStatistics,
}

impl NovelReport {
    /// Filenames of chapters that fell back to their original text
    pub fn failed_chapters(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_failure())
            .map(ChapterOutcome::filename)
            .collect()
    }

    pub fn translated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, ChapterOutcome::Translated { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NovelValidation {
    pub valid: bool,
    pub message: String,
    pub chapter_count: usize,
}

impl NovelValidation {
    fn invalid(message: impl Into<String>, chapter_count: usize) -> Self {
        Self {
            valid: false,
            message: message.into(),
            chapter_count,
        }
    }
}

/// A discovered chapter: its bare filename and location on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFile {
    pub filename: String,
    pub path: PathBuf,
}

pub type ProgressCallback = Box<dyn Fn(&TranslationProgress) + Send + Sync>;

pub struct NovelOrchestrator {
    config: Config,
    detector: LanguageDetector,
    translator: Box<dyn ChapterTranslator>,
    progress: Option<ProgressCallback>,
}

impl NovelOrchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            detector: LanguageDetector::new(&config.detect),
            translator: Box::new(ChapterPipeline::new(&config)),
            progress: None,
            config,
        }
    }

    pub fn with_detector(mut self, detector: LanguageDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_translator(mut self, translator: Box<dyn ChapterTranslator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TranslationProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Translate every chapter of `archive_path` into `target_lang`.
    ///
    /// Returns a report whose `output_path` names the new archive. A missing or
    /// corrupt archive and an archive without chapters are errors; failing
    /// chapters are not.
    pub async fn translate_novel(&self, archive_path: &Path, target_lang: &str) -> Result<NovelReport> {
        let job_id = Uuid::new_v4();
        let span = info_span!("novel_job", job_id = %job_id);

        async {
            info!("Starting novel translation: {} -> {}", archive_path.display(), target_lang);
            let result = self.run_job(job_id, archive_path, target_lang).await;
            if let Err(e) = &result {
                warn!("Novel translation failed: {}", e);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_job(&self, job_id: Uuid, archive_path: &Path, target_lang: &str) -> Result<NovelReport> {
        // Removed on drop, whichever way the job ends
        let workspace = tempfile::Builder::new().prefix("honyaku-").tempdir()?;
        let extract_dir = workspace.path().join("extracted");
        let output_dir = workspace.path().join("translated");
        std::fs::create_dir_all(&output_dir)?;

        extract_blocking(archive_path, &extract_dir).await?;
        info!("Extracted novel to: {}", extract_dir.display());

        let chapter_files = get_chapter_files(&extract_dir);
        if chapter_files.is_empty() {
            return Err(HonyakuError::NoChapters(archive_path.display().to_string()));
        }

        let source_lang = self.analyze_novel_languages(&chapter_files);
        let mut glossary = Glossary::with_options(GlossaryOptions::from(&self.config.glossary));

        let outcomes = if source_lang == target_lang {
            info!("Source and target languages are the same. Creating copy.");
            textio::copy_tree(&extract_dir, &output_dir)?;
            chapter_files
                .iter()
                .map(|chapter| ChapterOutcome::Unchanged { filename: chapter.filename.clone() })
                .collect()
        } else {
            self.build_novel_glossary(&chapter_files, &mut glossary);
            let outcomes = self
                .translate_chapters(&chapter_files, &extract_dir, &output_dir, &source_lang, target_lang, &mut glossary)
                .await?;

            if let Some(snapshot) = &self.config.novel.glossary_snapshot {
                if let Err(e) = glossary.save(snapshot) {
                    warn!("Failed to save job glossary to {}: {}", snapshot.display(), e);
                }
            }
            outcomes
        };

        let packed = workspace.path().join("translated_novel.zip");
        create_blocking(&output_dir, &packed).await?;

        let output_path = self.output_path_for(archive_path, target_lang);
        textio::move_file(&packed, &output_path)?;
        info!("Novel translation completed: {}", output_path.display());

        Ok(NovelReport {
            job_id,
            output_path,
            source_lang,
            target_lang: target_lang.to_string(),
            outcomes,
            glossary_stats: glossary.get_statistics(),
        })
    }

    async fn translate_chapters(
        &self,
        chapter_files: &[ChapterFile],
        extract_dir: &Path,
        output_dir: &Path,
        source_lang: &str,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> Result<Vec<ChapterOutcome>> {
        let total = chapter_files.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, chapter) in chapter_files.iter().enumerate() {
            self.report_progress(i + 1, total);
            info!("Translating chapter {}/{}: {}", i + 1, total, chapter.filename);

            let relative = pathdiff::diff_paths(&chapter.path, extract_dir)
                .unwrap_or_else(|| PathBuf::from(&chapter.filename));
            let output_path = output_dir.join(relative);

            match self
                .translator
                .translate_to_file_from(&chapter.path, &output_path, source_lang, target_lang, glossary)
                .await
            {
                Ok(()) => outcomes.push(ChapterOutcome::Translated {
                    filename: chapter.filename.clone(),
                }),
                Err(e) => {
                    warn!("Translation failed for {}, using original: {}", chapter.filename, e);
                    textio::copy_file(&chapter.path, &output_path)?;
                    outcomes.push(ChapterOutcome::Fallback {
                        filename: chapter.filename.clone(),
                        cause: e.to_string(),
                    });
                }
            }
        }

        let failed: Vec<&str> = outcomes
            .iter()
            .filter(|outcome| outcome.is_failure())
            .map(ChapterOutcome::filename)
            .collect();
        if !failed.is_empty() {
            warn!("Failed to translate {} chapters: {:?}", failed.len(), failed);
        }

        Ok(outcomes)
    }

    fn read_chapter(&self, path: &Path) -> Result<String> {
        let text = &self.config.text;
        textio::read_text_with(path, &text.encoding, &text.fallback_encodings)
    }

    fn report_progress(&self, current: usize, total: usize) {
        if let Some(callback) = &self.progress {
            callback(&TranslationProgress::new(current, total));
        }
    }

    fn output_path_for(&self, archive_path: &Path, target_lang: &str) -> PathBuf {
        let stem = archive_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "novel".to_string());
        self.config
            .novel_output_dir()
            .join(format!("{}_{}.zip", stem, target_lang))
    }

    /// Most common detected language among the first few chapters.
    ///
    /// Unreadable samples are skipped; ties go to the language seen first.
    /// Falls back to English when nothing could be sampled.
    pub fn analyze_novel_languages(&self, chapter_files: &[ChapterFile]) -> String {
        let mut counts: Vec<(String, usize)> = Vec::new();

        for chapter in chapter_files.iter().take(self.config.novel.language_samples) {
            let text = match self.read_chapter(&chapter.path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Error analyzing language for {}: {}", chapter.filename, e);
                    continue;
                }
            };

            let sample: String = text.chars().take(LANGUAGE_SAMPLE_CHARS).collect();
            let detected = self.detector.detect(&sample);
            match counts.iter_mut().find(|(lang, _)| *lang == detected) {
                Some((_, count)) => *count += 1,
                None => counts.push((detected, 1)),
            }
        }

        let mut most_common: Option<(String, usize)> = None;
        for (lang, count) in counts {
            if most_common.as_ref().is_none_or(|(_, best)| count > *best) {
                most_common = Some((lang, count));
            }
        }

        match most_common {
            Some((lang, _)) => {
                info!("Detected novel language: {}", lang);
                lang
            }
            None => {
                warn!("Could not detect novel language, defaulting to '{}'", DEFAULT_LANGUAGE);
                DEFAULT_LANGUAGE.to_string()
            }
        }
    }

    /// Seed `glossary` with recurring capitalized words from a sample of
    /// chapters, each with an empty translation.
    ///
    /// Returns the number of candidate terms seen, seeded or not.
    pub fn build_novel_glossary(&self, chapter_files: &[ChapterFile], glossary: &mut Glossary) -> usize {
        info!("Building novel glossary for consistency...");

        let step = (chapter_files.len() / 5).max(1);
        let mut candidates: BTreeMap<&str, usize> = BTreeMap::new();
        let mut texts = Vec::new();

        for chapter in chapter_files.iter().step_by(step) {
            match self.read_chapter(&chapter.path) {
                Ok(text) => texts.push(text),
                Err(e) => warn!("Error processing {} for glossary: {}", chapter.filename, e),
            }
        }

        for word in texts.iter().flat_map(|text| text.split_whitespace()) {
            if is_proper_noun_candidate(word) {
                *candidates.entry(word).or_insert(0) += 1;
            }
        }

        for (term, count) in &candidates {
            if *count >= self.config.novel.min_term_occurrences {
                glossary.add_term(term, "", None);
            }
        }

        info!("Built glossary with {} potential terms", candidates.len());
        candidates.len()
    }

    /// Check that an archive looks like a novel: at least one chapter file,
    /// and not every chapter empty. Never fails; problems are reported in the
    /// returned message.
    pub async fn validate_novel_structure(&self, archive_path: &Path) -> NovelValidation {
        match self.inspect_archive(archive_path).await {
            Ok(validation) => validation,
            Err(e) => NovelValidation::invalid(format!("Error validating ZIP structure: {}", e), 0),
        }
    }

    async fn inspect_archive(&self, archive_path: &Path) -> Result<NovelValidation> {
        let scratch = tempfile::Builder::new().prefix("honyaku-validate-").tempdir()?;
        let extract_dir = scratch.path().join("validate");
        extract_blocking(archive_path, &extract_dir).await?;

        let chapter_files = get_chapter_files(&extract_dir);
        if chapter_files.is_empty() {
            return Ok(NovelValidation::invalid("No text files found in ZIP archive", 0));
        }

        let min_chars = self.config.novel.min_chapter_chars;
        let empty_files: Vec<&str> = chapter_files
            .iter()
            .filter(|chapter| match self.read_chapter(&chapter.path) {
                Ok(text) => text.trim().chars().count() < min_chars,
                Err(_) => true,
            })
            .map(|chapter| chapter.filename.as_str())
            .collect();

        if empty_files.len() == chapter_files.len() {
            return Ok(NovelValidation::invalid(
                "All files appear to be empty or unreadable",
                chapter_files.len(),
            ));
        }

        if !empty_files.is_empty() {
            warn!("Found {} empty/small files: {:?}", empty_files.len(), empty_files);
        }

        Ok(NovelValidation {
            valid: true,
            message: format!("Valid novel structure with {} chapters", chapter_files.len()),
            chapter_count: chapter_files.len(),
        })
    }
}

/// Every `.txt`/`.text` file under `directory`, ordered by bare filename
pub fn get_chapter_files<P: AsRef<Path>>(directory: P) -> Vec<ChapterFile> {
    let mut chapter_files: Vec<ChapterFile> = WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let filename = entry.file_name().to_string_lossy().into_owned();
            let lower = filename.to_lowercase();
            CHAPTER_EXTENSIONS
                .iter()
                .any(|ext| lower.ends_with(ext))
                .then(|| ChapterFile {
                    filename,
                    path: entry.into_path(),
                })
        })
        .collect();

    chapter_files.sort_by(|a, b| a.filename.cmp(&b.filename));

    info!("Found {} chapter files", chapter_files.len());
    chapter_files
}

fn is_proper_noun_candidate(word: &str) -> bool {
    word.chars().count() > 2 && word.chars().all(char::is_alphabetic) && is_title_word(word)
}

/// Title case: uppercase only after uncased characters, lowercase only after
/// cased ones, and at least one cased character.
fn is_title_word(word: &str) -> bool {
    let mut previous_cased = false;
    let mut any_cased = false;

    for c in word.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            any_cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            any_cased = true;
        } else {
            previous_cased = false;
        }
    }

    any_cased
}

async fn extract_blocking(archive_path: &Path, extract_dir: &Path) -> Result<usize> {
    let (archive_path, extract_dir) = (archive_path.to_path_buf(), extract_dir.to_path_buf());
    tokio::task::spawn_blocking(move || archive::extract_zip(&archive_path, &extract_dir)).await?
}

async fn create_blocking(folder: &Path, output: &Path) -> Result<usize> {
    let (folder, output) = (folder.to_path_buf(), output.to_path_buf());
    tokio::task::spawn_blocking(move || archive::create_zip(&folder, &output)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::StatisticalDetector;

    struct FixedDetector(&'static str);

    impl StatisticalDetector for FixedDetector {
        fn detect(&self, _text: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    /// Reports the first word of the sample as its language
    struct FirstWordDetector;

    impl StatisticalDetector for FirstWordDetector {
        fn detect(&self, text: &str) -> Result<String> {
            Ok(text.split_whitespace().next().unwrap_or("en").to_string())
        }
    }

    fn orchestrator() -> NovelOrchestrator {
        NovelOrchestrator::new(Config::default())
            .with_detector(LanguageDetector::with_statistical(Box::new(FixedDetector("en"))))
    }

    fn write_chapters(dir: &Path, chapters: &[(&str, &str)]) -> Vec<ChapterFile> {
        for (name, content) in chapters {
            textio::write_text(dir.join(name), content).unwrap();
        }
        get_chapter_files(dir)
    }

    #[test]
    fn test_progress() {
        let progress = TranslationProgress::new(1, 3);
        assert!((progress.progress_percent - 33.33).abs() < 1e-9);
        assert_eq!(progress.status, "Processing chapter 1 of 3");
        assert_eq!(TranslationProgress::new(0, 0).progress_percent, 0.0);
    }

    #[test]
    fn test_is_title_word() {
        assert!(is_title_word("Elena"));
        assert!(is_title_word("A"));
        assert!(!is_title_word("elena"));
        assert!(!is_title_word("ELENA"));
        assert!(!is_title_word("McDonald"));
        assert!(!is_title_word("東京"));
        assert!(is_proper_noun_candidate("Kai"));
        assert!(!is_proper_noun_candidate("Al"));
        assert!(!is_proper_noun_candidate("Elena,"));
    }

    #[test]
    fn test_chapter_files_sorted_by_filename_across_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_chapters(dir.path(), &[
            ("b/02.txt", "two"),
            ("a/03.TEXT", "three"),
            ("01.txt", "one"),
            ("cover.jpg", "binary"),
            ("notes.md", "skip"),
        ]);

        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["01.txt", "02.txt", "03.TEXT"]);
    }

    #[test]
    fn test_language_majority_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_chapters(dir.path(), &[
            ("01.txt", "fr un"),
            ("02.txt", "de zwei"),
            ("03.txt", "de drei"),
            ("04.txt", "fr vier"),
            ("05.txt", "fr fünf"),
        ]);

        let novel = NovelOrchestrator::new(Config::default())
            .with_detector(LanguageDetector::with_statistical(Box::new(FirstWordDetector)));

        // Only the first three chapters are sampled
        assert_eq!(novel.analyze_novel_languages(&files), "de");
        // One each: the first seen wins
        assert_eq!(novel.analyze_novel_languages(&files[..2]), "fr");

        let missing = vec![ChapterFile {
            filename: "gone.txt".to_string(),
            path: dir.path().join("gone.txt"),
        }];
        assert_eq!(novel.analyze_novel_languages(&missing), "en");
    }

    #[test]
    fn test_build_novel_glossary_seeds_recurring_names() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_chapters(dir.path(), &[
            ("01.txt", "Elena met Kai at the Harbor."),
            ("02.txt", "Elena waved. Kai smiled. Elena left."),
        ]);

        let mut glossary = Glossary::new();
        let candidates = orchestrator().build_novel_glossary(&files, &mut glossary);

        // Elena x3, Kai x2, Harbor. has punctuation
        assert_eq!(candidates, 2);
        assert!(glossary.has_term("Elena"));
        assert!(glossary.has_term("Kai"));
        assert_eq!(glossary.get_translation("Elena"), None);
        assert_eq!(glossary.get_usage_count("Elena"), 1);
    }

    #[test]
    fn test_report_helpers() {
        let report = NovelReport {
            job_id: Uuid::new_v4(),
            output_path: PathBuf::from("/tmp/novel_es.zip"),
            source_lang: "en".to_string(),
            target_lang: "es".to_string(),
            outcomes: vec![
                ChapterOutcome::Translated { filename: "01.txt".to_string() },
                ChapterOutcome::Fallback { filename: "02.txt".to_string(), cause: "boom".to_string() },
            ],
            glossary_stats: Glossary::new().get_statistics(),
        };

        assert_eq!(report.failed_chapters(), vec!["02.txt"]);
        assert_eq!(report.translated_count(), 1);
    }

    #[test]
    fn test_output_path_uses_archive_stem_and_target() {
        let mut config = Config::default();
        config.novel.output_dir = Some(PathBuf::from("/srv/out"));
        let novel = NovelOrchestrator::new(config);

        assert_eq!(
            novel.output_path_for(Path::new("/uploads/my_novel.zip"), "ja"),
            PathBuf::from("/srv/out/my_novel_ja.zip")
        );
    }

    #[tokio::test]
    async fn test_validate_reports_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let validation = orchestrator()
            .validate_novel_structure(&dir.path().join("missing.zip"))
            .await;

        assert!(!validation.valid);
        assert!(validation.message.starts_with("Error validating ZIP structure:"));
    }
}
