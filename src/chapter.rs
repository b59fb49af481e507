// Chapter translation pipeline
//
// detect -> chunk -> (glossary lookup | backend translate + glossary commit)
// -> tone pass -> join, for a single chapter of text.

use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::backend::{BackendFactory, BackendProvider};
use crate::chunker::split_text_into_chunks;
use crate::config::Config;
use crate::detect::LanguageDetector;
use crate::error::Result;
use crate::glossary::Glossary;
use crate::textio;
use crate::tone::ToneProcessor;

/// Translates one chapter file against a caller-owned glossary
#[async_trait]
pub trait ChapterTranslator: Send + Sync {
    /// Read and translate a chapter, detecting its language first. A missing
    /// or undecodable file is an error; backend and tone problems are not.
    async fn translate_chapter(
        &self,
        path: &Path,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> Result<String>;

    /// Read and translate a chapter whose source language is already known
    async fn translate_chapter_from(
        &self,
        path: &Path,
        source_lang: &str,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> Result<String>;

    /// Translate a chapter and write the result to `output`
    async fn translate_to_file(
        &self,
        input: &Path,
        output: &Path,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> Result<()> {
        let translated = self.translate_chapter(input, target_lang, glossary).await?;
        textio::write_text(output, &translated)?;
        info!("Saved translated chapter: {}", output.display());
        Ok(())
    }

    /// [`ChapterTranslator::translate_to_file`] with a known source language
    async fn translate_to_file_from(
        &self,
        input: &Path,
        output: &Path,
        source_lang: &str,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> Result<()> {
        let translated = self
            .translate_chapter_from(input, source_lang, target_lang, glossary)
            .await?;
        textio::write_text(output, &translated)?;
        info!("Saved translated chapter: {}", output.display());
        Ok(())
    }

    /// Like [`ChapterTranslator::translate_to_file`], reporting failure as `false`
    async fn translate_and_save_chapter(
        &self,
        input: &Path,
        output: &Path,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> bool {
        match self.translate_to_file(input, output, target_lang, glossary).await {
            Ok(()) => true,
            Err(e) => {
                error!("Error translating and saving chapter {}: {}", input.display(), e);
                false
            }
        }
    }
}

pub struct ChapterPipeline {
    detector: LanguageDetector,
    provider: Box<dyn BackendProvider>,
    tone: Option<ToneProcessor>,
    tone_from_source: bool,
    max_chunk_size: usize,
    encoding: String,
    fallback_encodings: Vec<String>,
}

impl ChapterPipeline {
    pub fn new(config: &Config) -> Self {
        let tone = config.tone.enabled.then(|| ToneProcessor::new(&config.tone));

        Self {
            detector: LanguageDetector::new(&config.detect),
            provider: BackendFactory::create_provider(&config.backend),
            tone,
            tone_from_source: config.tone.score_source,
            max_chunk_size: config.chunking.max_chunk_size,
            encoding: config.text.encoding.clone(),
            fallback_encodings: config.text.fallback_encodings.clone(),
        }
    }

    pub fn with_detector(mut self, detector: LanguageDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_provider(mut self, provider: Box<dyn BackendProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_tone(mut self, tone: Option<ToneProcessor>) -> Self {
        self.tone = tone;
        self
    }

    /// Score tone on each source unit rather than on its translation
    pub fn with_tone_from_source(mut self, enabled: bool) -> Self {
        self.tone_from_source = enabled;
        self
    }

    /// Preferred encoding tried first when reading chapter files
    pub fn with_encoding(mut self, encoding: &str) -> Self {
        self.encoding = encoding.to_string();
        self
    }

    /// Encodings tried, in order, when the preferred one fails to decode
    pub fn with_fallback_encodings(mut self, fallbacks: Vec<String>) -> Self {
        self.fallback_encodings = fallbacks;
        self
    }

    /// Translate already-loaded text, detecting its language first.
    ///
    /// Blank text comes back as an empty string and text already in the
    /// target language comes back untouched; neither touches the glossary.
    pub async fn translate_text(&self, text: &str, target_lang: &str, glossary: &mut Glossary) -> String {
        if text.trim().is_empty() {
            warn!("Empty chapter text");
            return String::new();
        }

        let source_lang = self.detector.detect(text);
        info!("Detected source language: {}", source_lang);

        self.translate_text_from(text, &source_lang, target_lang, glossary).await
    }

    /// Translate already-loaded text from a known source language
    pub async fn translate_text_from(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> String {
        if text.trim().is_empty() {
            warn!("Empty chapter text");
            return String::new();
        }

        if source_lang == target_lang {
            info!("Source and target languages are the same. Returning original text.");
            return text.to_string();
        }

        let backend = self.provider.resolve(source_lang, target_lang).await;

        let chunks = split_text_into_chunks(text, self.max_chunk_size);
        info!("Split text into {} chunks", chunks.len());

        let mut translated_chunks = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            debug!("Translating chunk {}/{}", i + 1, chunks.len());

            let translated = match glossary.get_translation(chunk) {
                Some(known) => known.to_string(),
                None => {
                    let translated = backend.translate(chunk, source_lang, target_lang).await;
                    glossary.add_term(chunk, &translated, None);
                    translated
                }
            };

            translated_chunks.push(self.apply_tone(chunk, translated));
        }

        translated_chunks.join(" ")
    }

    fn read_chapter(&self, path: &Path) -> Result<String> {
        textio::read_text_with(path, &self.encoding, &self.fallback_encodings)
    }

    fn apply_tone(&self, source: &str, text: String) -> String {
        let Some(tone) = &self.tone else {
            return text;
        };

        if self.tone_from_source {
            return tone.preserve_from(source, &text);
        }

        match tone.enhance(&text) {
            Ok(enhanced) => enhanced,
            Err(e) => {
                warn!("Error applying tone pass: {}", e);
                text
            }
        }
    }
}

#[async_trait]
impl ChapterTranslator for ChapterPipeline {
    async fn translate_chapter(
        &self,
        path: &Path,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> Result<String> {
        info!("Starting chapter translation: {} -> {}", path.display(), target_lang);

        let original_text = self.read_chapter(path)?;
        let translated = self.translate_text(&original_text, target_lang, glossary).await;

        info!("Chapter translation completed: {}", path.display());
        Ok(translated)
    }

    async fn translate_chapter_from(
        &self,
        path: &Path,
        source_lang: &str,
        target_lang: &str,
        glossary: &mut Glossary,
    ) -> Result<String> {
        info!("Starting chapter translation: {} ({} -> {})", path.display(), source_lang, target_lang);

        let original_text = self.read_chapter(path)?;
        let translated = self
            .translate_text_from(&original_text, source_lang, target_lang, glossary)
            .await;

        info!("Chapter translation completed: {}", path.display());
        Ok(translated)
    }
}
