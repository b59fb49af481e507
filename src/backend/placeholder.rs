use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{placeholder_translation, BackendProvider, TranslationBackend};

/// Backend used when no model can be reached
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderBackend;

#[async_trait]
impl TranslationBackend for PlaceholderBackend {
    async fn translate(&self, unit: &str, _source_lang: &str, target_lang: &str) -> String {
        placeholder_translation(unit, target_lang)
    }
}

/// Provider that never resolves a real model
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderProvider;

#[async_trait]
impl BackendProvider for PlaceholderProvider {
    async fn resolve(&self, source_lang: &str, target_lang: &str) -> Arc<dyn TranslationBackend> {
        debug!("Using placeholder backend for {} -> {}", source_lang, target_lang);
        Arc::new(PlaceholderBackend)
    }
}
