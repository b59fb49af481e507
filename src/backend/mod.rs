// Pluggable translation backends
//
// Backends are resolved once per (source, target) pair through a provider:
// - Ollama: real inference through a local Ollama server, degrading to the
//   placeholder when the routed model is unavailable
// - Placeholder: never calls a model, marks each unit with the target code

pub mod ollama;
pub mod placeholder;

use async_trait::async_trait;
use std::sync::Arc;

pub use ollama::{check_ollama_availability, OllamaBackend, OllamaProvider};
pub use placeholder::{PlaceholderBackend, PlaceholderProvider};
use crate::config::{BackendConfig, BackendKind};

/// Translate one unit of text. Implementations never fail: any problem is
/// reported as the placeholder translation for the unit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, unit: &str, source_lang: &str, target_lang: &str) -> String;
}

/// Resolves the backend used for a language pair
#[async_trait]
pub trait BackendProvider: Send + Sync {
    async fn resolve(&self, source_lang: &str, target_lang: &str) -> Arc<dyn TranslationBackend>;
}

/// Marked output used whenever no real translation is available
pub fn placeholder_translation(unit: &str, target_lang: &str) -> String {
    format!("[{}] {}", target_lang.to_uppercase(), unit)
}

/// Factory for creating backend providers
pub struct BackendFactory;

impl BackendFactory {
    /// Create a provider based on the configured backend kind
    pub fn create_provider(config: &BackendConfig) -> Box<dyn BackendProvider> {
        match config.kind {
            BackendKind::Ollama => Box::new(OllamaProvider::new(config.clone())),
            BackendKind::Placeholder => Box::new(PlaceholderProvider),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_placeholder_translation_format() {
        assert_eq!(placeholder_translation("Hello.", "es"), "[ES] Hello.");
        assert_eq!(placeholder_translation("", "zh"), "[ZH] ");
    }

    #[tokio::test]
    async fn test_factory_placeholder_kind() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::Placeholder;

        let provider = BackendFactory::create_provider(&config.backend);
        let backend = provider.resolve("en", "fr").await;
        assert_eq!(backend.translate("Bonjour", "en", "fr").await, "[FR] Bonjour");
    }

    #[tokio::test]
    async fn test_mock_backend_is_usable_as_trait_object() {
        let mut mock = MockTranslationBackend::new();
        mock.expect_translate()
            .withf(|unit, source, target| unit == "Hi." && source == "en" && target == "de")
            .times(1)
            .returning(|_, _, _| "Hallo.".to_string());

        let backend: Arc<dyn TranslationBackend> = Arc::new(mock);
        assert_eq!(backend.translate("Hi.", "en", "de").await, "Hallo.");
    }
}
