use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{placeholder_translation, BackendProvider, PlaceholderBackend, TranslationBackend};
use crate::config::BackendConfig;
use crate::detect::get_language_name;
use crate::error::{HonyakuError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Backend performing real inference against an Ollama server
pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(config: &BackendConfig, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one generate call; errors are left to the caller
    async fn generate(&self, unit: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: build_translation_prompt(unit, source_lang, target_lang),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HonyakuError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(HonyakuError::Translation(format!(
                "Ollama API error {}: {}", status, error_text
            )));
        }

        let generated: GenerateResponse = response.json().await
            .map_err(|e| HonyakuError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw_response = generated.response.trim();
        debug!("Raw Ollama response: {}", raw_response);

        if raw_response.is_empty() {
            return Err(HonyakuError::Translation("Empty translation received".to_string()));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(raw_response) {
            let text = result.text.trim();
            if text.is_empty() {
                return Err(HonyakuError::Translation("Empty translation received".to_string()));
            }
            return Ok(text.to_string());
        }

        Ok(clean_translation_response(raw_response))
    }
}

#[async_trait]
impl TranslationBackend for OllamaBackend {
    async fn translate(&self, unit: &str, source_lang: &str, target_lang: &str) -> String {
        match self.generate(unit, source_lang, target_lang).await {
            Ok(translation) => translation,
            Err(e) => {
                warn!("Translation with model '{}' failed, using placeholder: {}", self.model, e);
                placeholder_translation(unit, target_lang)
            }
        }
    }
}

/// Provider that routes language pairs to Ollama models.
///
/// Availability is checked once per model name for the provider's lifetime.
pub struct OllamaProvider {
    config: BackendConfig,
    availability: Mutex<HashMap<String, bool>>,
}

impl OllamaProvider {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            availability: Mutex::new(HashMap::new()),
        }
    }

    /// English sources use the en→many model, everything else many→en
    pub fn route_model(&self, source_lang: &str) -> &str {
        if source_lang == "en" {
            &self.config.en_to_many_model
        } else {
            &self.config.many_to_en_model
        }
    }

    async fn is_available(&self, model: &str) -> bool {
        let mut availability = self.availability.lock().await;
        if let Some(&available) = availability.get(model) {
            return available;
        }

        let available = match check_ollama_availability(&self.config.endpoint, model).await {
            Ok(()) => true,
            Err(e) => {
                warn!("{}. Using placeholder translation.", e);
                false
            }
        };
        availability.insert(model.to_string(), available);
        available
    }
}

#[async_trait]
impl BackendProvider for OllamaProvider {
    async fn resolve(&self, source_lang: &str, target_lang: &str) -> Arc<dyn TranslationBackend> {
        let model = self.route_model(source_lang).to_string();

        if !self.is_available(&model).await {
            return Arc::new(PlaceholderBackend);
        }

        match OllamaBackend::new(&self.config, &model) {
            Ok(backend) => {
                info!("Using model '{}' for {} -> {}", model, source_lang, target_lang);
                Arc::new(backend)
            }
            Err(e) => {
                warn!("Failed to create Ollama client: {}. Using placeholder translation.", e);
                Arc::new(PlaceholderBackend)
            }
        }
    }
}

/// Check if Ollama is available and the model is loaded
pub async fn check_ollama_availability(endpoint: &str, model: &str) -> Result<()> {
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let url = format!("{}/api/show", endpoint.trim_end_matches('/'));

    let request = json!({
        "name": model
    });

    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .map_err(|e| HonyakuError::Translation(format!("Failed to connect to Ollama: {}", e)))?;

    if response.status().is_success() {
        info!("Ollama model '{}' is available", model);
        Ok(())
    } else {
        Err(HonyakuError::Translation(format!(
            "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
            model, model
        )))
    }
}

/// Build translation prompt, asking for JSON output
fn build_translation_prompt(text: &str, source_lang: &str, target_lang: &str) -> String {
    let source_name = get_language_name(source_lang);
    let target_name = get_language_name(target_lang);

    format!(
        "You are a professional literary translator.\n\
         \n\
         CRITICAL: Translate the text from {} to {} ONLY. Do not translate to any other language.\n\
         The target language is: {} (language code: {})\n\
         Keep names, tone and paragraph structure of the original.\n\
         \n\
         Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
         Do not include any explanations, alternatives, or text in other languages.\n\
         \n\
         [Text to translate]\n\
         {}\n",
        source_name, target_name, target_name, target_lang, target_name, text
    )
}

/// Pull the translation out of a free-form response
fn clean_translation_response(response: &str) -> String {
    let lines: Vec<&str> = response.lines().collect();

    for &line in &lines {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("Here is") ||
           trimmed.starts_with("Here are") ||
           trimmed.starts_with("Translation:") ||
           trimmed.starts_with("Option") ||
           trimmed.starts_with("**Option") {
            continue;
        }

        if trimmed.starts_with("**") && trimmed.ends_with("**") {
            continue;
        }

        if trimmed.chars().count() > 3 {
            return trimmed.to_string();
        }
    }

    lines
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .unwrap_or(response)
        .to_string()
}
