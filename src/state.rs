//! Application state management

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, StructuredProvider};
use crate::extract::ExtractionService;
use crate::ocr::{TesseractRecognizer, TextRecognizer};
use crate::structured::{OllamaExtractor, OpenAiExtractor, StructuredExtractor};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    extraction: ExtractionService,
}

impl AppState {
    /// Build the state from configuration
    ///
    /// Creates the Tesseract recognizer and, when a provider is configured,
    /// the structured extractor client.
    pub fn new(config: Config) -> Self {
        let recognizer: Arc<dyn TextRecognizer> =
            Arc::new(TesseractRecognizer::new(config.ocr.clone()));

        let extractor: Option<Arc<dyn StructuredExtractor>> = match config.structured.provider {
            StructuredProvider::None => None,
            StructuredProvider::Ollama => Some(Arc::new(OllamaExtractor::new(
                &config.structured.url,
                &config.structured.model,
            ))),
            StructuredProvider::OpenAi => Some(Arc::new(OpenAiExtractor::new(
                &config.structured.url,
                &config.structured.model,
                config.structured.api_key.clone(),
            ))),
        };

        let mut service = ExtractionService::new(config.extraction.clone(), recognizer);
        if let Some(extractor) = extractor {
            service = service.with_extractor(
                extractor,
                Duration::from_secs(config.structured.timeout_secs),
            );
        }

        Self::with_service(config, service)
    }

    /// Build the state around an existing extraction service
    pub fn with_service(config: Config, extraction: ExtractionService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, extraction }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the extraction service
    pub fn extraction(&self) -> &ExtractionService {
        &self.inner.extraction
    }
}
