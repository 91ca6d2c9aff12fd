// Translation subsystem
//
// Translation is a per-segment collaborator: a failed call never fails the
// run, the segment keeps its source text and the fallback is surfaced in the
// run summary.

pub mod ollama;

use async_trait::async_trait;

pub use ollama::check_ollama_availability;

use crate::config::TranslateConfig;
use crate::error::Result;

/// External translation service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_lang` to `target_lang`.
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str)
    -> Result<String>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the default translator implementation (Ollama-based)
    pub fn create_default(config: TranslateConfig) -> Box<dyn Translator> {
        Box::new(ollama::OllamaTranslator::new(config))
    }
}
