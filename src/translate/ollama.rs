use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, RevoiceError};

use super::Translator;

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TranslationResult {
    text: String,
}

/// Translator backed by a local Ollama LLM, requesting JSON-format output.
pub struct OllamaTranslator {
    client: Client,
    config: TranslateConfig,
}

impl OllamaTranslator {
    pub fn new(config: TranslateConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, config }
    }

    async fn request_translation(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RevoiceError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RevoiceError::Translation(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RevoiceError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw = parsed.response.trim().to_string();
        if raw.is_empty() {
            return Err(RevoiceError::Translation(
                "Empty translation received".to_string(),
            ));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(&raw) {
            return Ok(result.text.trim().to_string());
        }

        // Model ignored the JSON format instruction; use the raw text
        Ok(raw.trim_matches('"').to_string())
    }

    fn build_prompt(&self, text: &str, source_lang: &str, target_lang: &str) -> String {
        format!(
            "You are a professional translator.\n\
             \n\
             CRITICAL: You must translate the text from {} to {} ONLY. \
             Do not translate to any other language.\n\
             \n\
             Return ONLY the translation in JSON format as {{\"text\":\"your translation here\"}}.\n\
             Do not include any explanations, alternatives, or text in other languages.\n\
             \n\
             Text to translate: \"{}\"\n",
            source_lang, target_lang, text
        )
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String> {
        let prompt = self.build_prompt(text, source_lang, target_lang);

        let mut last_error = None;
        for attempt in 1..=self.config.max_retries.max(1) {
            match self.request_translation(&prompt).await {
                Ok(translation) if !translation.is_empty() => return Ok(translation),
                Ok(_) => {
                    warn!("Attempt {}: empty translation, retrying", attempt);
                    last_error = Some(RevoiceError::Translation(
                        "Empty translation received".to_string(),
                    ));
                }
                Err(e) => {
                    warn!("Attempt {}: translation failed: {}", attempt, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RevoiceError::Translation("Translation failed".to_string())))
    }
}

/// Check if Ollama is reachable and the configured model is present.
pub async fn check_ollama_availability(endpoint: &str, model: &str) -> Result<()> {
    #[derive(Deserialize)]
    struct TagsResponse {
        #[serde(default)]
        models: Vec<ModelTag>,
    }

    #[derive(Deserialize)]
    struct ModelTag {
        name: String,
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("HTTP client creation should not fail");

    let url = format!("{}/api/tags", endpoint);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| RevoiceError::Translation(format!("Ollama not reachable at {}: {}", endpoint, e)))?;

    if !response.status().is_success() {
        return Err(RevoiceError::Translation(format!(
            "Ollama returned {} for {}",
            response.status(),
            url
        )));
    }

    let tags: TagsResponse = response
        .json()
        .await
        .map_err(|e| RevoiceError::Translation(format!("Failed to parse Ollama tags: {}", e)))?;

    let available = tags
        .models
        .iter()
        .any(|m| m.name == model || m.name.starts_with(&format!("{}:", model)));

    if available {
        Ok(())
    } else {
        Err(RevoiceError::Translation(format!(
            "Model '{}' is not loaded in Ollama",
            model
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_both_languages() {
        let translator = OllamaTranslator::new(TranslateConfig {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            max_retries: 3,
        });

        let prompt = translator.build_prompt("Hello world", "en", "de");
        assert!(prompt.contains("from en to de"));
        assert!(prompt.contains("Hello world"));
        assert!(prompt.contains("JSON format"));
    }

    #[test]
    fn test_translation_result_parses_json_payload() {
        let raw = r#"{"text": " Hallo Welt "}"#;
        let parsed: TranslationResult = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text.trim(), "Hallo Welt");
    }
}
