use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AlignmentConfig;
use crate::error::{Result, RevoiceError};
use crate::segment::Word;

use super::ForcedAligner;

#[derive(Debug, Deserialize)]
struct AlignmentResponse {
    #[serde(default)]
    words: Vec<AlignedWord>,
}

#[derive(Debug, Deserialize)]
struct AlignedWord {
    text: String,
    start: f64,
    end: f64,
}

/// Forced-alignment client for the ElevenLabs API.
pub struct ElevenLabsAligner {
    client: Client,
    config: AlignmentConfig,
}

impl ElevenLabsAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, config }
    }

    fn api_key(&self) -> Result<String> {
        std::env::var(&self.config.api_key_env).map_err(|_| {
            RevoiceError::Alignment(format!(
                "{} not found in environment",
                self.config.api_key_env
            ))
        })
    }
}

#[async_trait]
impl ForcedAligner for ElevenLabsAligner {
    async fn align(&self, audio_path: &Path, transcript: &str) -> Result<Vec<Word>> {
        let api_key = self.api_key()?;

        let audio_bytes = tokio::fs::read(audio_path).await?;
        debug!(
            "Requesting forced alignment for {} ({} bytes of audio)",
            audio_path.display(),
            audio_bytes.len()
        );

        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".to_string());

        let form = Form::new()
            .text("text", transcript.to_string())
            .part("file", Part::bytes(audio_bytes).file_name(file_name));

        let url = format!("{}/v1/forced-alignment", self.config.endpoint);
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RevoiceError::Alignment(format!(
                "Forced alignment API call failed with {}: {}",
                status, body
            )));
        }

        let parsed: AlignmentResponse = response.json().await?;
        info!("Forced alignment returned {} words", parsed.words.len());

        Ok(parsed
            .words
            .into_iter()
            .map(|w| Word {
                text: w.text,
                start: w.start,
                end: w.end,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing_ignores_extra_fields() {
        let body = r#"{
            "words": [
                {"text": "Hello", "start": 0.0, "end": 0.5, "loss": 0.01},
                {"text": "world", "start": 0.6, "end": 1.1, "loss": 0.02}
            ],
            "loss": 0.015
        }"#;

        let parsed: AlignmentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.words.len(), 2);
        assert_eq!(parsed.words[0].text, "Hello");
        assert_eq!(parsed.words[1].end, 1.1);
    }

    #[test]
    fn test_missing_words_field_is_empty() {
        let parsed: AlignmentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.words.is_empty());
    }
}
