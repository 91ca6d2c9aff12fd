use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::audio::AudioClip;
use crate::config::SynthesisConfig;
use crate::error::{Result, RevoiceError};

use super::Synthesizer;

#[derive(Debug, Deserialize)]
struct CloneVoiceResponse {
    voice_id: String,
}

/// Text-to-speech client for the ElevenLabs API.
///
/// Requests raw PCM output at the pipeline sample rate so clips go straight
/// into the stretch and assembly stages without a decode step.
pub struct ElevenLabsSynthesizer {
    client: Client,
    config: SynthesisConfig,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, config }
    }

    fn api_key(&self) -> Result<String> {
        std::env::var(&self.config.api_key_env).map_err(|_| {
            RevoiceError::Synthesis(format!(
                "{} not found in environment",
                self.config.api_key_env
            ))
        })
    }

    fn output_format(&self) -> String {
        format!("pcm_{}", self.config.sample_rate)
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioClip> {
        let api_key = self.api_key()?;

        let url = format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.config.endpoint,
            voice_id,
            self.output_format()
        );

        let body = json!({
            "text": text,
            "model_id": self.config.model,
            "voice_settings": {
                "stability": self.config.stability,
                "similarity_boost": self.config.similarity_boost,
                "style": self.config.style,
                "use_speaker_boost": self.config.speaker_boost,
            }
        });

        debug!("Synthesizing {} characters with voice {}", text.len(), voice_id);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(RevoiceError::Synthesis(format!(
                "Synthesis API call failed with {}: {}",
                status, detail
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(RevoiceError::Synthesis(
                "Synthesis API returned no audio".to_string(),
            ));
        }

        let clip = AudioClip::from_pcm_bytes(&bytes, self.config.sample_rate);
        debug!("Synthesized {:.2}s of audio", clip.duration_secs());

        Ok(clip)
    }

    async fn clone_voice(&self, name: &str, samples: &[AudioClip]) -> Result<String> {
        let api_key = self.api_key()?;

        if samples.is_empty() {
            return Err(RevoiceError::Synthesis(
                "Voice cloning requires at least one sample".to_string(),
            ));
        }

        let mut form = Form::new().text("name", name.to_string());
        for (i, sample) in samples.iter().enumerate() {
            let dir = tempfile::tempdir()?;
            let path = dir.path().join(format!("voice_sample_{:02}.wav", i));
            sample.write_wav(&path)?;
            let bytes = tokio::fs::read(&path).await?;
            form = form.part(
                "files",
                Part::bytes(bytes).file_name(format!("voice_sample_{:02}.wav", i)),
            );
        }

        let url = format!("{}/v1/voices/add", self.config.endpoint);
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(RevoiceError::Synthesis(format!(
                "Voice cloning failed with {}: {}",
                status, detail
            )));
        }

        let parsed: CloneVoiceResponse = response.json().await?;
        info!("Voice cloned successfully: {}", parsed.voice_id);

        Ok(parsed.voice_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SynthesisConfig {
        SynthesisConfig {
            endpoint: "https://example.com".to_string(),
            api_key_env: "REVOICE_TEST_SYNTH_KEY_UNSET".to_string(),
            model: "eleven_multilingual_v2".to_string(),
            voice_id: "v".to_string(),
            stability: 0.5,
            similarity_boost: 0.8,
            style: 0.4,
            speaker_boost: true,
            sample_rate: 44_100,
            max_voice_samples: 3,
        }
    }

    #[test]
    fn test_output_format_tracks_sample_rate() {
        let synthesizer = ElevenLabsSynthesizer::new(config());
        assert_eq!(synthesizer.output_format(), "pcm_44100");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_reported() {
        let synthesizer = ElevenLabsSynthesizer::new(config());
        let err = synthesizer.synthesize("Hallo", "v").await.unwrap_err();
        assert!(matches!(err, RevoiceError::Synthesis(_)));
    }
}
