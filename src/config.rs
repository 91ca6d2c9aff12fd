use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, RevoiceError};

// Defaults for fields that were added after the initial config layout
fn default_min_coverage() -> f64 {
    0.5
}

fn default_fault_quorum() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub timing: TimingConfig,
    pub alignment: AlignmentConfig,
    pub stretch: StretchConfig,
    pub synthesis: SynthesisConfig,
    pub translate: TranslateConfig,
    pub media: MediaConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Segments with this many words or fewer are merged into the next one
    pub merge_word_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Forced-alignment API endpoint
    pub endpoint: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request word-level timing from the alignment service
    pub word_level: bool,
    /// Minimum fraction of a segment the aligned words must span
    #[serde(default = "default_min_coverage")]
    pub min_coverage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StretchConfig {
    /// Path to the rubberband binary
    pub binary_path: String,
    /// Lowest ratio considered safe for audio quality
    pub min_ratio: f64,
    /// Highest ratio considered safe for audio quality
    pub max_ratio: f64,
    /// Maximum relative duration error after stretching
    pub tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Synthesis API endpoint
    pub endpoint: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// TTS model identifier
    pub model: String,
    /// Default voice to synthesize with
    pub voice_id: String,
    /// Voice stability (0-1), lower values sound more emotional
    pub stability: f64,
    /// How closely to match a cloned voice (0-1)
    pub similarity_boost: f64,
    /// Style exaggeration (0-1)
    pub style: f64,
    /// Boost similarity to the original speaker
    pub speaker_boost: bool,
    /// Sample rate of the assembled track
    pub sample_rate: u32,
    /// Voice samples to extract when cloning
    pub max_voice_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Ollama endpoint URL
    pub endpoint: String,
    /// LLM model to use for translation
    pub model: String,
    /// Maximum retries for failed translations
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Concurrent synthesis requests in flight
    pub synthesis_concurrency: usize,
    /// Abort the run when this fraction of segments fails unrecoverably
    #[serde(default = "default_fault_quorum")]
    pub fault_quorum: f64,
    /// Duration mismatch (percent) above which the report flags the run
    pub mismatch_warn_percent: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: TimingConfig {
                merge_word_threshold: 5,
            },
            alignment: AlignmentConfig {
                endpoint: "https://api.elevenlabs.io".to_string(),
                api_key_env: "ELEVENLABS_API_KEY".to_string(),
                word_level: false,
                min_coverage: 0.5,
            },
            stretch: StretchConfig {
                binary_path: "rubberband".to_string(),
                min_ratio: 0.5,
                max_ratio: 2.0,
                tolerance: 0.01,
            },
            synthesis: SynthesisConfig {
                endpoint: "https://api.elevenlabs.io".to_string(),
                api_key_env: "ELEVENLABS_API_KEY".to_string(),
                model: "eleven_multilingual_v2".to_string(),
                voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
                stability: 0.5,
                similarity_boost: 0.8,
                style: 0.4,
                speaker_boost: true,
                sample_rate: 44_100,
                max_voice_samples: 3,
            },
            translate: TranslateConfig {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2:3b".to_string(),
                max_retries: 3,
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
            },
            pipeline: PipelineConfig {
                synthesis_concurrency: 4,
                fault_quorum: 0.5,
                mismatch_warn_percent: 5.0,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RevoiceError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| RevoiceError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RevoiceError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| RevoiceError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
