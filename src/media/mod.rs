// Media processing architecture
//
// Wraps the ffmpeg/ffprobe binaries behind a trait so the pipeline never
// touches container formats directly. Video is never re-encoded: the remux
// step copies the visual stream and only encodes the replacement audio.

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Extract the audio track as mono PCM WAV at the given sample rate
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        sample_rate: u32,
    ) -> Result<()>;

    /// Replace the video's audio track without re-encoding the video stream
    async fn replace_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Container duration in seconds
    async fn probe_duration(&self, media_path: &Path) -> Result<f64>;

    /// Check if the media processor binaries are available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessor> {
        Box::new(processor::FfmpegProcessor::new(config))
    }
}
