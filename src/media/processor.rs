use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, RevoiceError};

use super::{MediaCommandBuilder, MediaProcessor};

/// Concrete media processor backed by ffmpeg and ffprobe.
pub struct FfmpegProcessor {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegProcessor {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        sample_rate: u32,
    ) -> Result<()> {
        info!(
            "Extracting audio from {} to {}",
            video_path.display(),
            audio_path.display()
        );

        let command = self
            .command_builder
            .extract_audio(video_path, audio_path, sample_rate);
        command.execute().await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn replace_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Replacing audio of {} with {} -> {}",
            video_path.display(),
            audio_path.display(),
            output_path.display()
        );

        let command = self
            .command_builder
            .replace_audio(video_path, audio_path, output_path);
        command.execute().await?;

        info!("Audio replacement completed");
        Ok(())
    }

    async fn probe_duration(&self, media_path: &Path) -> Result<f64> {
        debug!("Probing duration of {}", media_path.display());

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(media_path)
            .output()
            .map_err(|e| RevoiceError::Media(format!("Failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RevoiceError::Media(format!("ffprobe failed: {}", stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<f64>()
            .map_err(|_| RevoiceError::Media(format!("Unparsable duration: {}", stdout.trim())))
    }

    fn check_availability(&self) -> Result<()> {
        for binary in [&self.config.binary_path, &self.config.ffprobe_path] {
            let output = Command::new(binary)
                .arg("-version")
                .output()
                .map_err(|e| RevoiceError::Media(format!("{} not found: {}", binary, e)))?;

            if !output.status.success() {
                return Err(RevoiceError::Media(format!(
                    "{} version check failed",
                    binary
                )));
            }
        }

        info!("Media processor is available");
        Ok(())
    }
}
