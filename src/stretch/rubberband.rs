use async_trait::async_trait;
use std::process::Command;
use tracing::debug;

use crate::audio::AudioClip;
use crate::config::StretchConfig;
use crate::error::{Result, RevoiceError};

use super::TimeStretcher;

/// Time stretcher backed by the rubberband CLI, which performs
/// pitch-preserving time-scale modification on WAV files.
pub struct RubberbandStretcher {
    config: StretchConfig,
}

impl RubberbandStretcher {
    pub fn new(config: StretchConfig) -> Self {
        Self { config }
    }

    /// Check that the rubberband binary can be executed.
    pub fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("--version")
            .output()
            .map_err(|e| RevoiceError::Stretch(format!("rubberband not found: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(RevoiceError::Stretch(
                "rubberband version check failed".to_string(),
            ))
        }
    }
}

#[async_trait]
impl TimeStretcher for RubberbandStretcher {
    async fn stretch(&self, clip: &AudioClip, ratio: f64) -> Result<AudioClip> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(RevoiceError::Stretch(format!(
                "Invalid stretch ratio: {}",
                ratio
            )));
        }

        let dir = tempfile::tempdir()?;
        let input_path = dir.path().join("in.wav");
        let output_path = dir.path().join("out.wav");

        clip.write_wav(&input_path)?;

        debug!(
            "Running {} -t {:.6} on {:.3}s clip",
            self.config.binary_path,
            ratio,
            clip.duration_secs()
        );

        let output = Command::new(&self.config.binary_path)
            .arg("-t")
            .arg(format!("{:.6}", ratio))
            .arg(&input_path)
            .arg(&output_path)
            .output()
            .map_err(|e| RevoiceError::Stretch(format!("Failed to execute rubberband: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RevoiceError::Stretch(format!(
                "rubberband failed: {}",
                stderr
            )));
        }

        AudioClip::read_wav(&output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_ratio_is_rejected_before_subprocess() {
        let stretcher = RubberbandStretcher::new(StretchConfig {
            binary_path: "rubberband".to_string(),
            min_ratio: 0.5,
            max_ratio: 2.0,
            tolerance: 0.01,
        });

        let clip = AudioClip::silence(1.0, 44_100);
        for bad in [0.0, -1.5, f64::NAN] {
            assert!(stretcher.stretch(&clip, bad).await.is_err());
        }
    }
}
