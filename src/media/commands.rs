use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::error::{Result, RevoiceError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy video stream
    pub fn copy_video(self) -> Self {
        self.video_codec("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Map a stream from an input
    pub fn map<S: Into<String>>(self, stream: S) -> Self {
        self.arg("-map").arg(stream)
    }

    /// Execute the command, capturing output
    pub async fn execute(&self) -> Result<std::process::Output> {
        debug!(
            "Executing media processing command: {} {:?}",
            self.binary_path, self.args
        );
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args);

        let output = cmd
            .output()
            .map_err(|e| RevoiceError::Media(format!("Failed to execute media processor: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RevoiceError::Media(format!(
                "{} failed: {}",
                self.description, stderr
            )));
        }

        Ok(output)
    }
}

/// Builder for common media processing operations
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build audio extraction command (mono PCM WAV)
    pub fn extract_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        sample_rate: u32,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(sample_rate)
            .audio_channels(1)
            .overwrite()
            .output(audio_path)
    }

    /// Build audio replacement command: video stream from the first input is
    /// copied untouched, the second input becomes the only audio track.
    pub fn replace_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        output_path: P,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio replacement")
            .overwrite()
            .input(video_path)
            .input(audio_path)
            .map("0:v:0")
            .map("1:a:0")
            .copy_video()
            .audio_codec("aac")
            .arg("-shortest")
            .output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }
}
