use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::error::{Result, RevoiceError};

/// Number of sample frames covering `seconds` at `sample_rate`, rounded to
/// the nearest frame.
pub fn frames_for(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).round() as usize
}

/// A mono PCM audio buffer, the unit the engine stretches and assembles.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A clip of zero samples covering `duration` seconds.
    pub fn silence(duration: f64, sample_rate: u32) -> Self {
        Self {
            samples: vec![0; frames_for(duration, sample_rate)],
            sample_rate,
        }
    }

    /// Decode a little-endian signed 16-bit PCM byte stream, as returned by
    /// the synthesis API's raw PCM output format. A trailing odd byte is
    /// dropped.
    pub fn from_pcm_bytes(bytes: &[u8], sample_rate: u32) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len_frames(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn append(&mut self, other: &AudioClip) -> Result<()> {
        if other.sample_rate != self.sample_rate {
            return Err(RevoiceError::UnsupportedFormat(format!(
                "Sample rate mismatch: {} vs {}",
                self.sample_rate, other.sample_rate
            )));
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Read a WAV file into a clip. Multi-channel input is downmixed to mono
    /// by averaging channels; float samples are rejected.
    pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();

        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(RevoiceError::UnsupportedFormat(format!(
                "Expected 16-bit integer PCM, got {:?} {} bits in {}",
                spec.sample_format,
                spec.bits_per_sample,
                path.display()
            )));
        }

        let channels = spec.channels as usize;
        let raw: Vec<i16> = reader
            .samples::<i16>()
            .collect::<std::result::Result<_, _>>()?;

        let samples = if channels == 1 {
            raw
        } else {
            raw.chunks(channels)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / channels as i32) as i16
                })
                .collect()
        };

        debug!(
            "Read WAV {}: {} frames at {} Hz",
            path.display(),
            samples.len(),
            spec.sample_rate
        );

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    /// Write the clip as 16-bit mono PCM WAV.
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path.as_ref(), spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        Ok(())
    }
}
