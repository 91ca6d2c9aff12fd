// Speech synthesis subsystem
//
// The pipeline consumes synthesis through a trait so the HTTP voice-cloning
// service stays a swappable collaborator. Synthesized clip durations are
// unconstrained; fitting them to the timeline is the stretch subsystem's job.

pub mod elevenlabs;

use async_trait::async_trait;

use crate::audio::{AudioClip, frames_for};
use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::segment::Segment;

/// External text-to-speech service with voice cloning.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize speech for `text` with the given voice.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioClip>;

    /// Clone a voice from sample clips, returning the new voice id.
    async fn clone_voice(&self, name: &str, samples: &[AudioClip]) -> Result<String>;
}

/// Factory for creating synthesizer instances
pub struct SynthesizerFactory;

impl SynthesizerFactory {
    /// Create the default synthesizer implementation (ElevenLabs-based)
    pub fn create_default(config: SynthesisConfig) -> Box<dyn Synthesizer> {
        Box::new(elevenlabs::ElevenLabsSynthesizer::new(config))
    }
}

/// Extract voice samples for cloning from the original audio.
///
/// The longest segments give the best voice sample, so segments are ranked
/// by duration and the top `max_samples` spans are cut from the clip.
pub fn prepare_voice_samples(
    audio: &AudioClip,
    segments: &[Segment],
    max_samples: usize,
) -> Vec<AudioClip> {
    let mut ranked: Vec<&Segment> = segments.iter().collect();
    ranked.sort_by(|a, b| {
        b.duration()
            .partial_cmp(&a.duration())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
        .into_iter()
        .take(max_samples)
        .filter_map(|segment| {
            let start = frames_for(segment.start, audio.sample_rate).min(audio.len_frames());
            let end = frames_for(segment.end, audio.sample_rate).min(audio.len_frames());
            if start >= end {
                return None;
            }
            Some(AudioClip::new(
                audio.samples[start..end].to_vec(),
                audio.sample_rate,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_come_from_longest_segments() {
        let audio = AudioClip::new((0..10_000).map(|i| i as i16).collect(), 1_000);
        let segments = vec![
            Segment::new(0, 0.0, 1.0, "short"),
            Segment::new(1, 2.0, 6.0, "longest segment"),
            Segment::new(2, 7.0, 9.0, "middle one"),
        ];

        let samples = prepare_voice_samples(&audio, &segments, 2);
        assert_eq!(samples.len(), 2);
        // Longest first: 4s then 2s
        assert_eq!(samples[0].len_frames(), 4_000);
        assert_eq!(samples[0].samples[0], 2_000);
        assert_eq!(samples[1].len_frames(), 2_000);
    }

    #[test]
    fn test_segments_past_audio_end_are_skipped() {
        let audio = AudioClip::new(vec![1; 1_000], 1_000);
        let segments = vec![
            Segment::new(0, 0.0, 0.5, "inside"),
            Segment::new(1, 5.0, 9.0, "entirely past the end"),
        ];

        let samples = prepare_voice_samples(&audio, &segments, 3);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].len_frames(), 500);
    }

    #[test]
    fn test_max_samples_zero_yields_nothing() {
        let audio = AudioClip::new(vec![1; 1_000], 1_000);
        let segments = vec![Segment::new(0, 0.0, 0.5, "inside")];
        assert!(prepare_voice_samples(&audio, &segments, 0).is_empty());
    }
}
