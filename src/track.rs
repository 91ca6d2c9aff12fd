use tracing::{debug, warn};

use crate::audio::{AudioClip, frames_for};
use crate::error::{Result, RevoiceError};
use crate::segment::StretchedSegment;

/// Reconstruct one continuous audio track from stretched segments.
///
/// Segments are consumed in strict index order. Before each segment, silence
/// is emitted up to the segment's nominal start frame, which both reproduces
/// the input gaps as exact zeros and re-anchors every boundary against the
/// small duration error individual stretched clips are allowed to carry.
/// The trailing edge is padded or truncated so the total length lands on
/// `max(last.end, total_duration)` to within one sample frame; any such
/// correction is logged, never fatal.
pub fn assemble(
    segments: &[StretchedSegment],
    sample_rate: u32,
    total_duration: Option<f64>,
) -> Result<AudioClip> {
    for pair in segments.windows(2) {
        if pair[1].segment.index <= pair[0].segment.index {
            return Err(RevoiceError::Timing(format!(
                "Segments out of order at index {}",
                pair[1].segment.index
            )));
        }
    }

    let mut samples: Vec<i16> = Vec::new();

    for stretched in segments {
        if stretched.clip.sample_rate != sample_rate {
            return Err(RevoiceError::UnsupportedFormat(format!(
                "Segment {}: sample rate {} does not match track rate {}",
                stretched.segment.index, stretched.clip.sample_rate, sample_rate
            )));
        }

        let start_frame = frames_for(stretched.segment.start, sample_rate);
        if start_frame > samples.len() {
            samples.resize(start_frame, 0);
        } else if start_frame < samples.len() {
            debug!(
                "Segment {}: previous audio ran {} frames past this start",
                stretched.segment.index,
                samples.len() - start_frame
            );
        }

        samples.extend_from_slice(&stretched.clip.samples);
    }

    let timeline_end = segments.last().map(|s| s.segment.end).unwrap_or(0.0);
    let total_frames = frames_for(timeline_end.max(total_duration.unwrap_or(0.0)), sample_rate);

    if samples.len() < total_frames {
        warn!(
            "Padding track with {} trailing silence frames to reach timeline end",
            total_frames - samples.len()
        );
        samples.resize(total_frames, 0);
    } else if samples.len() > total_frames {
        warn!(
            "Truncating {} frames past timeline end",
            samples.len() - total_frames
        );
        samples.truncate(total_frames);
    }

    Ok(AudioClip::new(samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;

    const RATE: u32 = 1_000;

    fn stretched(index: usize, start: f64, end: f64, fill: i16) -> StretchedSegment {
        let frames = frames_for(end - start, RATE);
        StretchedSegment {
            segment: Segment::new(index, start, end, "text"),
            clip: AudioClip::new(vec![fill; frames], RATE),
            degraded: false,
        }
    }

    #[test]
    fn test_total_duration_matches_last_segment_end() {
        let segments = vec![stretched(0, 0.0, 1.0, 5), stretched(1, 1.5, 3.0, 7)];
        let track = assemble(&segments, RATE, None).unwrap();

        assert_eq!(track.len_frames(), frames_for(3.0, RATE));
    }

    #[test]
    fn test_gaps_are_exact_silence() {
        let segments = vec![stretched(0, 0.5, 1.0, 5), stretched(1, 2.0, 3.0, 7)];
        let track = assemble(&segments, RATE, None).unwrap();

        // Leading gap before the first segment
        assert!(track.samples[..500].iter().all(|&s| s == 0));
        // Inter-segment gap
        assert!(track.samples[1_000..2_000].iter().all(|&s| s == 0));
        // Segment audio is untouched
        assert!(track.samples[500..1_000].iter().all(|&s| s == 5));
        assert!(track.samples[2_000..3_000].iter().all(|&s| s == 7));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let segments = vec![stretched(0, 0.0, 1.0, 3), stretched(1, 1.2, 2.5, 9)];
        let first = assemble(&segments, RATE, None).unwrap();
        let second = assemble(&segments, RATE, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_short_clip_is_reanchored_at_next_boundary() {
        // The first clip is 30 frames short of its span; the next segment
        // must still start on its own nominal frame.
        let mut segments = vec![stretched(0, 0.0, 1.0, 5), stretched(1, 1.0, 2.0, 7)];
        segments[0].clip.samples.truncate(970);

        let track = assemble(&segments, RATE, None).unwrap();
        assert_eq!(track.len_frames(), frames_for(2.0, RATE));
        assert_eq!(track.samples[1_000], 7);
        // The shortfall is filled with silence, not with the next segment
        assert!(track.samples[970..1_000].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_overlong_clip_is_truncated_at_track_end() {
        let mut segments = vec![stretched(0, 0.0, 1.0, 5)];
        segments[0].clip.samples.extend_from_slice(&[5; 25]);

        let track = assemble(&segments, RATE, None).unwrap();
        assert_eq!(track.len_frames(), frames_for(1.0, RATE));
    }

    #[test]
    fn test_total_duration_extends_trailing_silence() {
        let segments = vec![stretched(0, 0.0, 1.0, 5)];
        let track = assemble(&segments, RATE, Some(4.0)).unwrap();

        assert_eq!(track.len_frames(), frames_for(4.0, RATE));
        assert!(track.samples[1_000..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_out_of_order_segments_are_rejected() {
        let segments = vec![stretched(1, 1.0, 2.0, 5), stretched(0, 0.0, 1.0, 7)];
        let err = assemble(&segments, RATE, None).unwrap_err();
        assert!(matches!(err, RevoiceError::Timing(_)));
    }

    #[test]
    fn test_sample_rate_mismatch_is_rejected() {
        let mut segments = vec![stretched(0, 0.0, 1.0, 5)];
        segments[0].clip.sample_rate = 22_050;
        let err = assemble(&segments, RATE, None).unwrap_err();
        assert!(matches!(err, RevoiceError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_empty_input_with_total_duration_is_pure_silence() {
        let track = assemble(&[], RATE, Some(2.0)).unwrap();
        assert_eq!(track.len_frames(), frames_for(2.0, RATE));
        assert!(track.samples.iter().all(|&s| s == 0));
    }
}
