use tracing::debug;

use crate::config::AlignmentConfig;
use crate::segment::{AlignmentResult, Segment, Word};

/// Decide whether word-level timing is usable for a segment and, if so, map
/// the translated words onto the original word timeline.
///
/// Each translated word receives a slice of the aligned span proportional to
/// its character length, anchored so the first translated word starts where
/// the first original word starts and the last ends where the last original
/// word ends. Anything implausible (no words, empty translation, poor
/// coverage of the segment) falls back to `SegmentLevel`, the
/// safety-preferred default.
pub fn resolve(segment: &Segment, target_text: &str, config: &AlignmentConfig) -> AlignmentResult {
    let Some(words) = segment.words.as_deref() else {
        return AlignmentResult::SegmentLevel;
    };

    let (Some(first), Some(last)) = (words.first(), words.last()) else {
        return AlignmentResult::SegmentLevel;
    };

    let span = last.end - first.start;
    let segment_duration = segment.duration();
    if span <= 0.0 || segment_duration <= 0.0 {
        return AlignmentResult::SegmentLevel;
    }

    let coverage = span / segment_duration;
    if coverage < config.min_coverage {
        debug!(
            "Segment {}: aligned words cover {:.0}% of the span, below threshold",
            segment.index,
            coverage * 100.0
        );
        return AlignmentResult::SegmentLevel;
    }

    let translated: Vec<&str> = target_text.split_whitespace().collect();
    if translated.is_empty() {
        return AlignmentResult::SegmentLevel;
    }

    let total_chars: usize = translated.iter().map(|w| w.chars().count()).sum();
    if total_chars == 0 {
        return AlignmentResult::SegmentLevel;
    }

    let mut mapped = Vec::with_capacity(translated.len());
    let mut consumed_chars = 0usize;

    for (i, word) in translated.iter().enumerate() {
        let start = first.start + span * consumed_chars as f64 / total_chars as f64;
        consumed_chars += word.chars().count();
        let end = if i == translated.len() - 1 {
            last.end
        } else {
            first.start + span * consumed_chars as f64 / total_chars as f64
        };

        mapped.push(Word {
            text: word.to_string(),
            start,
            end,
        });
    }

    AlignmentResult::WordLevel(mapped)
}
