use tracing::{debug, info};

use crate::config::TimingConfig;
use crate::error::{Result, RevoiceError};
use crate::segment::Segment;

/// Validate and clean a raw segment sequence before translation and
/// synthesis.
///
/// Very short segments translate and synthesize poorly and produce unstable
/// stretch ratios, so any segment at or below the word-count threshold is
/// merged into the following segment until none remain (or a single segment
/// is left). Malformed timelines are fatal: without a valid timeline the
/// track cannot be reconstructed.
pub fn normalize(segments: Vec<Segment>, config: &TimingConfig) -> Result<Vec<Segment>> {
    validate(&segments)?;

    let before = segments.len();
    let merged = merge_short_segments(segments, config.merge_word_threshold);

    if merged.len() != before {
        info!("Merged segments: {} -> {}", before, merged.len());
    }

    Ok(merged)
}

fn validate(segments: &[Segment]) -> Result<()> {
    for segment in segments {
        if !segment.start.is_finite() || !segment.end.is_finite() {
            return Err(RevoiceError::Timing(format!(
                "Segment {}: non-finite timestamp ({} -> {})",
                segment.index, segment.start, segment.end
            )));
        }
        if segment.start < 0.0 {
            return Err(RevoiceError::Timing(format!(
                "Segment {}: negative start time {}",
                segment.index, segment.start
            )));
        }
        if segment.end <= segment.start {
            return Err(RevoiceError::Timing(format!(
                "Segment {}: end {} <= start {}",
                segment.index, segment.end, segment.start
            )));
        }
    }

    for pair in segments.windows(2) {
        if pair[1].start < pair[0].end {
            return Err(RevoiceError::Timing(format!(
                "Segment {} overlaps previous segment ({} < {})",
                pair[1].index, pair[1].start, pair[0].end
            )));
        }
    }

    Ok(())
}

fn merge_short_segments(mut segments: Vec<Segment>, threshold: usize) -> Vec<Segment> {
    loop {
        if segments.len() <= 1 {
            break;
        }

        let Some(short) = segments.iter().position(|s| s.word_count() <= threshold) else {
            break;
        };

        // Merge forward; a short trailing segment folds into its predecessor.
        let (keep, absorbed) = if short + 1 < segments.len() {
            (short, segments.remove(short + 1))
        } else {
            (short - 1, segments.remove(short))
        };

        let target = &mut segments[keep];
        debug!(
            "Merging segment at {:.2}s into span {:.2}-{:.2}s",
            absorbed.start, target.start, absorbed.end
        );
        target.source_text = format!("{} {}", target.source_text, absorbed.source_text);
        target.start = target.start.min(absorbed.start);
        target.end = target.end.max(absorbed.end);
        // Source word timing no longer matches the merged span
        target.words = None;
    }

    for (index, segment) in segments.iter_mut().enumerate() {
        segment.index = index;
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(index: usize, start: f64, end: f64, text: &str) -> Segment {
        Segment::new(index, start, end, text)
    }

    fn config(threshold: usize) -> TimingConfig {
        TimingConfig {
            merge_word_threshold: threshold,
        }
    }

    #[test]
    fn test_two_short_segments_merge_into_one() {
        let segments = vec![seg(0, 0.0, 2.0, "Hi."), seg(1, 2.0, 3.0, "Ok")];
        let merged = normalize(segments, &config(5)).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, 0.0);
        assert_eq!(merged[0].end, 3.0);
        assert_eq!(merged[0].source_text, "Hi. Ok");
        assert_eq!(merged[0].index, 0);
    }

    #[test]
    fn test_long_segments_are_untouched() {
        let segments = vec![
            seg(0, 0.0, 3.0, "this sentence has six words total"),
            seg(1, 3.5, 6.0, "and so does this other one here"),
        ];
        let merged = normalize(segments.clone(), &config(5)).unwrap();
        assert_eq!(merged, segments);
    }

    #[test]
    fn test_no_adjacent_short_pairs_remain() {
        let segments = vec![
            seg(0, 0.0, 1.0, "one two"),
            seg(1, 1.0, 2.0, "three"),
            seg(2, 2.0, 3.0, "four five"),
            seg(3, 3.0, 10.0, "a much longer closing segment with enough words"),
        ];
        let merged = normalize(segments, &config(5)).unwrap();

        for pair in merged.windows(2) {
            assert!(
                pair[0].word_count() > 5 || pair[1].word_count() > 5,
                "adjacent short segments survived merging"
            );
        }
    }

    #[test]
    fn test_short_trailing_segment_merges_backward() {
        let segments = vec![
            seg(0, 0.0, 5.0, "a long enough opening segment with many words"),
            seg(1, 5.0, 6.0, "bye"),
        ];
        let merged = normalize(segments, &config(5)).unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end, 6.0);
        assert!(merged[0].source_text.ends_with("bye"));
    }

    #[test]
    fn test_gaps_between_segments_are_preserved() {
        let segments = vec![
            seg(0, 0.0, 3.0, "first segment with plenty of words in it"),
            seg(1, 5.0, 8.0, "second segment with plenty of words in it"),
        ];
        let merged = normalize(segments, &config(5)).unwrap();
        assert_eq!(merged[0].end, 3.0);
        assert_eq!(merged[1].start, 5.0);
    }

    #[test]
    fn test_rejects_inverted_span() {
        let segments = vec![seg(0, 2.0, 1.0, "broken span segment text here now")];
        let err = normalize(segments, &config(5)).unwrap_err();
        assert!(matches!(err, RevoiceError::Timing(_)));
    }

    #[test]
    fn test_rejects_overlap() {
        let segments = vec![
            seg(0, 0.0, 2.5, "first segment with plenty of words here"),
            seg(1, 2.0, 4.0, "second segment with plenty of words here"),
        ];
        let err = normalize(segments, &config(5)).unwrap_err();
        assert!(matches!(err, RevoiceError::Timing(_)));
    }

    #[test]
    fn test_rejects_nan_and_negative_timestamps() {
        let nan = vec![seg(0, f64::NAN, 1.0, "words words words words words words")];
        assert!(normalize(nan, &config(5)).is_err());

        let negative = vec![seg(0, -1.0, 1.0, "words words words words words words")];
        assert!(normalize(negative, &config(5)).is_err());
    }

    #[test]
    fn test_input_is_not_mutated_elsewhere() {
        // Ownership transfer: the normalizer consumes its input and the
        // merged output drops stale word timing.
        let mut first = seg(0, 0.0, 1.0, "short");
        first.words = Some(vec![crate::segment::Word {
            text: "short".to_string(),
            start: 0.0,
            end: 1.0,
        }]);
        let segments = vec![
            first,
            seg(1, 1.0, 4.0, "a trailing segment with plenty of words"),
        ];
        let merged = normalize(segments, &config(5)).unwrap();
        assert_eq!(merged.len(), 1);
        assert!(merged[0].words.is_none());
    }
}
