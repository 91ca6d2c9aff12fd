use serde::{Deserialize, Serialize};

use crate::audio::AudioClip;
use crate::stretch::StretchPlan;

/// A single word with timeline-relative timing in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Outcome of the alignment resolver for one segment.
///
/// Word-level timing is advisory only: it feeds the word-level subtitle
/// artifact but never the stretch computation, which always operates at
/// segment granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlignmentResult {
    /// Default, safety-preferred path: timing applies to the whole segment
    SegmentLevel,
    /// Translated words mapped onto the original word timeline
    WordLevel(Vec<Word>),
}

/// A timestamped span of the original timeline with associated text.
///
/// Segment order is timeline order; spans never overlap and the gaps
/// between consecutive segments represent silence that must be preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub source_text: String,
    pub target_text: Option<String>,
    /// Word-level timing of the source speech, when forced alignment produced it
    pub words: Option<Vec<Word>>,
    pub alignment: AlignmentResult,
}

impl Segment {
    pub fn new(index: usize, start: f64, end: f64, source_text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            source_text: source_text.into(),
            target_text: None,
            words: None,
            alignment: AlignmentResult::SegmentLevel,
        }
    }

    /// Original-timeline duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whitespace-separated word count of the source text.
    pub fn word_count(&self) -> usize {
        self.source_text.split_whitespace().count()
    }

    /// Text that downstream synthesis should speak.
    pub fn spoken_text(&self) -> &str {
        self.target_text.as_deref().unwrap_or(&self.source_text)
    }
}

/// A synthesized segment annotated with its stretch plan.
#[derive(Debug, Clone)]
pub struct PlannedSegment {
    pub segment: Segment,
    pub clip: AudioClip,
    pub plan: StretchPlan,
}

/// A segment whose audio has been stretched to its original-timeline span.
#[derive(Debug, Clone)]
pub struct StretchedSegment {
    pub segment: Segment,
    pub clip: AudioClip,
    /// Post-stretch duration missed the tolerance even after retry
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_and_word_count() {
        let segment = Segment::new(0, 1.5, 4.0, "the quick brown fox");
        assert!((segment.duration() - 2.5).abs() < f64::EPSILON);
        assert_eq!(segment.word_count(), 4);
    }

    #[test]
    fn test_spoken_text_prefers_translation() {
        let mut segment = Segment::new(0, 0.0, 1.0, "Hello");
        assert_eq!(segment.spoken_text(), "Hello");

        segment.target_text = Some("Hallo".to_string());
        assert_eq!(segment.spoken_text(), "Hallo");
    }

    #[test]
    fn test_new_segment_defaults_to_segment_level() {
        let segment = Segment::new(3, 0.0, 1.0, "text");
        assert_eq!(segment.alignment, AlignmentResult::SegmentLevel);
        assert!(segment.words.is_none());
    }
}
