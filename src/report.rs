use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;

/// Per-segment degradations collected during a run.
///
/// None of these abort the run; the report exists so an operator can decide
/// whether to re-run with different settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// Translation call failed; the source text was synthesized instead
    TranslationFallback,
    /// Word-level alignment was unavailable or unusable for this segment
    AlignmentFallback,
    /// Stretch ratio fell outside the configured safe range
    RatioOutOfBounds,
    /// Post-stretch duration missed the tolerance even after retry
    StretchDegraded,
    /// Segment could not be synthesized or planned; silence of the correct
    /// duration was substituted
    PlaceholderSilence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentFault {
    pub index: usize,
    pub kind: FaultKind,
    pub detail: String,
}

/// Duration comparison between the original audio and the assembled track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationMismatch {
    pub original_duration: f64,
    pub track_duration: f64,
    pub difference: f64,
    pub percentage: f64,
    pub needs_attention: bool,
}

impl DurationMismatch {
    pub fn calculate(original_duration: f64, track_duration: f64, warn_percent: f64) -> Self {
        let difference = track_duration - original_duration;
        let percentage = if original_duration > 0.0 {
            difference / original_duration * 100.0
        } else {
            0.0
        };

        Self {
            original_duration,
            track_duration,
            difference,
            percentage,
            needs_attention: percentage.abs() > warn_percent,
        }
    }
}

/// Summary of one dubbing run, printed to the console and saved as JSON next
/// to the output video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub source_lang: String,
    pub target_lang: String,
    pub total_segments: usize,
    pub faults: Vec<SegmentFault>,
    pub mismatch: Option<DurationMismatch>,
}

impl RunReport {
    pub fn new(source_lang: &str, target_lang: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            total_segments: 0,
            faults: Vec::new(),
            mismatch: None,
        }
    }

    pub fn record(&mut self, index: usize, kind: FaultKind, detail: impl Into<String>) {
        self.faults.push(SegmentFault {
            index,
            kind,
            detail: detail.into(),
        });
    }

    pub fn count(&self, kind: &FaultKind) -> usize {
        self.faults.iter().filter(|f| &f.kind == kind).count()
    }

    /// Segments that produced no usable audio at all.
    pub fn unrecoverable_count(&self) -> usize {
        self.count(&FaultKind::PlaceholderSilence)
    }

    pub fn finish(&mut self, mismatch: DurationMismatch) {
        self.finished_at = Some(Utc::now());
        self.mismatch = Some(mismatch);
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path.as_ref(), json).await?;
        info!("Run report saved: {}", path.as_ref().display());
        Ok(())
    }

    /// Print the operator-facing summary.
    pub fn print_summary(&self) {
        println!();
        println!("{}", "=".repeat(60));
        println!("DUBBING SUMMARY ({})", self.run_id);
        println!("{}", "=".repeat(60));
        println!("Language:            {} -> {}", self.source_lang, self.target_lang);
        println!("Segments:            {}", self.total_segments);
        println!(
            "Translation fallbacks: {}",
            self.count(&FaultKind::TranslationFallback)
        );
        println!(
            "Alignment fallbacks:   {}",
            self.count(&FaultKind::AlignmentFallback)
        );
        println!(
            "Ratios out of bounds:  {}",
            self.count(&FaultKind::RatioOutOfBounds)
        );
        println!(
            "Degraded stretches:    {}",
            self.count(&FaultKind::StretchDegraded)
        );
        println!(
            "Placeholder silences:  {}",
            self.count(&FaultKind::PlaceholderSilence)
        );

        if let Some(mismatch) = &self.mismatch {
            println!(
                "Original duration:   {:.2}s",
                mismatch.original_duration
            );
            println!("Track duration:      {:.2}s", mismatch.track_duration);
            println!(
                "Difference:          {:.2}s ({:.1}%)",
                mismatch.difference, mismatch.percentage
            );
            if mismatch.needs_attention {
                println!("WARNING: large duration mismatch, review the output");
            }
        }
        println!("{}", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_percentage_and_flag() {
        let small = DurationMismatch::calculate(100.0, 102.0, 5.0);
        assert!((small.percentage - 2.0).abs() < 1e-9);
        assert!(!small.needs_attention);

        let large = DurationMismatch::calculate(100.0, 90.0, 5.0);
        assert!((large.percentage + 10.0).abs() < 1e-9);
        assert!(large.needs_attention);
    }

    #[test]
    fn test_zero_original_duration_does_not_divide() {
        let mismatch = DurationMismatch::calculate(0.0, 10.0, 5.0);
        assert_eq!(mismatch.percentage, 0.0);
    }

    #[test]
    fn test_fault_counting() {
        let mut report = RunReport::new("en", "de");
        report.record(0, FaultKind::AlignmentFallback, "no words");
        report.record(2, FaultKind::AlignmentFallback, "low coverage");
        report.record(1, FaultKind::PlaceholderSilence, "synthesis failed");

        assert_eq!(report.count(&FaultKind::AlignmentFallback), 2);
        assert_eq!(report.unrecoverable_count(), 1);
        assert_eq!(report.count(&FaultKind::StretchDegraded), 0);
    }

    #[tokio::test]
    async fn test_report_serializes_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut report = RunReport::new("en", "de");
        report.total_segments = 3;
        report.record(1, FaultKind::StretchDegraded, "tolerance missed");
        report.finish(DurationMismatch::calculate(10.0, 10.1, 5.0));

        report.save(&path).await.unwrap();

        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.total_segments, 3);
        assert_eq!(loaded.faults.len(), 1);
        assert!(loaded.finished_at.is_some());
    }
}
