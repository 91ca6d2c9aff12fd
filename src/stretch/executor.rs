use tracing::{debug, warn};

use crate::audio::AudioClip;
use crate::config::StretchConfig;
use crate::error::Result;
use crate::segment::{PlannedSegment, StretchedSegment};

use super::TimeStretcher;

/// Applies stretch plans and validates the duration postcondition.
///
/// When the primitive misses the 1% tolerance (very short segments, numerical
/// edge cases), a single retry is attempted with a ratio corrected from the
/// observed output duration. A second miss produces a best-effort result
/// tagged as degraded rather than a failure; per-segment faults must not
/// abort assembly of the rest of the track.
pub struct StretchExecutor {
    stretcher: Box<dyn TimeStretcher>,
    config: StretchConfig,
}

impl StretchExecutor {
    pub fn new(stretcher: Box<dyn TimeStretcher>, config: StretchConfig) -> Self {
        Self { stretcher, config }
    }

    pub async fn execute(&self, planned: PlannedSegment) -> Result<StretchedSegment> {
        let PlannedSegment {
            segment,
            clip,
            plan,
        } = planned;

        let target = plan.target_duration;
        let first = self.stretcher.stretch(&clip, plan.ratio).await?;

        if self.within_tolerance(first.duration_secs(), target) {
            return Ok(StretchedSegment {
                segment,
                clip: first,
                degraded: false,
            });
        }

        let observed = first.duration_secs();
        let corrected = plan.ratio * target / observed;
        debug!(
            "Segment {}: stretched to {:.4}s instead of {:.4}s, retrying with ratio {:.4}",
            segment.index, observed, target, corrected
        );

        let second = self.stretcher.stretch(&clip, corrected).await?;
        if self.within_tolerance(second.duration_secs(), target) {
            return Ok(StretchedSegment {
                segment,
                clip: second,
                degraded: false,
            });
        }

        // Keep whichever attempt landed closer to the target
        let best = if (second.duration_secs() - target).abs() < (observed - target).abs() {
            second
        } else {
            first
        };

        warn!(
            "Segment {}: duration {:.4}s still outside tolerance of target {:.4}s after retry",
            segment.index,
            best.duration_secs(),
            target
        );

        Ok(StretchedSegment {
            segment,
            clip: best,
            degraded: true,
        })
    }

    fn within_tolerance(&self, observed: f64, target: f64) -> bool {
        if target <= 0.0 {
            return false;
        }
        (observed - target).abs() / target <= self.config.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;
    use crate::stretch::{MockTimeStretcher, StretchPlan};

    fn config() -> StretchConfig {
        StretchConfig {
            binary_path: "rubberband".to_string(),
            min_ratio: 0.5,
            max_ratio: 2.0,
            tolerance: 0.01,
        }
    }

    fn planned(ratio: f64, target: f64, clip_secs: f64) -> PlannedSegment {
        let sample_rate = 44_100;
        PlannedSegment {
            segment: Segment::new(0, 0.0, target, "text"),
            clip: AudioClip::silence(clip_secs, sample_rate),
            plan: StretchPlan {
                ratio,
                target_duration: target,
                within_bounds: true,
            },
        }
    }

    fn clip_of(secs: f64) -> AudioClip {
        AudioClip::silence(secs, 44_100)
    }

    #[tokio::test]
    async fn test_exact_result_passes_first_attempt() {
        let mut stretcher = MockTimeStretcher::new();
        stretcher
            .expect_stretch()
            .times(1)
            .returning(|_, _| Ok(clip_of(3.0)));

        let executor = StretchExecutor::new(Box::new(stretcher), config());
        let result = executor.execute(planned(1.5, 3.0, 2.0)).await.unwrap();

        assert!(!result.degraded);
        let duration = result.clip.duration_secs();
        assert!((2.97..=3.03).contains(&duration));
    }

    #[tokio::test]
    async fn test_retry_uses_corrected_ratio() {
        let mut stretcher = MockTimeStretcher::new();
        let mut call = 0;
        stretcher.expect_stretch().times(2).returning(move |_, ratio| {
            call += 1;
            if call == 1 {
                // Overshoots: 3.3s instead of 3.0s
                Ok(clip_of(3.3))
            } else {
                // Corrected ratio must be scaled down by 3.0/3.3
                assert!((ratio - 1.5 * 3.0 / 3.3).abs() < 1e-9);
                Ok(clip_of(3.0))
            }
        });

        let executor = StretchExecutor::new(Box::new(stretcher), config());
        let result = executor.execute(planned(1.5, 3.0, 2.0)).await.unwrap();

        assert!(!result.degraded);
        assert!((result.clip.duration_secs() - 3.0).abs() < 0.03);
    }

    #[tokio::test]
    async fn test_double_miss_is_degraded_best_effort() {
        let mut stretcher = MockTimeStretcher::new();
        let mut call = 0;
        stretcher.expect_stretch().times(2).returning(move |_, _| {
            call += 1;
            if call == 1 {
                Ok(clip_of(3.5))
            } else {
                Ok(clip_of(3.2))
            }
        });

        let executor = StretchExecutor::new(Box::new(stretcher), config());
        let result = executor.execute(planned(1.5, 3.0, 2.0)).await.unwrap();

        assert!(result.degraded);
        // The closer of the two attempts is kept
        assert!((result.clip.duration_secs() - 3.2).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_primitive_error_propagates() {
        let mut stretcher = MockTimeStretcher::new();
        stretcher.expect_stretch().times(1).returning(|_, _| {
            Err(crate::error::RevoiceError::Stretch("boom".to_string()))
        });

        let executor = StretchExecutor::new(Box::new(stretcher), config());
        assert!(executor.execute(planned(1.5, 3.0, 2.0)).await.is_err());
    }
}
