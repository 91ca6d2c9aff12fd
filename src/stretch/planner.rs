use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::StretchConfig;
use crate::error::{Result, RevoiceError};
use crate::segment::Segment;

/// The stretch factor required to fit a synthesized clip into its segment's
/// original-timeline span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StretchPlan {
    /// Target duration divided by synthesized duration
    pub ratio: f64,
    /// Duration the stretched clip must reach, in seconds
    pub target_duration: f64,
    /// False when the ratio falls outside the configured safe range
    pub within_bounds: bool,
}

/// Compute the stretch plan for one segment.
///
/// An out-of-range ratio is a quality risk, not an error: the executor must
/// still produce some output, so the plan is emitted and the condition is
/// surfaced in the run summary. A degenerate synthesized duration is fatal
/// for the segment since silence cannot be stretched into speech.
pub fn plan(segment: &Segment, synth_duration: f64, config: &StretchConfig) -> Result<StretchPlan> {
    if !synth_duration.is_finite() || synth_duration <= 0.0 {
        return Err(RevoiceError::Planning(format!(
            "Segment {}: synthesized duration {} is not stretchable",
            segment.index, synth_duration
        )));
    }

    let target_duration = segment.duration();
    let ratio = target_duration / synth_duration;
    let within_bounds = ratio >= config.min_ratio && ratio <= config.max_ratio;

    if !within_bounds {
        warn!(
            "Segment {}: stretch ratio {:.3} outside safe range [{}, {}]",
            segment.index, ratio, config.min_ratio, config.max_ratio
        );
    }

    Ok(StretchPlan {
        ratio,
        target_duration,
        within_bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StretchConfig {
        StretchConfig {
            binary_path: "rubberband".to_string(),
            min_ratio: 0.5,
            max_ratio: 2.0,
            tolerance: 0.01,
        }
    }

    fn seg(start: f64, end: f64) -> Segment {
        Segment::new(0, start, end, "text")
    }

    #[test]
    fn test_ratio_is_target_over_source() {
        // 3s segment, 2s of synthesized audio: stretch by 1.5
        let plan = plan(&seg(10.0, 13.0), 2.0, &config()).unwrap();
        assert!((plan.ratio - 1.5).abs() < 1e-9);
        assert!((plan.target_duration - 3.0).abs() < 1e-9);
        assert!(plan.within_bounds);
    }

    #[test]
    fn test_out_of_range_ratio_is_flagged_not_rejected() {
        let fast = plan(&seg(0.0, 1.0), 4.0, &config()).unwrap();
        assert!((fast.ratio - 0.25).abs() < 1e-9);
        assert!(!fast.within_bounds);

        let slow = plan(&seg(0.0, 5.0), 1.0, &config()).unwrap();
        assert!((slow.ratio - 5.0).abs() < 1e-9);
        assert!(!slow.within_bounds);
    }

    #[test]
    fn test_boundary_ratios_are_within_bounds() {
        assert!(plan(&seg(0.0, 1.0), 2.0, &config()).unwrap().within_bounds);
        assert!(plan(&seg(0.0, 2.0), 1.0, &config()).unwrap().within_bounds);
    }

    #[test]
    fn test_degenerate_synth_duration_is_planning_error() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = plan(&seg(0.0, 1.0), bad, &config()).unwrap_err();
            assert!(matches!(err, RevoiceError::Planning(_)));
        }
    }
}
