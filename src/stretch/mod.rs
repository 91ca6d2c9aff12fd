// Time-stretch subsystem
//
// This module computes and applies pitch-preserving time-scale modification:
// - Planner: per-segment ratio computation (pure, deterministic)
// - Executor: applies the ratio and validates the duration postcondition
// - Rubberband: subprocess-backed stretch primitive

pub mod executor;
pub mod planner;
pub mod rubberband;

use async_trait::async_trait;

pub use executor::StretchExecutor;
pub use planner::{StretchPlan, plan};

use crate::audio::AudioClip;
use crate::config::StretchConfig;
use crate::error::Result;

/// Pitch-preserving time-scale modification primitive.
///
/// A ratio above 1.0 lengthens the clip, below 1.0 shortens it. The spoken
/// content and pitch are preserved; only playback duration changes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimeStretcher: Send + Sync {
    async fn stretch(&self, clip: &AudioClip, ratio: f64) -> Result<AudioClip>;
}

/// Factory for creating time stretcher instances
pub struct StretcherFactory;

impl StretcherFactory {
    /// Create the default stretcher implementation (rubberband-based)
    pub fn create_default(config: StretchConfig) -> Box<dyn TimeStretcher> {
        Box::new(rubberband::RubberbandStretcher::new(config))
    }
}
