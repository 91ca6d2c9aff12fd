// Alignment subsystem
//
// Forced alignment is advisory: when the external service produces usable
// word-level timing it is redistributed onto the translated text for the
// word-level subtitle artifact, and the pipeline falls back to segment-level
// timing in every other case. Word timing never feeds the stretch
// computation.

pub mod elevenlabs;
pub mod resolver;

use async_trait::async_trait;
use std::path::Path;

pub use resolver::resolve;

use crate::config::AlignmentConfig;
use crate::error::Result;
use crate::segment::Word;

/// External forced-alignment service: audio plus transcript in, word-level
/// timestamps out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForcedAligner: Send + Sync {
    async fn align(&self, audio_path: &Path, transcript: &str) -> Result<Vec<Word>>;
}

/// Factory for creating forced aligner instances
pub struct AlignerFactory;

impl AlignerFactory {
    /// Create the default aligner implementation (ElevenLabs-based)
    pub fn create_default(config: AlignmentConfig) -> Box<dyn ForcedAligner> {
        Box::new(elevenlabs::ElevenLabsAligner::new(config))
    }
}
