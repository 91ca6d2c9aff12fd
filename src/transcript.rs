use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::{Result, RevoiceError};
use crate::segment::{Segment, Word};

// Structs for parsing whisper-style transcript JSON
#[derive(Debug, Deserialize)]
struct TranscriptFile {
    #[serde(default)]
    language: Option<String>,
    segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Deserialize)]
struct TranscriptSegment {
    start: f64,
    end: f64,
    text: String,
    #[serde(default)]
    words: Option<Vec<TranscriptWord>>,
}

#[derive(Debug, Deserialize)]
struct TranscriptWord {
    // Whisper emits "word", forced-alignment output emits "text"
    #[serde(alias = "word")]
    text: String,
    start: f64,
    end: f64,
}

/// Load a whisper-style JSON transcript into the segment model.
pub async fn load_transcript<P: AsRef<Path>>(path: P) -> Result<Vec<Segment>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RevoiceError::FileNotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path).await?;
    let parsed: TranscriptFile = serde_json::from_str(&content)?;

    let segments: Vec<Segment> = parsed
        .segments
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let mut segment = Segment::new(index, raw.start, raw.end, raw.text.trim());
            segment.words = raw.words.map(|words| {
                words
                    .into_iter()
                    .map(|w| Word {
                        text: w.text.trim().to_string(),
                        start: w.start,
                        end: w.end,
                    })
                    .collect()
            });
            segment
        })
        .collect();

    info!(
        "Loaded {} segments from transcript {} (language: {})",
        segments.len(),
        path.display(),
        parsed.language.as_deref().unwrap_or("unknown")
    );

    Ok(segments)
}
