use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{Result, RevoiceError};
use crate::segment::{AlignmentResult, Segment, Word};

/// Parse an SRT subtitle file into segments.
///
/// Malformed cues (bad index line, bad timestamp, empty text) are skipped
/// with a warning rather than failing the file; a file with no valid cues is
/// an error. HTML markup is stripped from cue text.
pub async fn parse_srt<P: AsRef<Path>>(path: P) -> Result<Vec<Segment>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RevoiceError::FileNotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path).await?;
    let segments = parse_srt_content(&content);

    if segments.is_empty() {
        return Err(RevoiceError::UnsupportedFormat(format!(
            "No valid subtitles found in {}",
            path.display()
        )));
    }

    info!("Parsed {} segments from {}", segments.len(), path.display());
    Ok(segments)
}

fn parse_srt_content(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();

    for entry in content.split("\n\n").map(str::trim).filter(|e| !e.is_empty()) {
        let lines: Vec<&str> = entry.lines().map(str::trim).collect();
        if lines.len() < 3 {
            warn!("Skipping malformed SRT cue: {:?}", lines.first());
            continue;
        }

        if lines[0].parse::<u64>().is_err() {
            warn!("Skipping SRT cue with non-numeric index: {}", lines[0]);
            continue;
        }

        let Some((start_str, end_str)) = lines[1].split_once("-->") else {
            warn!("Skipping SRT cue with bad timestamp line: {}", lines[1]);
            continue;
        };

        let (Ok(start), Ok(end)) = (
            parse_srt_time(start_str.trim()),
            parse_srt_time(end_str.trim()),
        ) else {
            warn!("Skipping SRT cue with unparsable timestamps: {}", lines[1]);
            continue;
        };

        let text = lines[2..]
            .iter()
            .filter(|l| !l.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let text = strip_html_tags(&text);

        if text.trim().is_empty() {
            continue;
        }

        segments.push(Segment::new(segments.len(), start, end, text.trim()));
    }

    segments
}

/// Generate a segment-level SRT file. Segments carrying a translation write
/// the translated text; others fall back to the source text.
pub async fn generate_srt<P: AsRef<Path>>(segments: &[Segment], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    let mut srt_content = String::new();

    for (index, segment) in segments.iter().enumerate() {
        let start_time = format_srt_time(segment.start);
        let end_time = format_srt_time(segment.end);

        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            start_time,
            end_time,
            segment.spoken_text().trim()
        ));
    }

    fs::write(output_path, srt_content).await?;

    info!("SRT file generated successfully");
    Ok(())
}

/// Generate a word-level SRT file from segments whose alignment resolved to
/// word-level timing; segment-level segments contribute one whole-span cue.
pub async fn generate_word_srt<P: AsRef<Path>>(segments: &[Segment], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();

    let mut cues: Vec<Word> = Vec::new();
    for segment in segments {
        match &segment.alignment {
            AlignmentResult::WordLevel(words) => cues.extend(words.iter().cloned()),
            AlignmentResult::SegmentLevel => cues.push(Word {
                text: segment.spoken_text().to_string(),
                start: segment.start,
                end: segment.end,
            }),
        }
    }

    let mut srt_content = String::new();
    for (index, cue) in cues.iter().enumerate() {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_time(cue.start),
            format_srt_time(cue.end),
            cue.text.trim()
        ));
    }

    fs::write(output_path, srt_content).await?;

    info!("Word-level SRT file generated: {}", output_path.display());
    Ok(())
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
fn format_srt_time(seconds: f64) -> String {
    let total_milliseconds = (seconds * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Parse an SRT timestamp (HH:MM:SS,mmm); a period millisecond separator is
/// also accepted.
fn parse_srt_time(timestamp: &str) -> Result<f64> {
    let normalized = timestamp.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() != 3 {
        return Err(RevoiceError::UnsupportedFormat(format!(
            "Invalid timestamp format: {}",
            timestamp
        )));
    }

    let hours: u64 = parts[0]
        .parse()
        .map_err(|_| RevoiceError::UnsupportedFormat(format!("Invalid hours: {}", timestamp)))?;
    let minutes: u64 = parts[1]
        .parse()
        .map_err(|_| RevoiceError::UnsupportedFormat(format!("Invalid minutes: {}", timestamp)))?;
    let seconds: f64 = parts[2]
        .parse()
        .map_err(|_| RevoiceError::UnsupportedFormat(format!("Invalid seconds: {}", timestamp)))?;

    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

fn strip_html_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(65.123), "00:01:05,123");
        assert_eq!(format_srt_time(3661.500), "01:01:01,500");
    }

    #[test]
    fn test_parse_srt_time() {
        assert!((parse_srt_time("00:00:04,680").unwrap() - 4.68).abs() < 1e-9);
        assert!((parse_srt_time("01:01:01.500").unwrap() - 3661.5).abs() < 1e-9);
        assert!(parse_srt_time("4.68").is_err());
    }

    #[test]
    fn test_parse_srt_content() {
        let content = "1\n00:00:00,000 --> 00:00:04,680\nHello there.\n\n\
                       2\n00:00:04,680 --> 00:00:09,000\n<i>General</i> Kenobi!\n";
        let segments = parse_srt_content(content);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].source_text, "Hello there.");
        assert!((segments[0].end - 4.68).abs() < 1e-9);
        // HTML markup is stripped
        assert_eq!(segments[1].source_text, "General Kenobi!");
        assert_eq!(segments[1].index, 1);
    }

    #[test]
    fn test_malformed_cues_are_skipped() {
        let content = "not-a-number\n00:00:00,000 --> 00:00:01,000\nskipped\n\n\
                       1\nbad timestamp line\nskipped\n\n\
                       2\n00:00:02,000 --> 00:00:03,000\nkept\n";
        let segments = parse_srt_content(content);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].source_text, "kept");
        assert_eq!(segments[0].index, 0);
    }

    #[test]
    fn test_multi_line_cue_text_is_joined() {
        let content = "1\n00:00:00,000 --> 00:00:02,000\nfirst line\nsecond line\n";
        let segments = parse_srt_content(content);
        assert_eq!(segments[0].source_text, "first line second line");
    }

    #[tokio::test]
    async fn test_srt_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.srt");

        let mut segment = Segment::new(0, 0.0, 4.68, "Hello there.");
        segment.target_text = Some("Hallo zusammen.".to_string());

        generate_srt(&[segment], &path).await.unwrap();
        let parsed = parse_srt(&path).await.unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].source_text, "Hallo zusammen.");
        assert!((parsed[0].end - 4.68).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_word_level_srt_mixes_granularities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.srt");

        let mut aligned = Segment::new(0, 0.0, 1.0, "Hello world");
        aligned.alignment = AlignmentResult::WordLevel(vec![
            Word {
                text: "Hallo".to_string(),
                start: 0.0,
                end: 0.5,
            },
            Word {
                text: "Welt".to_string(),
                start: 0.5,
                end: 1.0,
            },
        ]);
        let fallback = Segment::new(1, 1.5, 2.5, "Goodbye");

        generate_word_srt(&[aligned, fallback], &path).await.unwrap();
        let parsed = parse_srt(&path).await.unwrap();

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].source_text, "Hallo");
        assert_eq!(parsed[2].source_text, "Goodbye");
    }
}
