//! Revoice - Duration-Matched Video Dubbing Workflow
//!
//! A Rust implementation of an automated workflow for replacing the narration
//! of a video with a translated, re-synthesized audio track whose segment
//! boundaries stay aligned with the original timeline, using ffmpeg,
//! rubberband, ollama, and a voice-cloning TTS service.

pub mod align;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod report;
pub mod segment;
pub mod stretch;
pub mod subtitle;
pub mod synth;
pub mod timing;
pub mod track;
pub mod transcript;
pub mod translate;
