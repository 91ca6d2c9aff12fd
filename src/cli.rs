use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dub a single video file into another language
    Dub {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Whisper-style JSON transcript of the source audio
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Subtitle file to use instead of a transcript
        #[arg(long)]
        srt: Option<PathBuf>,

        /// Source language of the original audio
        #[arg(short, long, default_value = "en")]
        source_lang: String,

        /// Target language for the dubbed audio
        #[arg(long, default_value = "de")]
        target_lang: String,

        /// Voice to synthesize with
        #[arg(long)]
        voice_id: Option<String>,

        /// Clone a voice from the original audio instead of using a preset
        #[arg(long)]
        clone_voice: bool,

        /// Output video file (defaults to <input>_<lang>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write translated subtitles next to the output
        #[arg(long)]
        save_srt: bool,

        /// Write word-level subtitles next to the output
        #[arg(long)]
        word_level_srt: bool,

        /// Keep intermediate audio files for inspection
        #[arg(long)]
        keep_temp: bool,
    },

    /// Dub all video files in a directory that have sidecar transcripts
    Batch {
        /// Input directory containing video files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Source language of the original audio
        #[arg(short, long, default_value = "en")]
        source_lang: String,

        /// Target language for the dubbed audio
        #[arg(long, default_value = "de")]
        target_lang: String,

        /// Voice to synthesize with
        #[arg(long)]
        voice_id: Option<String>,

        /// Clone a voice from each file's original audio
        #[arg(long)]
        clone_voice: bool,

        /// Write translated subtitles next to each output
        #[arg(long)]
        save_srt: bool,
    },

    /// Extract the audio track from a video file
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Translate a subtitle file, preserving its timing
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file
        #[arg(short, long)]
        output: PathBuf,

        /// Source language of the subtitles
        #[arg(short, long, default_value = "en")]
        source_lang: String,

        /// Target language
        #[arg(long, default_value = "de")]
        target_lang: String,
    },
}
