//! Revoice - Duration-Matched Video Dubbing Workflow
//!
//! This is the main entry point for the Revoice application, which replaces a
//! video's speech with a translated, duration-matched voice track using
//! ollama, ElevenLabs, rubberband, and ffmpeg.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use revoice::cli::{Args, Commands};
use revoice::config::Config;
use revoice::pipeline::{DubOptions, Pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    let pipeline = Pipeline::new(config)?;

    // Execute command
    match args.command {
        Commands::Dub {
            input,
            transcript,
            srt,
            source_lang,
            target_lang,
            voice_id,
            clone_voice,
            output,
            save_srt,
            word_level_srt,
            keep_temp,
        } => {
            info!("Dubbing video file: {}", input.display());
            let opts = DubOptions {
                input,
                output,
                transcript,
                srt,
                source_lang,
                target_lang,
                voice_id,
                clone_voice,
                save_srt,
                word_level_srt,
                keep_temp,
            };
            let report = pipeline.dub(&opts).await?;
            report.print_summary();
        }
        Commands::Batch {
            input_dir,
            source_lang,
            target_lang,
            voice_id,
            clone_voice,
            save_srt,
        } => {
            info!("Dubbing directory: {}", input_dir.display());
            let opts = DubOptions {
                input: input_dir.clone(),
                output: None,
                transcript: None,
                srt: None,
                source_lang,
                target_lang,
                voice_id,
                clone_voice,
                save_srt,
                word_level_srt: false,
                keep_temp: false,
            };
            pipeline.dub_directory(&input_dir, &opts).await?;
        }
        Commands::Extract { input, output } => {
            info!("Extracting audio from: {}", input.display());
            pipeline.extract_audio(&input, &output).await?;
        }
        Commands::Translate {
            input,
            output,
            source_lang,
            target_lang,
        } => {
            info!("Translating subtitles: {}", input.display());
            pipeline
                .translate_subtitle_file(&input, &output, &source_lang, &target_lang)
                .await?;
        }
    }

    info!("Revoice workflow completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let revoice_dir = std::env::current_dir()?.join(".revoice");
    let log_dir = revoice_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "revoice.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("revoice.log").display()
    );

    Ok(())
}
