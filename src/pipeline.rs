use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::align::{AlignerFactory, ForcedAligner, resolver};
use crate::audio::AudioClip;
use crate::config::Config;
use crate::error::{Result, RevoiceError};
use crate::media::{MediaProcessor, MediaProcessorFactory};
use crate::report::{DurationMismatch, FaultKind, RunReport};
use crate::segment::{AlignmentResult, PlannedSegment, Segment, StretchedSegment};
use crate::stretch::{StretchExecutor, StretcherFactory, planner};
use crate::subtitle;
use crate::synth::{Synthesizer, SynthesizerFactory, prepare_voice_samples};
use crate::timing;
use crate::track;
use crate::transcript;
use crate::translate::{Translator, TranslatorFactory, check_ollama_availability};

/// Options for a single dubbing run.
#[derive(Debug, Clone)]
pub struct DubOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    /// Whisper-style JSON transcript of the source audio
    pub transcript: Option<PathBuf>,
    /// Human-authored subtitle file, used instead of a transcript
    pub srt: Option<PathBuf>,
    pub source_lang: String,
    pub target_lang: String,
    pub voice_id: Option<String>,
    pub clone_voice: bool,
    pub save_srt: bool,
    pub word_level_srt: bool,
    pub keep_temp: bool,
}

/// The end-to-end dubbing workflow.
///
/// Stages run strictly left to right: ingest, normalize, translate,
/// synthesize, resolve alignment, plan, stretch, assemble, remux. Each stage
/// consumes the previous stage's segment sequence by value and produces a new
/// one; per-segment faults are collected into the run report instead of
/// aborting siblings.
pub struct Pipeline {
    config: Config,
    media: Box<dyn MediaProcessor>,
    translator: Box<dyn Translator>,
    synthesizer: Arc<dyn Synthesizer>,
    aligner: Box<dyn ForcedAligner>,
    executor: StretchExecutor,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        media.check_availability()?;

        let translator = TranslatorFactory::create_default(config.translate.clone());
        let synthesizer: Arc<dyn Synthesizer> =
            SynthesizerFactory::create_default(config.synthesis.clone()).into();
        let aligner = AlignerFactory::create_default(config.alignment.clone());
        let executor = StretchExecutor::new(
            StretcherFactory::create_default(config.stretch.clone()),
            config.stretch.clone(),
        );

        Ok(Self {
            config,
            media,
            translator,
            synthesizer,
            aligner,
            executor,
        })
    }

    /// Construct a pipeline from explicit collaborators; used by tests and
    /// callers that need non-default backends.
    pub fn with_collaborators(
        config: Config,
        media: Box<dyn MediaProcessor>,
        translator: Box<dyn Translator>,
        synthesizer: Arc<dyn Synthesizer>,
        aligner: Box<dyn ForcedAligner>,
        executor: StretchExecutor,
    ) -> Self {
        Self {
            config,
            media,
            translator,
            synthesizer,
            aligner,
            executor,
        }
    }

    /// Dub a single video file.
    pub async fn dub(&self, opts: &DubOptions) -> Result<RunReport> {
        if !opts.input.exists() {
            return Err(RevoiceError::FileNotFound(opts.input.display().to_string()));
        }

        let run_id = Uuid::new_v4();
        let mut report = RunReport::new(&opts.source_lang, &opts.target_lang);
        info!("Starting dubbing run {}: {}", run_id, opts.input.display());

        let output = match &opts.output {
            Some(path) => path.clone(),
            None => default_output_path(&opts.input, &opts.target_lang)?,
        };

        let temp = tempfile::Builder::new()
            .prefix(&format!("revoice-{}-", run_id))
            .tempdir()?;

        let sample_rate = self.config.synthesis.sample_rate;

        // Stage 1: extract the original audio and probe the timeline length
        let audio_path = temp.path().join("original.wav");
        self.media
            .extract_audio(&opts.input, &audio_path, sample_rate)
            .await?;
        let original_duration = self.media.probe_duration(&opts.input).await?;
        info!("Original duration: {:.2}s", original_duration);

        // Stage 2: ingest segments from the transcript or subtitle file
        let raw_segments = self.ingest(opts).await?;

        // Stage 3: normalize timing
        let segments = timing::normalize(raw_segments, &self.config.timing)?;
        report.total_segments = segments.len();

        // Stage 4: translate
        check_ollama_availability(&self.config.translate.endpoint, &self.config.translate.model)
            .await?;
        let segments = self.translate_segments(segments, opts, &mut report).await;

        // Stage 5: pick or clone the voice
        let voice_id = self.select_voice(opts, &audio_path, &segments).await?;
        info!("Using voice: {}", voice_id);

        // Stage 6: synthesize target-language audio per segment
        let synthesized = self.synthesize_segments(&segments, &voice_id).await;

        // Stage 7: advisory word-level alignment for subtitle artifacts
        let segments = self
            .resolve_alignments(segments, &audio_path, opts, &mut report)
            .await;

        // Stage 8/9: plan and execute stretches, with placeholder silence for
        // segments that produced no usable audio
        let stretched = self
            .fit_segments(&segments, synthesized, &mut report)
            .await?;

        // Stage 10: assemble the continuous track
        let track = track::assemble(&stretched, sample_rate, Some(original_duration))?;
        let track_path = temp.path().join("dubbed.wav");
        track.write_wav(&track_path)?;
        info!("Assembled track: {:.2}s", track.duration_secs());

        // Stage 11: remux, copying the video stream untouched
        self.media
            .replace_audio(&opts.input, &track_path, &output)
            .await?;
        info!("Dubbed video written: {}", output.display());

        // Stage 12: subtitle artifacts
        if opts.save_srt {
            let srt_path = output.with_extension("srt");
            subtitle::generate_srt(&segments, &srt_path).await?;
        }
        if opts.word_level_srt {
            let srt_path = output.with_extension("words.srt");
            subtitle::generate_word_srt(&segments, &srt_path).await?;
        }

        report.finish(DurationMismatch::calculate(
            original_duration,
            track.duration_secs(),
            self.config.pipeline.mismatch_warn_percent,
        ));
        report.save(output.with_extension("report.json")).await?;

        if opts.keep_temp {
            let kept = temp.keep();
            info!("Temporary files kept in: {}", kept.display());
        }

        Ok(report)
    }

    /// Dub every video file in a directory that has a sidecar transcript or
    /// subtitle file next to it.
    pub async fn dub_directory(&self, input_dir: &Path, opts: &DubOptions) -> Result<()> {
        if !input_dir.is_dir() {
            return Err(RevoiceError::Config(
                "Input path is not a directory".to_string(),
            ));
        }

        let video_extensions = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];
        let mut video_files = Vec::new();

        for entry in walkdir::WalkDir::new(input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) {
                if video_extensions.contains(&ext.to_lowercase().as_str()) {
                    video_files.push(entry.path().to_path_buf());
                }
            }
        }

        info!("Found {} video files to process", video_files.len());

        for video_path in video_files {
            let transcript = video_path.with_extension("json");
            let srt = video_path.with_extension("srt");

            let mut file_opts = opts.clone();
            file_opts.input = video_path.clone();
            file_opts.output = None;
            if transcript.exists() {
                file_opts.transcript = Some(transcript);
                file_opts.srt = None;
            } else if srt.exists() {
                file_opts.srt = Some(srt);
                file_opts.transcript = None;
            } else {
                warn!(
                    "Skipping {}: no sidecar transcript or subtitle file",
                    video_path.display()
                );
                continue;
            }

            match self.dub(&file_opts).await {
                Ok(report) => {
                    report.print_summary();
                    info!("Successfully processed: {}", video_path.display());
                }
                Err(e) => warn!("Failed to process {}: {}", video_path.display(), e),
            }
        }

        Ok(())
    }

    /// Extract the audio track of a video file.
    pub async fn extract_audio(&self, input: &Path, output: &Path) -> Result<()> {
        self.media
            .extract_audio(input, output, self.config.synthesis.sample_rate)
            .await
    }

    /// Translate a subtitle file, keeping its timing.
    pub async fn translate_subtitle_file(
        &self,
        input: &Path,
        output: &Path,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<()> {
        check_ollama_availability(&self.config.translate.endpoint, &self.config.translate.model)
            .await?;

        let mut segments = subtitle::parse_srt(input).await?;
        for segment in &mut segments {
            match self
                .translator
                .translate(&segment.source_text, source_lang, target_lang)
                .await
            {
                Ok(translation) => segment.target_text = Some(translation),
                Err(e) => warn!(
                    "Segment {}: translation failed, keeping source text: {}",
                    segment.index, e
                ),
            }
        }

        subtitle::generate_srt(&segments, output).await
    }

    async fn ingest(&self, opts: &DubOptions) -> Result<Vec<Segment>> {
        match (&opts.transcript, &opts.srt) {
            (Some(path), _) => transcript::load_transcript(path).await,
            (None, Some(path)) => subtitle::parse_srt(path).await,
            (None, None) => Err(RevoiceError::Config(
                "Provide either a transcript (--transcript) or a subtitle file (--srt)".to_string(),
            )),
        }
    }

    async fn translate_segments(
        &self,
        mut segments: Vec<Segment>,
        opts: &DubOptions,
        report: &mut RunReport,
    ) -> Vec<Segment> {
        let total = segments.len();
        for (idx, segment) in segments.iter_mut().enumerate() {
            info!(
                "Translating segment {}/{}: {}",
                idx + 1,
                total,
                segment.source_text
            );
            match self
                .translator
                .translate(&segment.source_text, &opts.source_lang, &opts.target_lang)
                .await
            {
                Ok(translation) => {
                    info!("Translated: {}", translation);
                    segment.target_text = Some(translation);
                }
                Err(e) => {
                    warn!(
                        "Segment {}: translation failed, synthesizing source text: {}",
                        segment.index, e
                    );
                    report.record(segment.index, FaultKind::TranslationFallback, e.to_string());
                }
            }
        }
        segments
    }

    async fn select_voice(
        &self,
        opts: &DubOptions,
        audio_path: &Path,
        segments: &[Segment],
    ) -> Result<String> {
        if opts.clone_voice {
            info!("Cloning voice from original audio");
            let original = AudioClip::read_wav(audio_path)?;
            let samples = prepare_voice_samples(
                &original,
                segments,
                self.config.synthesis.max_voice_samples,
            );
            let stem = opts
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "revoice".to_string());
            return self
                .synthesizer
                .clone_voice(&format!("{}_voice", stem), &samples)
                .await;
        }

        Ok(opts
            .voice_id
            .clone()
            .unwrap_or_else(|| self.config.synthesis.voice_id.clone()))
    }

    /// Synthesize all segments concurrently, bounded by the configured
    /// concurrency limit. Completion order is arbitrary; results are routed
    /// into indexed slots so downstream stages see strict segment order.
    async fn synthesize_segments(
        &self,
        segments: &[Segment],
        voice_id: &str,
    ) -> Vec<Option<Result<AudioClip>>> {
        let semaphore = Arc::new(Semaphore::new(
            self.config.pipeline.synthesis_concurrency.max(1),
        ));
        let mut join_set = JoinSet::new();

        let progress = ProgressBar::new(segments.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        progress.set_message("Synthesizing");

        for segment in segments {
            let synthesizer = Arc::clone(&self.synthesizer);
            let semaphore = Arc::clone(&semaphore);
            let text = segment.spoken_text().to_string();
            let voice = voice_id.to_string();
            let index = segment.index;

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = synthesizer.synthesize(&text, &voice).await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<Result<AudioClip>>> = (0..segments.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            progress.inc(1);
            match joined {
                Ok((index, result)) => {
                    if let Err(e) = &result {
                        warn!("Segment {}: synthesis failed: {}", index, e);
                    }
                    slots[index] = Some(result);
                }
                Err(e) => warn!("Synthesis task panicked: {}", e),
            }
        }
        progress.finish_and_clear();

        slots
    }

    /// Ask the forced-alignment service for word timing and redistribute it
    /// onto the translated text. Advisory only: failures and unusable data
    /// fall back to segment-level timing and never touch the audio path.
    async fn resolve_alignments(
        &self,
        mut segments: Vec<Segment>,
        audio_path: &Path,
        opts: &DubOptions,
        report: &mut RunReport,
    ) -> Vec<Segment> {
        if !opts.word_level_srt && !self.config.alignment.word_level {
            return segments;
        }

        let transcript_text = segments
            .iter()
            .map(|s| s.source_text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        match self.aligner.align(audio_path, &transcript_text).await {
            Ok(words) => {
                info!("Forced alignment produced {} words", words.len());
                for segment in &mut segments {
                    let inside: Vec<_> = words
                        .iter()
                        .filter(|w| {
                            let mid = (w.start + w.end) / 2.0;
                            mid >= segment.start && mid < segment.end
                        })
                        .cloned()
                        .collect();
                    segment.words = (!inside.is_empty()).then_some(inside);
                }
            }
            Err(e) => {
                warn!("Forced alignment failed, falling back to segment timing: {}", e);
            }
        }

        for segment in &mut segments {
            let target = segment.spoken_text().to_string();
            let alignment = resolver::resolve(segment, &target, &self.config.alignment);
            segment.alignment = alignment;
            if segment.alignment == AlignmentResult::SegmentLevel {
                report.record(
                    segment.index,
                    FaultKind::AlignmentFallback,
                    "word-level timing unavailable or unusable",
                );
            }
        }

        segments
    }

    /// Plan and execute the time stretch for every segment. Segments whose
    /// synthesis or plan failed get placeholder silence of the exact target
    /// duration so assembly can proceed; the run aborts only when the failed
    /// fraction exceeds the configured quorum.
    async fn fit_segments(
        &self,
        segments: &[Segment],
        mut synthesized: Vec<Option<Result<AudioClip>>>,
        report: &mut RunReport,
    ) -> Result<Vec<StretchedSegment>> {
        let sample_rate = self.config.synthesis.sample_rate;
        let mut stretched = Vec::with_capacity(segments.len());

        for segment in segments {
            let slot = synthesized
                .get_mut(segment.index)
                .and_then(Option::take)
                .unwrap_or_else(|| {
                    Err(RevoiceError::Synthesis("no synthesis result".to_string()))
                });

            let clip = match slot {
                Ok(clip) => clip,
                Err(e) => {
                    report.record(segment.index, FaultKind::PlaceholderSilence, e.to_string());
                    stretched.push(placeholder(segment, sample_rate));
                    continue;
                }
            };

            let plan = match planner::plan(segment, clip.duration_secs(), &self.config.stretch) {
                Ok(plan) => plan,
                Err(e) => {
                    warn!("Segment {}: {}", segment.index, e);
                    report.record(segment.index, FaultKind::PlaceholderSilence, e.to_string());
                    stretched.push(placeholder(segment, sample_rate));
                    continue;
                }
            };

            if !plan.within_bounds {
                report.record(
                    segment.index,
                    FaultKind::RatioOutOfBounds,
                    format!("ratio {:.3}", plan.ratio),
                );
            }

            let planned = PlannedSegment {
                segment: segment.clone(),
                clip,
                plan,
            };

            match self.executor.execute(planned).await {
                Ok(result) => {
                    if result.degraded {
                        report.record(
                            segment.index,
                            FaultKind::StretchDegraded,
                            format!(
                                "duration {:.3}s for target {:.3}s",
                                result.clip.duration_secs(),
                                segment.duration()
                            ),
                        );
                    }
                    stretched.push(result);
                }
                Err(e) => {
                    warn!("Segment {}: stretch failed: {}", segment.index, e);
                    report.record(segment.index, FaultKind::PlaceholderSilence, e.to_string());
                    stretched.push(placeholder(segment, sample_rate));
                }
            }
        }

        let failed = report.unrecoverable_count();
        let total = segments.len().max(1);
        if (failed as f64 / total as f64) > self.config.pipeline.fault_quorum {
            return Err(RevoiceError::Synthesis(format!(
                "{} of {} segments failed unrecoverably, aborting the run",
                failed, total
            )));
        }

        Ok(stretched)
    }
}

/// Placeholder silence covering a segment's original-timeline span.
fn placeholder(segment: &Segment, sample_rate: u32) -> StretchedSegment {
    StretchedSegment {
        segment: segment.clone(),
        clip: AudioClip::silence(segment.duration(), sample_rate),
        degraded: false,
    }
}

fn default_output_path(input: &Path, target_lang: &str) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| RevoiceError::Config("Invalid input filename".to_string()))?
        .to_string_lossy();
    let extension = input.extension().map(|e| e.to_string_lossy().to_string());

    let file_name = match extension {
        Some(ext) => format!("{}_{}.{}", stem, target_lang, ext),
        None => format!("{}_{}", stem, target_lang),
    };

    Ok(input
        .parent()
        .map(|p| p.join(&file_name))
        .unwrap_or_else(|| PathBuf::from(file_name)))
}
