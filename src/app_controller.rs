use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::database::models::{SegmentMatch, TrackMetadata};
use crate::database::{DatabaseConnection, Repository};
use crate::file_utils::{FileManager, SUBTITLE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::media::{self, ClipRange, MediaTool};
use crate::normalizer::SegmentNormalizer;
use crate::qc::{QcReport, RuleConfig, RuleEngine};
use crate::transcription::SegmentSource;

// @module: Application controller sequencing normalization, QC, storage and media operations

/// Result of turning a transcript into an SRT file
#[derive(Debug, Clone)]
pub struct TranscriptOutcome {
    pub output_path: PathBuf,
    pub raw_segments: usize,
    pub cues: usize,
}

/// Outcome of a QC run over one file or a folder
#[derive(Debug, Default)]
pub struct QcRun {
    /// Reports for every file that parsed
    pub reports: Vec<(PathBuf, QcReport)>,

    /// Files that could not be read or parsed, with the error chain
    pub failures: Vec<(PathBuf, String)>,
}

impl QcRun {
    /// True when every file was checked and none has issues
    pub fn passed(&self) -> bool {
        self.failures.is_empty() && self.reports.iter().all(|(_, report)| report.passed())
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Normalizer built from the configuration
    pub fn normalizer(&self) -> SegmentNormalizer {
        SegmentNormalizer::new(self.config.normalizer.max_segment_duration_sec)
            .with_stage_order(self.config.normalizer.stage_order)
    }

    /// ffmpeg runner built from the configuration
    pub fn media_tool(&self) -> MediaTool {
        MediaTool::from_config(&self.config.media)
    }

    /// Open the subtitle database named in the configuration
    pub fn open_repository(&self) -> Result<Repository> {
        let path = self.config.storage.resolve_database_path();
        Ok(Repository::new(DatabaseConnection::new(path)?))
    }

    /// Load QC rules, seeding the rules file with broadcast defaults when it is missing
    pub fn load_rules(&self) -> Result<RuleConfig> {
        let rules_path = Path::new(&self.config.qc.rules_path);

        if !rules_path.exists() {
            warn!(
                "Rules file not found at '{}', creating it with broadcast defaults.",
                rules_path.display()
            );
            let defaults = RuleConfig::broadcast_defaults();
            let json = serde_json::to_string_pretty(&defaults.to_raw())
                .context("Failed to serialize default rules")?;
            FileManager::write_to_file(rules_path, &json)?;
            return Ok(defaults);
        }

        RuleConfig::load(rules_path)
    }

    /// Normalize the segments of `source` and write them as SRT to `output_path`
    pub async fn transcript_to_srt(&self, source: &dyn SegmentSource, output_path: &Path) -> Result<TranscriptOutcome> {
        let raw = source.segments().await?;
        let cues = self.normalizer().normalize(&raw);

        if cues.is_empty() {
            warn!("No usable segments in {}", source.describe());
        }

        FileManager::write_to_file(output_path, &crate::normalizer::render_srt(&cues))?;

        info!(
            "Wrote {} cues ({} raw segments) to {}",
            cues.len(),
            raw.len(),
            output_path.display()
        );

        Ok(TranscriptOutcome {
            output_path: output_path.to_path_buf(),
            raw_segments: raw.len(),
            cues: cues.len(),
        })
    }

    /// Run QC on one SRT file or on every SRT file below a directory
    ///
    /// A single unreadable file is an error. In folder mode such files are
    /// collected in `QcRun::failures` and the remaining files are still checked.
    pub async fn run_qc(&self, path: &Path, rules: RuleConfig) -> Result<QcRun> {
        let engine = RuleEngine::new(rules);

        if path.is_file() {
            let report = engine.check_file(path)?;
            return Ok(QcRun {
                reports: vec![(path.to_path_buf(), report)],
                failures: Vec::new(),
            });
        }

        if !path.is_dir() {
            return Err(anyhow!("Input path does not exist: {:?}", path));
        }

        let files = FileManager::find_files_with_extensions(path, SUBTITLE_EXTENSIONS)?;
        if files.is_empty() {
            warn!("No SRT files found in {}", path.display());
            return Ok(QcRun::default());
        }

        let progress = Self::progress_bar(files.len() as u64, "files");
        progress.set_message("Checking subtitles");

        let mut run = QcRun {
            reports: Vec::with_capacity(files.len()),
            failures: Vec::new(),
        };
        for file in files {
            match engine.check_file(&file) {
                Ok(report) => run.reports.push((file, report)),
                Err(e) => {
                    error!("{:#}", e);
                    run.failures.push((file, format!("{:#}", e)));
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        if !run.failures.is_empty() {
            warn!("{} of {} files could not be checked", run.failures.len(), run.failures.len() + run.reports.len());
        }

        Ok(run)
    }

    /// Store an SRT file in the subtitle library
    pub async fn save_track(&self, repository: &Repository, srt_path: &Path, metadata: &TrackMetadata) -> Result<i64> {
        let content = FileManager::read_to_string(srt_path)?;

        repository
            .save_track(&content, metadata)
            .await
            .with_context(|| format!("Failed to save subtitle track: {}", srt_path.display()))
    }

    /// Search stored segments by text
    pub async fn search(&self, repository: &Repository, query: &str) -> Result<Vec<SegmentMatch>> {
        repository.search_segments_by_text(query).await
    }

    /// Cut the video clip for a stored segment, with the configured margin
    pub async fn extract_segment_clip(&self, repository: &Repository, segment_id: i64) -> Result<PathBuf> {
        let found = repository
            .get_segment_by_id(segment_id)
            .await?
            .ok_or_else(|| anyhow!("Segment with ID {} not found in database", segment_id))?;

        let media_config = &self.config.media;
        let video_folder = Path::new(&media_config.video_folder);

        let video = media::find_video_for_filename(video_folder, &found.track.filename)?.ok_or_else(|| {
            anyhow!(
                "Could not find a video matching '{}' in {}",
                found.track.filename,
                video_folder.display()
            )
        })?;

        let range = ClipRange::with_margin(
            found.segment.time_start,
            found.segment.time_end,
            media_config.clip_margin_sec,
        )?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let output = Path::new(&media_config.segments_folder).join(media::clip_file_name(&found, &timestamp));

        info!("Extracting segment #{} from {}", segment_id, video.display());
        self.media_tool().extract_clip(&video, &range, &output).await
    }

    /// Extract WAV audio from every video in the configured video folder
    pub async fn extract_audio_from_folder(&self) -> Result<Vec<PathBuf>> {
        let start_time = std::time::Instant::now();
        let media_config = &self.config.media;

        let videos = FileManager::find_files_with_extensions(&media_config.video_folder, VIDEO_EXTENSIONS)?;
        if videos.is_empty() {
            warn!("No videos found in {}", media_config.video_folder);
            return Ok(Vec::new());
        }

        let tool = self.media_tool();
        let audio_dir = PathBuf::from(&media_config.audio_folder);
        let progress = Self::progress_bar(videos.len() as u64, "videos");
        progress.set_message("Extracting audio");

        let mut outputs = Vec::new();
        let mut error_count = 0;
        for video in &videos {
            match tool.extract_audio(video, &audio_dir).await {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    error!("{:#}", e);
                    error_count += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(
            "Audio extraction finished in {}: {} succeeded, {} failed",
            Self::format_duration(start_time.elapsed()),
            outputs.len(),
            error_count
        );

        Ok(outputs)
    }

    fn progress_bar(len: u64, unit: &str) -> ProgressBar {
        let progress = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style.progress_chars("#>-"));
        progress
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;

        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:01}s", seconds, duration.subsec_millis() / 100)
        }
    }
}
