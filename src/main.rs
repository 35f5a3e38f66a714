// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use subclean::app_config::{self, Config};
use subclean::app_controller::Controller;
use subclean::database::models::{TrackKind, TrackMetadata};
use subclean::file_utils::FileManager;
use subclean::normalizer::StageOrder;
use subclean::qc::{QcReport, RuleConfig};
use subclean::transcription::JsonSegmentSource;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for StageOrder to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliStageOrder {
    SplitThenValidate,
    ValidateThenSplit,
}

impl From<CliStageOrder> for StageOrder {
    fn from(cli_order: CliStageOrder) -> Self {
        match cli_order {
            CliStageOrder::SplitThenValidate => StageOrder::SplitThenValidate,
            CliStageOrder::ValidateThenSplit => StageOrder::ValidateThenSplit,
        }
    }
}

/// CLI Wrapper for TrackKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTrackKind {
    Video,
    Music,
    Series,
}

impl From<CliTrackKind> for TrackKind {
    fn from(cli_kind: CliTrackKind) -> Self {
        match cli_kind {
            CliTrackKind::Video => TrackKind::Video,
            CliTrackKind::Music => TrackKind::Music,
            CliTrackKind::Series => TrackKind::Series,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Turn transcription segments (JSON) into a normalized SRT file
    Normalize(NormalizeArgs),

    /// Check SRT files against the QC rules
    Qc(QcArgs),

    /// Store an SRT file in the subtitle library
    Save(SaveArgs),

    /// Search stored subtitle segments by text
    Search {
        /// Word or phrase to look for
        #[arg(value_name = "TEXT")]
        text: String,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract the video clip of a stored segment
    Clip {
        /// Segment ID as shown by `search`
        #[arg(value_name = "SEGMENT_ID")]
        segment_id: i64,
    },

    /// Extract WAV audio from every video in the video folder
    ExtractAudio,

    /// Generate shell completions for subclean
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// JSON array of {start, end, text} segments in centiseconds
    #[arg(value_name = "SEGMENTS_JSON")]
    input_path: PathBuf,

    /// Output SRT file (defaults to the subtitles folder)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Longest cue allowed, in seconds
    #[arg(long)]
    max_duration: Option<f64>,

    /// Order of the validation and split stages
    #[arg(long, value_enum)]
    stage_order: Option<CliStageOrder>,
}

#[derive(Args, Debug)]
struct QcArgs {
    /// SRT file or directory of SRT files
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Rules file (overrides the configured path)
    #[arg(short, long)]
    rules: Option<String>,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SaveArgs {
    /// SRT file to store
    #[arg(value_name = "SRT_FILE")]
    srt_path: PathBuf,

    /// What the subtitles belong to
    #[arg(short, long, value_enum, default_value = "video")]
    kind: CliTrackKind,

    /// Video title (video kind)
    #[arg(long)]
    title: Option<String>,

    /// Series name (series kind)
    #[arg(long)]
    series: Option<String>,

    #[arg(long)]
    season: Option<u32>,

    #[arg(long)]
    episode: Option<u32>,

    /// Music title (music kind)
    #[arg(long)]
    music_title: Option<String>,

    /// Language code or name (e.g. 'en', 'por', 'German')
    #[arg(short, long)]
    language: String,

    /// Media file the subtitles belong to (defaults to the SRT file name)
    #[arg(long)]
    media_file: Option<String>,
}

/// subclean - subtitle normalization and quality control
///
/// Turns speech-to-text segments into clean SRT subtitles, checks subtitle
/// files against broadcast rules, and keeps a searchable subtitle library.
#[derive(Parser, Debug)]
#[command(name = "subclean")]
#[command(version)]
#[command(about = "Subtitle normalization and quality control")]
#[command(long_about = "subclean turns transcription segments into SRT subtitles and checks them against QC rules.

EXAMPLES:
    subclean normalize segments.json -o movie.srt   # Segments to SRT
    subclean qc movie.srt                           # Check one file
    subclean qc --json media/subtitles/             # Check a folder, JSON report
    subclean save movie.srt -l en --title Heat      # Store in the library
    subclean search \"station\"                       # Find segments by text
    subclean clip 42                                # Cut the video clip of segment 42
    subclean completions bash > subclean.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. QC thresholds live in a separate rules file
    (rules.json by default).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short = 'L', long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    #[serde(flatten)]
    report: Option<&'a QcReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Start at Trace so the level can be lowered once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "subclean", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::load_or_create(&cli.config_path)?;

    // Update log level in config if specified via command line
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Normalize(args) => run_normalize(config, args).await,
        Commands::Qc(args) => run_qc(config, args).await,
        Commands::Save(args) => run_save(config, args).await,
        Commands::Search { text, json } => run_search(config, &text, json).await,
        Commands::Clip { segment_id } => {
            let controller = Controller::with_config(config)?;
            let repository = controller.open_repository()?;
            let output = controller.extract_segment_clip(&repository, segment_id).await?;
            println!("{}", output.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::ExtractAudio => {
            let controller = Controller::with_config(config)?;
            for output in controller.extract_audio_from_folder().await? {
                println!("{}", output.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { .. } => Ok(ExitCode::SUCCESS),
    }
}

async fn run_normalize(mut config: Config, args: NormalizeArgs) -> Result<ExitCode> {
    // Override config with CLI options if provided
    if let Some(max) = args.max_duration {
        config.normalizer.max_segment_duration_sec = max;
    }
    if let Some(order) = args.stage_order {
        config.normalizer.stage_order = order.into();
    }

    let output = args
        .output
        .unwrap_or_else(|| FileManager::generate_srt_path(&args.input_path, &config.media.subtitles_folder));

    let controller = Controller::with_config(config)?;
    let source = JsonSegmentSource::new(&args.input_path);
    let outcome = controller.transcript_to_srt(&source, &output).await?;

    println!("{}", outcome.output_path.display());
    Ok(ExitCode::SUCCESS)
}

async fn run_qc(mut config: Config, args: QcArgs) -> Result<ExitCode> {
    if let Some(rules) = args.rules {
        config.qc.rules_path = rules;
    }

    let controller = Controller::with_config(config)?;
    let rules: RuleConfig = controller.load_rules()?;
    let run = controller.run_qc(&args.input_path, rules).await?;

    if args.json {
        let reports = run.reports.iter().map(|(file, report)| FileReport {
            file,
            report: Some(report),
            error: None,
        });
        let failures = run.failures.iter().map(|(file, error)| FileReport {
            file,
            report: None,
            error: Some(error),
        });
        let output: Vec<FileReport> = reports.chain(failures).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize QC report")?
        );
    } else {
        for (file, report) in &run.reports {
            if report.passed() {
                println!("{}: no QC issues found ({} subtitles)", file.display(), report.subtitle_count);
                continue;
            }

            println!("{}: {} QC issues", file.display(), report.issues.len());
            for issue in &report.issues {
                println!("{}", issue);
            }
        }
        for (file, error) in &run.failures {
            println!("{}: could not be checked: {}", file.display(), error);
        }
    }

    if run.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn run_save(config: Config, args: SaveArgs) -> Result<ExitCode> {
    let filename = match args.media_file {
        Some(name) => name,
        None => args
            .srt_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("Invalid SRT path: {:?}", args.srt_path))?,
    };

    let metadata = TrackMetadata {
        kind: args.kind.into(),
        video_title: args.title,
        series: args.series,
        season: args.season,
        episode: args.episode,
        music_title: args.music_title,
        language: args.language,
        filename,
    };

    let controller = Controller::with_config(config)?;
    let repository = controller.open_repository()?;
    let id = controller.save_track(&repository, &args.srt_path, &metadata).await?;

    info!("Subtitle track stored with ID {}", id);
    println!("{}", id);
    Ok(ExitCode::SUCCESS)
}

async fn run_search(config: Config, text: &str, json: bool) -> Result<ExitCode> {
    let controller = Controller::with_config(config)?;
    let repository = controller.open_repository()?;
    let matches = controller.search(&repository, text).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&matches).context("Failed to serialize search results")?
        );
    } else if matches.is_empty() {
        println!("No segments found containing: '{}'", text);
    } else {
        for found in &matches {
            println!("{}", found);
        }
    }

    Ok(ExitCode::SUCCESS)
}
