// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::app_config::WorkerConfig;
use crate::subtitle_parser::SubtitleFormat;
use crate::worker::WorkerManager;

mod app_config;
mod errors;
mod language_utils;
mod subtitle_parser;
mod worker;

/// CLI Wrapper for SubtitleFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSubtitleFormat {
    Srt,
    Vtt,
}

impl From<CliSubtitleFormat> for SubtitleFormat {
    fn from(cli_format: CliSubtitleFormat) -> Self {
        match cli_format {
            CliSubtitleFormat::Srt => SubtitleFormat::Srt,
            CliSubtitleFormat::Vtt => SubtitleFormat::Vtt,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LevelFilter {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LevelFilter::Error,
            CliLogLevel::Warn => LevelFilter::Warn,
            CliLogLevel::Info => LevelFilter::Info,
            CliLogLevel::Debug => LevelFilter::Debug,
            CliLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a subtitle file and print cue statistics
    Parse(ParseArgs),

    /// Detect the format of a subtitle file
    Detect {
        /// Subtitle file to inspect
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,
    },

    /// Generate shell completions for shadowsync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ParseArgs {
    /// Subtitle file to parse
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Force a specific subtitle format instead of auto-detecting
    #[arg(short, long, value_enum)]
    format: Option<CliSubtitleFormat>,

    /// Print the parsed cues as JSON instead of statistics
    #[arg(short, long)]
    json: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// shadowsync - subtitle-synchronized playback engine
///
/// Inspection front end for the shadowsync engine: parse and examine the
/// subtitle files the playback core consumes.
#[derive(Parser, Debug)]
#[command(name = "shadowsync")]
#[command(version = "0.3.0")]
#[command(about = "Subtitle-synchronized playback engine for language practice")]
#[command(long_about = "shadowsync parses SRT and WebVTT subtitle files into the cue lists its
playback synchronization engine consumes.

EXAMPLES:
    shadowsync parse episode.srt                # Parse and print cue statistics
    shadowsync parse --json lesson.vtt          # Dump parsed cues as JSON
    shadowsync parse -f srt mislabeled.txt      # Force the SRT grammar
    shadowsync detect episode.srt               # Print the detected format
    shadowsync completions bash > shadowsync.bash")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "shadowsync", &mut std::io::stdout());
            Ok(())
        }
        Commands::Detect { input_path } => {
            let text = std::fs::read_to_string(&input_path)
                .with_context(|| format!("Failed to read subtitle file: {}", input_path.display()))?;
            println!("{}", subtitle_parser::detect_format(&text));
            Ok(())
        }
        Commands::Parse(args) => run_parse(args).await,
    }
}

async fn run_parse(options: ParseArgs) -> Result<()> {
    if let Some(level) = &options.log_level {
        log::set_max_level(level.clone().into());
    }

    let text = std::fs::read_to_string(&options.input_path)
        .with_context(|| format!("Failed to read subtitle file: {}", options.input_path.display()))?;

    let format_hint = options.format.map(SubtitleFormat::from);
    let detected = format_hint.unwrap_or_else(|| subtitle_parser::detect_format(&text));
    if detected == SubtitleFormat::Unknown {
        warn!("Unrecognized subtitle format in {}", options.input_path.display());
    }

    // Large files take the same offload path the engine uses, with a
    // progress bar fed from the worker's progress messages.
    let manager = WorkerManager::new(WorkerConfig::default());
    let progress_bar = ProgressBar::new(100);
    progress_bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let bar = Arc::new(progress_bar);
    let bar_for_worker = Arc::clone(&bar);

    let cues = manager
        .parse_async(
            &text,
            format_hint,
            Some(Box::new(move |percent| bar_for_worker.set_position(percent as u64))),
        )
        .await
        .map_err(|e| anyhow!("Parse failed: {}", e))?;
    bar.finish_and_clear();

    if cues.is_empty() {
        warn!("No cues parsed from {}", options.input_path.display());
    }

    if options.json {
        let json = serde_json::to_string_pretty(&cues).context("Failed to serialize cues")?;
        println!("{}", json);
        return Ok(());
    }

    info!("Parsed {} cues from {}", cues.len(), options.input_path.display());
    if let (Some(first), Some(last)) = (cues.first(), cues.last()) {
        println!("Format:   {}", detected);
        println!("Cues:     {}", cues.len());
        println!(
            "Range:    {} --> {}",
            subtitle_parser::format_timestamp(first.start, ','),
            subtitle_parser::format_timestamp(last.end, ',')
        );

        // Aggregate language buckets across all cues
        let mut languages: BTreeMap<&str, usize> = BTreeMap::new();
        for cue in &cues {
            for tag in cue.languages.keys() {
                *languages.entry(tag.as_str()).or_default() += 1;
            }
        }
        for (tag, count) in languages {
            let name = language_utils::language_display_name(tag)
                .unwrap_or_else(|_| tag.to_string());
            println!("Language: {} ({} cues)", name, count);
        }
    }

    manager.shutdown();
    Ok(())
}
