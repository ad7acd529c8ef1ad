//! limit-check - run servegate input-limit checks from the command line
//!
//! # Usage
//!
//! ```bash
//! # Page count of a PDF against the configured limit
//! limit-check pdf report.pdf
//!
//! # Audio duration with an explicit limit, file passed as raw bytes
//! limit-check audio --format raw --limit 30 clip.wav
//!
//! # Total characters over several segments, JSON output
//! limit-check --json text "first segment" "second segment"
//!
//! # Which media backends this build has
//! limit-check capabilities
//! ```
//!
//! Exit status: 0 pass, 1 fail, 2 indeterminate, 3 error.

mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use servegate_core::{
    init_logging, CheckOutcome, Config, ConfigSource, FormatHint, Input, LimitChecker,
    LimitsConfig, Modality,
};
use std::path::PathBuf;
use std::process::ExitCode;

use report::{exit_status, Report, EXIT_ERROR};

/// Check model-serving inputs against size, duration and count limits
#[derive(Parser)]
#[command(name = "limit-check")]
#[command(author, version)]
#[command(about = "Check text, audio, images, PDF, video and DICOM inputs against limits")]
struct Args {
    /// TOML configuration file (limits and logging)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log file, overrides the configuration
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log level, overrides the configuration
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Total characters over one or more text values
    Text {
        /// Text values; more than one is checked as a sequence
        #[arg(required = true)]
        values: Vec<String>,

        /// Character limit
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Audio duration in seconds
    Audio(MediaArgs),

    /// Number of image references
    Images(CountArgs),

    /// PDF page count
    Pdf(MediaArgs),

    /// Video duration in seconds
    Video(MediaArgs),

    /// Number of DICOM file references
    Dicom(CountArgs),

    /// List the media backends available in this build
    Capabilities,
}

#[derive(clap::Args)]
struct MediaArgs {
    /// Media file
    input: PathBuf,

    /// How to hand the file to the checker
    #[arg(short, long, value_enum, default_value_t = InputFormat::Path)]
    format: InputFormat,

    /// Limit in the modality's unit
    #[arg(short, long)]
    limit: Option<f64>,
}

#[derive(clap::Args)]
struct CountArgs {
    /// File references
    #[arg(required = true)]
    refs: Vec<String>,

    /// Maximum number of references
    #[arg(short, long)]
    limit: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputFormat {
    /// Pass the file path
    Path,
    /// Read the file and pass its bytes
    Raw,
    /// Read the file as a base64 text payload
    Base64,
}

impl MediaArgs {
    fn to_input(&self) -> Result<(Input, FormatHint)> {
        Ok(match self.format {
            InputFormat::Path => (Input::Path(self.input.clone()), FormatHint::Auto),
            InputFormat::Raw => {
                let bytes = std::fs::read(&self.input)
                    .with_context(|| format!("Failed to read {}", self.input.display()))?;
                (Input::Bytes(bytes), FormatHint::Auto)
            }
            InputFormat::Base64 => {
                let text = std::fs::read_to_string(&self.input)
                    .with_context(|| format!("Failed to read {}", self.input.display()))?;
                (Input::Text(text), FormatHint::Base64)
            }
        })
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(args: Args) -> Result<u8> {
    let (mut config, source) = Config::load_with_source(args.config.as_deref())
        .with_context(|| "Failed to load configuration")?;
    if let Some(file) = args.log_file {
        config.logging.file = file;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    let log = init_logging(&config.logging).context("Failed to set up logging")?;
    log.install_global()?;

    match &source {
        ConfigSource::MissingFile(path) => {
            tracing::warn!("config file {} not found, using defaults", path.display())
        }
        ConfigSource::File(path) => tracing::debug!("loaded config from {}", path.display()),
        ConfigSource::Environment => {}
    }

    let checker = LimitChecker::new();
    let mut limits = config.limits.clone();

    let (modality, outcome) = match args.command {
        Command::Capabilities => {
            let caps = checker.capabilities();
            if args.json {
                println!("{}", serde_json::to_string(&caps)?);
            } else {
                for modality in Modality::ALL {
                    let state = if caps.supports(modality) {
                        "available"
                    } else {
                        "unavailable"
                    };
                    println!("{}: {}", modality, state);
                }
            }
            return Ok(0);
        }
        Command::Text { values, limit } => {
            if let Some(limit) = limit {
                limits.text_chars = limit;
            }
            let input = match <[String; 1]>::try_from(values) {
                Ok([single]) => Input::Text(single),
                Err(values) => Input::TextList(values),
            };
            (Modality::Text, checker.check_text(&input, limits.text_chars))
        }
        Command::Images(count) => count_check(&checker, &mut limits, Modality::Images, count),
        Command::Dicom(count) => count_check(&checker, &mut limits, Modality::Dicom, count),
        Command::Audio(media) => media_check(&checker, &mut limits, Modality::Audio, &media)?,
        Command::Pdf(media) => media_check(&checker, &mut limits, Modality::Pdf, &media)?,
        Command::Video(media) => media_check(&checker, &mut limits, Modality::Video, &media)?,
    };

    Report::new(modality, limits.limit_for(modality), &outcome).print(args.json)?;
    tracing::debug!("limit-check finished: {}", outcome);
    Ok(exit_status(&outcome))
}

fn count_check(
    checker: &LimitChecker,
    limits: &mut LimitsConfig,
    modality: Modality,
    args: CountArgs,
) -> (Modality, CheckOutcome) {
    if let Some(limit) = args.limit {
        limits.set_limit(modality, limit as f64);
    }
    let input = Input::TextList(args.refs);
    (
        modality,
        checker.check(modality, &input, limits, FormatHint::Auto),
    )
}

fn media_check(
    checker: &LimitChecker,
    limits: &mut LimitsConfig,
    modality: Modality,
    args: &MediaArgs,
) -> Result<(Modality, CheckOutcome)> {
    if let Some(limit) = args.limit {
        limits.set_limit(modality, limit);
    }
    let (input, hint) = args.to_input()?;
    Ok((modality, checker.check(modality, &input, limits, hint)))
}
