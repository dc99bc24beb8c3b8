//! Quick GIF - command-line front end.
//!
//! Thin shell over `quickgif_core`: resolves the settings file and the
//! encoder, runs one job at a time and renders its progress on stderr.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use quickgif_core::config::{ConfigError, ConfigManager, Settings};
use quickgif_core::encoder::find_on_path;
use quickgif_core::logging::{init_tracing, LogLevel};
use quickgif_core::staging::StagingArea;
use quickgif_core::{ConversionRequest, ConversionResult, Coordinator, ErrorKind, JobObserver};

const SETTINGS_FILE: &str = "settings.toml";
const DEFAULT_ENCODER: &str = "ffmpeg";
const BAR_WIDTH: usize = 30;
const INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "quickgif")]
#[command(about = "Turn a batch of still images into an animated GIF")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More output; repeat for trace level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert images (files or one directory) into a GIF
    Convert {
        /// Image files, or a single directory of images
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Frames per second
        #[arg(long)]
        fps: Option<String>,

        /// Output square edge in pixels
        #[arg(long)]
        resolution: Option<String>,

        /// Copy the finished GIF here (file or directory)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Encoder executable (overrides the settings file)
        #[arg(long)]
        encoder: Option<PathBuf>,

        /// Leave the staged frames in place after exit
        #[arg(long)]
        keep_staging: bool,
    },

    /// Show what a selection would stage, without touching anything
    Inspect {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove the staging directory
    Clean,

    /// Print the settings path and contents
    Config {
        /// Write a default settings file if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Renders job updates on stderr.
struct CliObserver {
    verbose: bool,
}

impl JobObserver for CliObserver {
    fn on_progress(&self, value: f64) {
        let filled = ((value * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
        let mut stderr = std::io::stderr().lock();
        let _ = write!(
            stderr,
            "\r[{}{}] {:>3.0}%",
            "#".repeat(filled),
            " ".repeat(BAR_WIDTH - filled),
            value * 100.0
        );
        if value >= 1.0 {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }

    fn on_status(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn on_log(&self, line: &str) {
        if self.verbose {
            eprintln!("{}", line);
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    let mut settings = load_settings(&config_path)?;
    let level = log_level(cli.verbose, settings.logging.level);
    if cli.verbose > 0 {
        settings.logging.level = level;
        settings.logging.compact = false;
    }
    let _guard = init_tracing(level, Some(&settings.logs_dir()));
    tracing::info!("quickgif {}", quickgif_core::version());

    match cli.command {
        Commands::Convert {
            paths,
            fps,
            resolution,
            out,
            encoder,
            keep_staging,
        } => {
            resolve_encoder(&mut settings, encoder);
            if keep_staging {
                settings.cleanup.sweep_on_shutdown = false;
            }
            let fps = fps.unwrap_or_else(|| settings.encoder.default_framerate.to_string());
            let resolution =
                resolution.unwrap_or_else(|| settings.encoder.default_resolution.to_string());
            convert(settings, paths, fps, resolution, out, cli.verbose > 0)
        }
        Commands::Inspect { paths } => {
            let coordinator = Coordinator::new(settings);
            let summary = coordinator.inspect(paths);
            println!("candidates: {}", summary.candidate_count);
            println!(
                "format:     {}",
                summary.family.as_deref().unwrap_or("(none)")
            );
            println!("frames:     {}", summary.staged_count);
            println!("mixed:      {}", if summary.mixed_formats { "yes" } else { "no" });
            Ok(ExitCode::SUCCESS)
        }
        Commands::Clean => {
            let staging = StagingArea::new(settings.staging_dir());
            let removed = staging
                .sweep()
                .with_context(|| format!("failed to remove {}", staging.dir().display()))?;
            if removed {
                println!("Removed {}", staging.dir().display());
            } else {
                println!("Nothing to clean");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { init } => show_config(&config_path, init),
    }
}

fn convert(
    settings: Settings,
    paths: Vec<PathBuf>,
    fps: String,
    resolution: String,
    out: Option<PathBuf>,
    verbose: bool,
) -> Result<ExitCode> {
    let coordinator = Coordinator::new(settings);
    let observer = Arc::new(CliObserver { verbose });
    let request = ConversionRequest::new(paths, fps, resolution);

    let handle = coordinator
        .start(request, observer)
        .context("could not start conversion")?;

    // First Ctrl-C cancels the job, a second one exits immediately.
    let cancel = handle.cancel_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        if cancel.is_cancelled() {
            std::process::exit(i32::from(INTERRUPTED));
        }
        eprintln!("\nCancelling...");
        cancel.cancel();
    }) {
        tracing::warn!("Cannot install Ctrl-C handler: {}", e);
    }

    let result = handle.wait();

    match result {
        ConversionResult::Success { output_path, .. } => {
            let produced = match out {
                Some(destination) => coordinator.export(&output_path, &destination)?,
                None => output_path,
            };
            println!("{}", produced.display());
            Ok(ExitCode::SUCCESS)
        }
        ConversionResult::Failure { kind, message, .. } => {
            if message.lines().count() > 1 {
                // Status line was already printed; show the encoder tail too.
                eprintln!("{}", message);
            }
            Ok(ExitCode::from(exit_code_for(kind)))
        }
    }
}

fn show_config(path: &Path, init: bool) -> Result<ExitCode> {
    if init {
        let mut manager = ConfigManager::new(path);
        manager
            .load_or_create()
            .with_context(|| format!("failed to initialize {}", path.display()))?;
    }

    println!("# {}", path.display());
    if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        print!("{}", contents);
    } else {
        println!("# (not created; defaults in effect, run `quickgif config --init`)");
    }
    Ok(ExitCode::SUCCESS)
}

fn default_config_path() -> Result<PathBuf> {
    let Some(dirs) = ProjectDirs::from("io.github", "quickgif", "quickgif") else {
        bail!("no home directory found; pass --config");
    };
    Ok(dirs.config_dir().join(SETTINGS_FILE))
}

/// Load settings without creating the file; a missing file means defaults.
fn load_settings(path: &Path) -> Result<Settings> {
    let mut manager = ConfigManager::new(path);
    match manager.load() {
        Ok(()) => Ok(manager.into_settings()),
        Err(ConfigError::NotFound(_)) => Ok(Settings::default()),
        Err(e) => Err(e).with_context(|| format!("failed to load {}", path.display())),
    }
}

/// `--encoder`, then the settings file, then `ffmpeg` on PATH.
fn resolve_encoder(settings: &mut Settings, flag: Option<PathBuf>) {
    let resolved = flag
        .or_else(|| settings.encoder_path())
        .or_else(|| find_on_path(DEFAULT_ENCODER));

    if let Some(path) = resolved {
        settings.encoder.path = path.to_string_lossy().into_owned();
    }
}

fn log_level(verbose: u8, configured: LogLevel) -> LogLevel {
    match verbose {
        0 => configured,
        1 => configured.min(LogLevel::Debug),
        _ => LogLevel::Trace,
    }
}

/// Input problems exit with 2, encoder problems with 3, cancellation with 130.
fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::EmptySelection
        | ErrorKind::FormatResolutionFailed
        | ErrorKind::InvalidParameters
        | ErrorKind::FrameLimitExceeded => 2,
        ErrorKind::EncoderMissing
        | ErrorKind::LaunchFailed
        | ErrorKind::EncoderExitedNonZero
        | ErrorKind::OutputMissing => 3,
        ErrorKind::Cancelled => INTERRUPTED,
        _ => 1,
    }
}
