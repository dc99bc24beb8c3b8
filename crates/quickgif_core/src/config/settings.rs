//! Settings struct with TOML-based sections.
//!
//! Each section maps to a TOML table and can be updated independently.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Name of the staging directory created under the temp root.
pub const STAGING_DIR_NAME: &str = "ffmpeg_input";

/// Image extensions accepted by default.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "tiff", "tif", "gif", "webp", "pbm", "pgm", "ppm", "tga", "sgi",
    "jp2", "j2k", "jpf", "jpx", "j2c", "icns", "heic", "heif",
];

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Working, output and log directories.
    #[serde(default)]
    pub paths: PathSettings,

    /// Encoder executable and default parameters.
    #[serde(default)]
    pub encoder: EncoderSettings,

    /// Selection filtering.
    #[serde(default)]
    pub input: InputSettings,

    /// Estimated progress pacing.
    #[serde(default)]
    pub progress: ProgressSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Teardown behaviour.
    #[serde(default)]
    pub cleanup: CleanupSettings,
}

impl Settings {
    /// Root under which the staging directory lives.
    pub fn temp_root(&self) -> PathBuf {
        if self.paths.temp_root.is_empty() {
            std::env::temp_dir().join("quickgif")
        } else {
            PathBuf::from(&self.paths.temp_root)
        }
    }

    /// The single, process-wide staging directory.
    pub fn staging_dir(&self) -> PathBuf {
        self.temp_root().join(STAGING_DIR_NAME)
    }

    /// Folder receiving freshly encoded outputs.
    pub fn output_dir(&self) -> PathBuf {
        if self.paths.output_folder.is_empty() {
            self.temp_root().join("output")
        } else {
            PathBuf::from(&self.paths.output_folder)
        }
    }

    /// Folder for per-job log files.
    pub fn logs_dir(&self) -> PathBuf {
        if self.paths.logs_folder.is_empty() {
            self.temp_root().join("logs")
        } else {
            PathBuf::from(&self.paths.logs_folder)
        }
    }

    /// Configured encoder executable, if any.
    pub fn encoder_path(&self) -> Option<PathBuf> {
        let path = self.encoder.path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }
}

/// Path configuration. Empty strings fall back to the system temp dir.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root folder for the staging directory.
    #[serde(default)]
    pub temp_root: String,

    /// Folder for generated GIFs.
    #[serde(default)]
    pub output_folder: String,

    /// Folder for log files.
    #[serde(default)]
    pub logs_folder: String,
}

/// Encoder executable and the defaults offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Path to an ffmpeg-compatible executable.
    #[serde(default)]
    pub path: String,

    #[serde(default = "default_framerate")]
    pub default_framerate: u32,

    #[serde(default = "default_resolution")]
    pub default_resolution: u32,
}

fn default_framerate() -> u32 {
    15
}

fn default_resolution() -> u32 {
    640
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            path: String::new(),
            default_framerate: default_framerate(),
            default_resolution: default_resolution(),
        }
    }
}

/// Selection filtering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSettings {
    /// Extensions (case-insensitive, no dot) eligible for staging.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Sort folder children by file name instead of enumeration order.
    #[serde(default)]
    pub sort_directory_entries: bool,
}

fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            sort_directory_entries: false,
        }
    }
}

/// Pacing of the time-based progress estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSettings {
    /// Lower bound on the number of ticks.
    #[serde(default = "default_min_steps")]
    pub min_steps: u32,

    /// Upper bound on the delay between ticks.
    #[serde(default = "default_step_cap_ms")]
    pub step_cap_ms: u64,

    /// Total duration the estimate is spread over.
    #[serde(default = "default_target_duration_ms")]
    pub target_duration_ms: u64,
}

fn default_min_steps() -> u32 {
    10
}

fn default_step_cap_ms() -> u64 {
    100
}

fn default_target_duration_ms() -> u64 {
    3000
}

impl ProgressSettings {
    pub fn step_cap(&self) -> Duration {
        Duration::from_millis(self.step_cap_ms)
    }

    pub fn target_duration(&self) -> Duration {
        Duration::from_millis(self.target_duration_ms)
    }
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            min_steps: default_min_steps(),
            step_cap_ms: default_step_cap_ms(),
            target_duration_ms: default_target_duration_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for the application log.
    #[serde(default)]
    pub level: LogLevel,

    /// Keep encoder output in the tail buffer only.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of encoder output lines kept for error reports.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress logging step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Log encoder arguments one per line.
    #[serde(default)]
    pub show_encoder_args_pretty: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_encoder_args_pretty: false,
        }
    }
}

/// What to remove when the coordinator shuts down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupSettings {
    /// Remove the staging directory.
    #[serde(default = "default_true")]
    pub sweep_on_shutdown: bool,

    /// Also remove GIFs produced during this session.
    #[serde(default)]
    pub remove_outputs_on_shutdown: bool,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            sweep_on_shutdown: true,
            remove_outputs_on_shutdown: false,
        }
    }
}

/// Identifies a section for section-level updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Encoder,
    Input,
    Progress,
    Logging,
    Cleanup,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Paths,
        ConfigSection::Encoder,
        ConfigSection::Input,
        ConfigSection::Progress,
        ConfigSection::Logging,
        ConfigSection::Cleanup,
    ];

    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Encoder => "encoder",
            ConfigSection::Input => "input",
            ConfigSection::Progress => "progress",
            ConfigSection::Logging => "logging",
            ConfigSection::Cleanup => "cleanup",
        }
    }

    /// Comment written above the table.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Working, output and log directories (empty = system temp)",
            ConfigSection::Encoder => "ffmpeg-compatible encoder and default parameters",
            ConfigSection::Input => "Which files in a selection are treated as images",
            ConfigSection::Progress => "Pacing of the estimated progress bar",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Cleanup => "Teardown behaviour",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_app() {
        let settings = Settings::default();
        assert_eq!(settings.encoder.default_framerate, 15);
        assert_eq!(settings.encoder.default_resolution, 640);
        assert_eq!(settings.input.allowed_extensions.len(), 21);
        assert_eq!(settings.progress.min_steps, 10);
        assert!(settings.encoder_path().is_none());
    }

    #[test]
    fn empty_paths_fall_back_to_temp() {
        let settings = Settings::default();
        assert!(settings.staging_dir().ends_with("quickgif/ffmpeg_input"));
        assert!(settings.output_dir().starts_with(settings.temp_root()));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str("[encoder]\npath = \"/opt/ffmpeg\"\n").unwrap();
        assert_eq!(settings.encoder_path(), Some(PathBuf::from("/opt/ffmpeg")));
        assert_eq!(settings.encoder.default_framerate, 15);
        assert!(settings.cleanup.sweep_on_shutdown);
    }
}
