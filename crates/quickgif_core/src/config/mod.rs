//! Configuration management for Quick GIF.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only the changed section is rewritten)
//! - Defaults for every missing key
//!
//! # Example
//!
//! ```no_run
//! use quickgif_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/quickgif.toml");
//! config.load_or_create().unwrap();
//!
//! config.settings_mut().encoder.path = "/usr/local/bin/ffmpeg".to_string();
//! config.update_section(ConfigSection::Encoder).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    CleanupSettings, ConfigSection, EncoderSettings, InputSettings, LoggingSettings,
    PathSettings, ProgressSettings, Settings, DEFAULT_ALLOWED_EXTENSIONS, STAGING_DIR_NAME,
};
