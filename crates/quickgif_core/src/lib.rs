//! Quick GIF Core - backend logic for turning a batch of still images into
//! an animated GIF.
//!
//! The crate stages the chosen images as a contiguous, zero-padded sequence
//! in a private temp directory and drives an external ffmpeg-compatible
//! encoder against it. It has zero UI dependencies; the CLI (or any other
//! front end) talks to it through [`orchestrator::Coordinator`].

pub mod config;
pub mod encoder;
pub mod format;
pub mod input;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod staging;

pub use models::{ConversionError, ConversionRequest, ConversionResult, ErrorKind};
pub use orchestrator::{Coordinator, JobHandle, JobObserver, SilentObserver};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
