//! Error taxonomy for a conversion job.
//!
//! Every stage reports failures as a [`ConversionError`]. The coordinator
//! collapses them into a single `ConversionResult::Failure` carrying the
//! stable [`ErrorKind`] and the rendered message.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, data-free classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    EmptySelection,
    FormatResolutionFailed,
    InvalidParameters,
    JobAlreadyActive,
    FrameLimitExceeded,
    StagingFailed,
    EncoderMissing,
    LaunchFailed,
    EncoderExitedNonZero,
    ExportFailed,
    OutputMissing,
    Cancelled,
    Internal,
}

/// Failure of any stage of a conversion.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The caller supplied no paths.
    #[error("No files selected")]
    EmptySelection,

    /// No candidates survived filtering, or no family could be determined.
    #[error("Could not determine file format: {0}")]
    FormatResolutionFailed(String),

    /// Frame rate or resolution is non-numeric or zero.
    #[error("Invalid {field}: {message}")]
    InvalidParameters { field: String, message: String },

    /// A job is already in flight.
    #[error("Already generating, please wait...")]
    JobAlreadyActive,

    /// More candidates than the staged index width can address.
    #[error("Too many images: {count} selected, at most {max} frames are supported")]
    FrameLimitExceeded { count: usize, max: usize },

    /// Staging directory could not be prepared or no file could be copied.
    #[error("Failed to prepare staged files: {message}")]
    StagingFailed {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// The configured encoder executable is absent or not executable.
    #[error("Encoder binary not found: {0}")]
    EncoderMissing(String),

    /// The OS refused to spawn the encoder.
    #[error("Error running encoder: {0}")]
    LaunchFailed(#[source] io::Error),

    /// The encoder ran and reported failure.
    #[error("Encoder failed with code {code}")]
    EncoderExitedNonZero {
        code: i32,
        /// Last lines of encoder output, for diagnostics.
        tail: Vec<String>,
    },

    /// Copying a finished artifact to its destination failed.
    #[error("Failed to export GIF to {}: {source}", path.display())]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The encoder exited with status zero but left no file behind.
    #[error("Encoder produced no output at {}", .0.display())]
    OutputMissing(PathBuf),

    /// The job was cancelled before it reached a result.
    #[error("Conversion cancelled")]
    Cancelled,

    /// A job could not be run for reasons unrelated to its input.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConversionError {
    /// Create an invalid parameters error.
    pub fn invalid_parameters(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a staging failure with no underlying I/O error.
    pub fn staging_failed(message: impl Into<String>) -> Self {
        Self::StagingFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a staging failure caused by an I/O error.
    pub fn staging_io(message: impl Into<String>, source: io::Error) -> Self {
        Self::StagingFailed {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a format resolution error.
    pub fn format_resolution(message: impl Into<String>) -> Self {
        Self::FormatResolutionFailed(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySelection => ErrorKind::EmptySelection,
            Self::FormatResolutionFailed(_) => ErrorKind::FormatResolutionFailed,
            Self::InvalidParameters { .. } => ErrorKind::InvalidParameters,
            Self::JobAlreadyActive => ErrorKind::JobAlreadyActive,
            Self::FrameLimitExceeded { .. } => ErrorKind::FrameLimitExceeded,
            Self::StagingFailed { .. } => ErrorKind::StagingFailed,
            Self::EncoderMissing(_) => ErrorKind::EncoderMissing,
            Self::LaunchFailed(_) => ErrorKind::LaunchFailed,
            Self::EncoderExitedNonZero { .. } => ErrorKind::EncoderExitedNonZero,
            Self::ExportFailed { .. } => ErrorKind::ExportFailed,
            Self::OutputMissing(_) => ErrorKind::OutputMissing,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message plus any attached diagnostics (encoder output tail).
    pub fn detail(&self) -> String {
        match self {
            Self::EncoderExitedNonZero { tail, .. } if !tail.is_empty() => {
                format!("{}\n{}", self, tail.join("\n"))
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_is_surfaced_verbatim() {
        let err = ConversionError::EncoderExitedNonZero {
            code: 187,
            tail: vec!["Invalid argument".to_string()],
        };
        assert_eq!(err.kind(), ErrorKind::EncoderExitedNonZero);
        assert!(err.to_string().contains("187"));
        assert!(err.detail().ends_with("Invalid argument"));
    }

    #[test]
    fn staging_error_keeps_source() {
        let err = ConversionError::staging_io(
            "creating staging directory",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::StagingFailed);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_parameters_names_field() {
        let err = ConversionError::invalid_parameters("frame rate", "must not be zero");
        assert_eq!(err.to_string(), "Invalid frame rate: must not be zero");
    }
}
