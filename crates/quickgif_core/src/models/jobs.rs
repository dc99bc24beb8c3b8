//! Job-level data structures (requests, terminal results, summaries).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{ConversionError, ErrorKind};
use super::selection::SourceSelection;

/// Everything the interface layer hands over to start one conversion.
///
/// Parameters stay as text here; they are validated by the pipeline before
/// anything touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Selected files, or a single folder.
    pub paths: Vec<PathBuf>,
    /// Frame rate as typed by the user.
    pub framerate: String,
    /// Target square dimension as typed by the user.
    pub resolution: String,
}

impl ConversionRequest {
    /// Create a new request.
    pub fn new<I, P>(paths: I, framerate: impl Into<String>, resolution: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            framerate: framerate.into(),
            resolution: resolution.into(),
        }
    }

    /// Capture the selection for this job.
    pub fn selection(&self) -> SourceSelection {
        SourceSelection::new(self.paths.iter().cloned())
    }
}

/// Terminal outcome of a conversion job. Exactly one per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionResult {
    /// The encoder exited with status zero and produced an artifact.
    Success {
        job_id: String,
        output_path: PathBuf,
        /// Number of frames staged for the encoder.
        frame_count: usize,
        /// Canonical key of the resolved format family.
        family: String,
        /// Whether the selection spanned more than one format family.
        mixed_formats: bool,
    },
    /// Some stage failed; carries the taxonomy kind and a readable reason.
    Failure {
        job_id: String,
        kind: ErrorKind,
        message: String,
    },
}

impl ConversionResult {
    /// Create a failed result from a stage error.
    pub fn failure(job_id: impl Into<String>, error: &ConversionError) -> Self {
        Self::Failure {
            job_id: job_id.into(),
            kind: error.kind(),
            message: error.detail(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn job_id(&self) -> &str {
        match self {
            Self::Success { job_id, .. } | Self::Failure { job_id, .. } => job_id,
        }
    }

    /// Produced artifact, if the job succeeded.
    pub fn output_path(&self) -> Option<&Path> {
        match self {
            Self::Success { output_path, .. } => Some(output_path),
            Self::Failure { .. } => None,
        }
    }

    /// Failure kind, if the job failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// One-line status message for display.
    pub fn status_message(&self) -> String {
        match self {
            Self::Success { output_path, .. } => {
                format!("GIF created at {}", output_path.display())
            }
            Self::Failure { message, .. } => {
                message.lines().next().unwrap_or_default().to_string()
            }
        }
    }
}

/// Side-effect free preview of what a selection would stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSummary {
    /// Candidates that passed the extension allow-list.
    pub candidate_count: usize,
    /// Resolved family key, if any.
    pub family: Option<String>,
    /// Candidates that would be staged after family filtering.
    pub staged_count: usize,
    /// Whether more than one family is present.
    pub mixed_formats: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_never_has_output() {
        let result = ConversionResult::failure("job-1", &ConversionError::EmptySelection);
        assert!(!result.is_success());
        assert!(result.output_path().is_none());
        assert_eq!(result.error_kind(), Some(ErrorKind::EmptySelection));
        assert_eq!(result.status_message(), "No files selected");
    }

    #[test]
    fn success_reports_path() {
        let result = ConversionResult::Success {
            job_id: "job-2".to_string(),
            output_path: PathBuf::from("/tmp/out.gif"),
            frame_count: 3,
            family: "png".to_string(),
            mixed_formats: false,
        };
        assert_eq!(result.output_path(), Some(Path::new("/tmp/out.gif")));
        assert!(result.error_kind().is_none());
        assert_eq!(result.job_id(), "job-2");
        assert!(result.status_message().starts_with("GIF created at"));
    }

    #[test]
    fn failure_status_is_first_line_only() {
        let err = ConversionError::EncoderExitedNonZero {
            code: 1,
            tail: vec!["line a".to_string(), "line b".to_string()],
        };
        let result = ConversionResult::failure("job-3", &err);
        assert_eq!(result.status_message(), "Encoder failed with code 1");
    }

    #[test]
    fn result_serializes() {
        let result = ConversionResult::failure("job-4", &ConversionError::JobAlreadyActive);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"JobAlreadyActive\""));
    }
}
