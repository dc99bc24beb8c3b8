//! Core types for the conversion pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use super::pipeline::CancelHandle;
use crate::config::Settings;
use crate::format::FormatResolution;
use crate::logging::JobLogger;
use crate::models::{
    CandidateSet, ConversionRequest, ConversionResult, EncodeParameters, SourceSelection,
};
use crate::progress::ProgressTracker;
use crate::staging::{StagedSequence, StagingArea};

/// Status callback type for user-facing status lines.
pub type StatusCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Contains the request and shared resources that steps can read but not
/// modify. Mutable state goes in `JobState`.
pub struct Context {
    /// Job identifier, also used for the output and log file names.
    pub job_id: String,
    /// Paths as selected by the user.
    pub selection: SourceSelection,
    /// Frame rate as typed by the user.
    pub framerate_text: String,
    /// Resolution as typed by the user.
    pub resolution_text: String,
    /// Application settings.
    pub settings: Settings,
    /// Staging directory owner.
    pub staging: StagingArea,
    /// Unique output file for this job.
    pub output_path: PathBuf,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Progress shared with the estimator.
    pub progress: Arc<ProgressTracker>,
    /// Cancellation flag for this job.
    pub cancel: CancelHandle,
    status_callback: Option<StatusCallback>,
}

impl Context {
    /// Create a new context for a job.
    pub fn new(
        job_id: impl Into<String>,
        request: &ConversionRequest,
        settings: Settings,
        logger: Arc<JobLogger>,
        cancel: CancelHandle,
    ) -> Self {
        let job_id = job_id.into();
        let output_path = settings.output_dir().join(format!("quickgif_{}.gif", job_id));

        Self {
            selection: request.selection(),
            framerate_text: request.framerate.clone(),
            resolution_text: request.resolution.clone(),
            staging: StagingArea::new(settings.staging_dir()),
            output_path,
            settings,
            job_id,
            logger,
            progress: Arc::new(ProgressTracker::default()),
            cancel,
            status_callback: None,
        }
    }

    /// Set the progress tracker.
    pub fn with_progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    /// Set the status callback.
    pub fn with_status_callback(mut self, callback: StatusCallback) -> Self {
        self.status_callback = Some(callback);
        self
    }

    /// Report a status line to the callback (if set).
    pub fn report_status(&self, message: &str) {
        if let Some(ref callback) = self.status_callback {
            callback(message);
        }
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Each step fills in its own section and reads those of earlier steps.
#[derive(Debug, Clone, Default)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started.
    pub started_at: Option<String>,
    /// Validated parameters (from Validate step).
    pub params: Option<EncodeParameters>,
    /// Checked encoder executable (from Validate step).
    pub encoder: Option<PathBuf>,
    /// Filtered candidates (from Collect step).
    pub candidates: Option<CandidateSet>,
    /// Majority family (from Resolve step).
    pub resolution: Option<FormatResolution>,
    /// Staged frames (from Stage step).
    pub staged: Option<StagedSequence>,
    /// Encoder run (from Encode step).
    pub encode: Option<EncodeOutput>,
}

impl JobState {
    /// Create a new job state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Whether the selection spanned more than one format family.
    pub fn mixed_formats(&self) -> bool {
        self.resolution.as_ref().is_some_and(|r| r.is_mixed())
    }

    /// Build the success result, if every step has recorded its output.
    pub fn success_result(&self) -> Option<ConversionResult> {
        let encode = self.encode.as_ref()?;
        let staged = self.staged.as_ref()?;
        let resolution = self.resolution.as_ref()?;

        Some(ConversionResult::Success {
            job_id: self.job_id.clone(),
            output_path: encode.output_path.clone(),
            frame_count: staged.frame_count(),
            family: resolution.family.key().to_string(),
            mixed_formats: resolution.is_mixed(),
        })
    }
}

/// Output from the Encode step.
#[derive(Debug, Clone)]
pub struct EncodeOutput {
    /// Produced artifact.
    pub output_path: PathBuf,
    /// Arguments passed to the encoder.
    pub args: Vec<String>,
    /// Wall-clock encoder run time.
    pub elapsed_ms: u64,
}
