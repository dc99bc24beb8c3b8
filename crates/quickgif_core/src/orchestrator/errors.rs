//! Error types for the conversion pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Step → ConversionError
//!
//! At the coordinator boundary everything collapses back into the single
//! [`ConversionError`] taxonomy.

use thiserror::Error;

use crate::models::ConversionError;

/// Top-level pipeline error with job context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during validation or execution.
    #[error("Job '{job_id}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_id: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Pipeline was cancelled at a step boundary.
    #[error("Job '{job_id}' was cancelled")]
    Cancelled { job_id: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        job_id: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_id: job_id.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a cancelled error.
    pub fn cancelled(job_id: impl Into<String>) -> Self {
        Self::Cancelled {
            job_id: job_id.into(),
        }
    }

    /// Name of the failing step, if a step failed.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step_name, .. } => Some(step_name),
            Self::Cancelled { .. } => None,
        }
    }

    /// Unwrap into the conversion error taxonomy.
    pub fn into_conversion_error(self) -> ConversionError {
        match self {
            Self::StepFailed { source, .. } => source.into_conversion_error(),
            Self::Cancelled { .. } => ConversionError::Cancelled,
        }
    }
}

/// Error from a pipeline step.
#[derive(Error, Debug)]
pub enum StepError {
    /// An expected failure from the conversion taxonomy.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// An earlier step did not record the state this step needs.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),
}

impl StepError {
    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    /// Create an error for state missing from an earlier step.
    pub fn missing_state(what: &str) -> Self {
        Self::PreconditionFailed(format!("{} not available", what))
    }

    pub fn into_conversion_error(self) -> ConversionError {
        match self {
            Self::Conversion(e) => e,
            Self::PreconditionFailed(msg) => ConversionError::Internal(msg),
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
