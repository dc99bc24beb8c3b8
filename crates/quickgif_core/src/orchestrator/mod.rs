//! Conversion pipeline and coordinator.
//!
//! A conversion is a fixed sequence of steps over a read-only [`Context`]
//! and a mutable [`JobState`]:
//!
//! ```text
//! Coordinator (single-flight)
//!     └── Pipeline
//!         ├── Step: Validate  (selection, parameters, encoder)
//!         ├── Step: Collect   (allow-list, dedupe)
//!         ├── Step: Resolve   (majority family, frame limit)
//!         ├── Step: Stage     (contiguous img%03d sequence)
//!         └── Step: Encode    (supervised encoder + progress estimate)
//! ```
//!
//! The first failing step short-circuits the rest; the coordinator turns
//! the failure into a single `ConversionResult::Failure`.

mod coordinator;
mod errors;
mod pipeline;
mod step;
pub mod steps;
mod types;

pub use coordinator::{Coordinator, JobHandle, JobObserver, SilentObserver};
pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{CollectStep, EncodeStep, ResolveStep, StageStep, ValidateStep};
pub use types::{Context, EncodeOutput, JobState, StatusCallback};

/// Create the standard conversion pipeline.
///
/// 1. Validate - selection non-empty, parameters parse, encoder exists
/// 2. Collect - flatten the selection and apply the allow-list
/// 3. Resolve - pick the majority format family, enforce the frame limit
/// 4. Stage - copy frames into the staging directory
/// 5. Encode - run the encoder and wait for its exit status
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(ValidateStep::new())
        .with_step(CollectStep::new())
        .with_step(ResolveStep::new())
        .with_step(StageStep::new())
        .with_step(EncodeStep::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_pipeline_order() {
        let pipeline = create_standard_pipeline();
        assert_eq!(
            pipeline.step_names(),
            vec!["Validate", "Collect", "Resolve", "Stage", "Encode"]
        );
        assert_eq!(pipeline.step_count(), 5);
    }
}
