//! Pipeline runner that executes steps in sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{Context, JobState};

/// Pipeline that runs a sequence of steps.
///
/// The pipeline executes steps in order, running validation before
/// and after each step. The first failure short-circuits the rest.
pub struct Pipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn PipelineStep>>,
    /// Cancellation flag.
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Get a cancellation handle.
    ///
    /// Call `cancel()` on the returned handle to stop the pipeline
    /// at the next step boundary (or kill a running encoder).
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    /// Check if pipeline has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run the pipeline with the given context and state.
    ///
    /// Executes each step in order:
    /// 1. Check for cancellation
    /// 2. Run `validate_input`
    /// 3. Run `execute`
    /// 4. Run `validate_output`
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
        };

        for step in &self.steps {
            if self.is_cancelled() {
                ctx.logger
                    .warn(&format!("Pipeline cancelled before step '{}'", step.name()));
                return Err(PipelineError::cancelled(&ctx.job_id));
            }

            let step_name = step.name();
            ctx.logger.phase(step_name);
            ctx.logger.debug(step.description());

            ctx.logger
                .debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_id, step_name, e));
            }

            ctx.logger.debug(&format!("Executing '{}'", step_name));
            step.execute(ctx, state).map_err(|e| {
                ctx.logger.error(&format!("{} failed: {}", step_name, e));
                PipelineError::step_failed(&ctx.job_id, step_name, e)
            })?;

            ctx.logger
                .debug(&format!("Validating output for '{}'", step_name));
            if let Err(e) = step.validate_output(ctx, state) {
                ctx.logger.error(&format!("Output validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_id, step_name, e));
            }

            result.steps_completed.push(step_name.to_string());
        }

        Ok(result)
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for cancelling a running pipeline.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Steps that completed successfully, in order.
    pub steps_completed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::logging::{JobLogger, LogConfig};
    use crate::models::{ConversionError, ConversionRequest, ErrorKind};
    use crate::orchestrator::errors::{StepError, StepResult};
    use std::sync::atomic::AtomicUsize;

    struct CountingStep {
        name: &'static str,
        counter: Arc<AtomicUsize>,
        fail: bool,
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> StepResult<()> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StepError::from(ConversionError::EmptySelection));
            }
            Ok(())
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }
    }

    fn step(name: &'static str, counter: &Arc<AtomicUsize>, fail: bool) -> CountingStep {
        CountingStep {
            name,
            counter: Arc::clone(counter),
            fail,
        }
    }

    fn context(pipeline: &Pipeline) -> Context {
        let logger = Arc::new(JobLogger::detached("test", LogConfig::default(), None));
        let request = ConversionRequest::new(["/in/a.png"], "10", "100");
        Context::new(
            "test",
            &request,
            Settings::default(),
            logger,
            pipeline.cancel_handle(),
        )
    }

    #[test]
    fn runs_steps_in_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(step("One", &counter, false))
            .with_step(step("Two", &counter, false));
        let ctx = context(&pipeline);
        let mut state = JobState::new("test");

        let result = pipeline.run(&ctx, &mut state).unwrap();

        assert_eq!(result.steps_completed, vec!["One", "Two"]);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(pipeline.step_names(), vec!["One", "Two"]);
    }

    #[test]
    fn failure_short_circuits() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(step("Fails", &counter, true))
            .with_step(step("Never", &counter, false));
        let ctx = context(&pipeline);
        let mut state = JobState::new("test");

        let err = pipeline.run(&ctx, &mut state).unwrap_err();

        assert_eq!(err.step_name(), Some("Fails"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(err.into_conversion_error().kind(), ErrorKind::EmptySelection);
    }

    #[test]
    fn cancellation_stops_before_next_step() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new().with_step(step("One", &counter, false));
        let ctx = context(&pipeline);
        let mut state = JobState::new("test");

        pipeline.cancel_handle().cancel();
        assert!(pipeline.is_cancelled());

        let err = pipeline.run(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
