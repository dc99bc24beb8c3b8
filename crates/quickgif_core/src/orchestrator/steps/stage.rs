//! Stage step - copies the resolved candidates into the staging directory.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};

/// Stage step producing the contiguous frame sequence.
pub struct StageStep;

impl StageStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StageStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for StageStep {
    fn name(&self) -> &str {
        "Stage"
    }

    fn description(&self) -> &str {
        "Copy frames into the staging directory"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let resolution = state
            .resolution
            .as_ref()
            .ok_or_else(|| StepError::missing_state("format resolution"))?;

        ctx.logger
            .info(&format!("Staging into {}", ctx.staging.dir().display()));
        let staged = ctx.staging.stage(&resolution.candidates, &resolution.family)?;

        for skipped in staged.skipped() {
            ctx.logger.warn(&format!(
                "Skipped {}: {}",
                skipped.source.display(),
                skipped.reason
            ));
        }
        ctx.logger.info(&format!(
            "{} frame(s) staged as {}",
            staged.frame_count(),
            staged.input_pattern()
        ));

        state.staged = Some(staged);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match state.staged {
            Some(ref staged) if staged.frame_count() > 0 => Ok(()),
            _ => Err(StepError::missing_state("staged sequence")),
        }
    }
}
