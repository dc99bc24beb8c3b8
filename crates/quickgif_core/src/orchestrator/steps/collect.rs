//! Collect step - flattens the selection into candidates.

use crate::input::InputNormalizer;
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};

/// Collect step applying the extension allow-list.
pub struct CollectStep;

impl CollectStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CollectStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for CollectStep {
    fn name(&self) -> &str {
        "Collect"
    }

    fn description(&self) -> &str {
        "Collect image files from the selection"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let normalizer = InputNormalizer::from_settings(&ctx.settings.input);
        let candidates = normalizer.normalize(&ctx.selection);

        match ctx.selection.single_directory() {
            Some(dir) => ctx.logger.info(&format!(
                "{} file(s) imported from {}",
                candidates.len(),
                dir.display()
            )),
            None => ctx.logger.info(&format!(
                "{} file(s) imported ({} selected)",
                candidates.len(),
                ctx.selection.len()
            )),
        }

        // An empty set is reported by the Resolve step.
        state.candidates = Some(candidates);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
        Ok(())
    }
}
