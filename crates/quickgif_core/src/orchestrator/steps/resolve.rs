//! Resolve step - picks the majority format family.
//!
//! Also enforces the frame limit, so an oversized selection is rejected
//! before the staging directory is recreated.

use crate::format;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};
use crate::staging::check_frame_limit;

/// Resolve step for majority format selection.
pub struct ResolveStep;

impl ResolveStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResolveStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ResolveStep {
    fn name(&self) -> &str {
        "Resolve"
    }

    fn description(&self) -> &str {
        "Resolve the majority image format"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let candidates = state
            .candidates
            .as_ref()
            .ok_or_else(|| StepError::missing_state("candidates"))?;

        let resolution = format::resolve(candidates)?;

        for entry in &resolution.counts {
            ctx.logger
                .debug(&format!("  {}: {} file(s)", entry.family, entry.count));
        }
        ctx.logger.info(&format!(
            "Using {} ({} of {} files)",
            resolution.family,
            resolution.candidates.len(),
            candidates.len()
        ));

        if resolution.is_mixed() {
            let message = format!(
                "Mixed image formats detected; using {} and skipping {} file(s)",
                resolution.family.key(),
                resolution.excluded_count()
            );
            ctx.logger.warn(&message);
            ctx.report_status(&message);
        }

        check_frame_limit(resolution.candidates.len())?;

        state.resolution = Some(resolution);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match state.resolution {
            Some(ref r) if !r.candidates.is_empty() => Ok(()),
            _ => Err(StepError::missing_state("format resolution")),
        }
    }
}
