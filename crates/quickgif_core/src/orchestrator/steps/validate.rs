//! Validate step - checks the request before anything touches the disk.
//!
//! Rejects an empty selection, parses frame rate and resolution, and
//! verifies the configured encoder is an executable file. A failure here
//! leaves the previous job's staging directory untouched.

use crate::encoder::check_encoder;
use crate::models::{ConversionError, EncodeParameters};
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState};

/// Validate step for request parameters and encoder configuration.
pub struct ValidateStep;

impl ValidateStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ValidateStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ValidateStep {
    fn name(&self) -> &str {
        "Validate"
    }

    fn description(&self) -> &str {
        "Validate selection, parameters and encoder"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.selection.is_empty() {
            return Err(ConversionError::EmptySelection.into());
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let params = EncodeParameters::parse(&ctx.framerate_text, &ctx.resolution_text)?;
        ctx.logger.info(&format!(
            "Frame rate {} fps, canvas {}x{}",
            params.framerate(),
            params.resolution(),
            params.resolution()
        ));

        let encoder = check_encoder(ctx.settings.encoder_path().as_deref())?;
        ctx.logger.info(&format!("Encoder: {}", encoder.display()));

        state.params = Some(params);
        state.encoder = Some(encoder);
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
        Ok(())
    }
}
