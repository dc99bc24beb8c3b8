//! Encode step - runs the external encoder over the staged sequence.
//!
//! The progress estimator ticks on its own thread for the duration of the
//! encoder run. It is stopped as soon as the encoder exits; the
//! coordinator then forces progress to completion.

use std::sync::Arc;

use crate::encoder::{DiagnosticSink, EncoderCommand, EncoderSupervisor};
use crate::models::ConversionError;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, EncodeOutput, JobState};
use crate::progress::{EstimatePlan, ProgressEstimator};

/// Encode step driving the encoder process.
pub struct EncodeStep;

impl EncodeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EncodeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for EncodeStep {
    fn name(&self) -> &str {
        "Encode"
    }

    fn description(&self) -> &str {
        "Encode the staged frames into a GIF"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()> {
        let params = state
            .params
            .ok_or_else(|| StepError::missing_state("encode parameters"))?;
        let encoder = state
            .encoder
            .clone()
            .ok_or_else(|| StepError::missing_state("encoder path"))?;
        let staged = state
            .staged
            .as_ref()
            .ok_or_else(|| StepError::missing_state("staged sequence"))?;

        let command = EncoderCommand::new(params, staged.input_pattern(), &ctx.output_path);
        let supervisor = EncoderSupervisor::new(encoder);
        let args = command.build();

        ctx.logger.command(&supervisor.describe(&command));
        if ctx.settings.logging.show_encoder_args_pretty {
            ctx.logger
                .log_encoder_args_pretty(&supervisor.program().to_string_lossy(), &args);
        }

        let plan = EstimatePlan::new(staged.frame_count(), &ctx.settings.progress);
        let estimator = match ProgressEstimator::start(plan, Arc::clone(&ctx.progress)) {
            Ok(estimator) => Some(estimator),
            Err(e) => {
                ctx.logger
                    .warn(&format!("Progress estimate unavailable: {}", e));
                None
            }
        };

        let sink: Arc<dyn DiagnosticSink> = ctx.logger.clone();
        let outcome = supervisor.run(&command, sink, &ctx.cancel);

        if let Some(estimator) = estimator {
            estimator.stop();
        }

        let outcome = outcome.inspect_err(|e| {
            if matches!(e, ConversionError::EncoderExitedNonZero { .. }) {
                ctx.logger.show_tail("encoder output");
            }
        })?;

        ctx.logger.info(&format!(
            "Encoder finished in {:.1}s",
            outcome.elapsed.as_secs_f64()
        ));

        state.encode = Some(EncodeOutput {
            output_path: outcome.output_path,
            args,
            elapsed_ms: outcome.elapsed.as_millis() as u64,
        });
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let encode = state
            .encode
            .as_ref()
            .ok_or_else(|| StepError::missing_state("encoder output"))?;

        if !encode.output_path.is_file() {
            return Err(ConversionError::OutputMissing(encode.output_path.clone()).into());
        }
        Ok(())
    }
}
