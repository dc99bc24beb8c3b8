//! Encoder argument builder.
//!
//! Produces the argument vector for an ffmpeg-compatible encoder:
//!
//! ```text
//! -y -framerate <fps> -i <pattern> -vf <scale/pad filter> -loop 0 <output>
//! ```
//!
//! The filter letterboxes every frame onto a transparent square canvas of
//! the target size: the longer axis is scaled to the target, the shorter
//! axis is padded and centred.

use std::path::{Path, PathBuf};

use crate::models::EncodeParameters;

/// Filter expression for a square canvas of `resolution` pixels.
pub fn scale_pad_filter(resolution: u32) -> String {
    let r = resolution;
    format!(
        "scale=w='if(gt(a,1),{r},-2)':h='if(gt(a,1),-2,{r})':force_original_aspect_ratio=decrease,\
         pad={r}:{r}:(ow-iw)/2:(oh-ih)/2:color=0x00000000"
    )
}

/// Builder for one encoder invocation.
#[derive(Debug, Clone)]
pub struct EncoderCommand {
    params: EncodeParameters,
    input_pattern: String,
    output_path: PathBuf,
}

impl EncoderCommand {
    /// Create a new command builder.
    pub fn new(
        params: EncodeParameters,
        input_pattern: impl Into<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            params,
            input_pattern: input_pattern.into(),
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Build the argument vector.
    pub fn build(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(11);

        // Always overwrite
        args.push("-y".to_string());

        args.push("-framerate".to_string());
        args.push(self.params.framerate().to_string());

        args.push("-i".to_string());
        args.push(self.input_pattern.clone());

        args.push("-vf".to_string());
        args.push(scale_pad_filter(self.params.resolution()));

        // Infinite loop
        args.push("-loop".to_string());
        args.push("0".to_string());

        args.push(self.output_path.to_string_lossy().to_string());

        args
    }
}

/// Render arguments for a log line, quoting those with spaces.
pub fn format_args_for_log(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.contains(char::is_whitespace) || arg.is_empty() {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}
