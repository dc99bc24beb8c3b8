//! Validated numeric encode parameters.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::errors::ConversionError;

/// Frame rate and square target dimension for one encode.
///
/// Both values are positive, non-zero integers parsed from user text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeParameters {
    framerate: NonZeroU32,
    resolution: NonZeroU32,
}

impl EncodeParameters {
    /// Build from already-numeric values; zero is rejected.
    pub fn new(framerate: u32, resolution: u32) -> Result<Self, ConversionError> {
        Ok(Self {
            framerate: non_zero("frame rate", framerate)?,
            resolution: non_zero("resolution", resolution)?,
        })
    }

    /// Parse both fields from the text the user typed.
    pub fn parse(framerate: &str, resolution: &str) -> Result<Self, ConversionError> {
        Ok(Self {
            framerate: parse_field("frame rate", framerate)?,
            resolution: parse_field("resolution", resolution)?,
        })
    }

    /// Frames per second.
    pub fn framerate(&self) -> u32 {
        self.framerate.get()
    }

    /// Edge length of the square output canvas in pixels.
    pub fn resolution(&self) -> u32 {
        self.resolution.get()
    }
}

fn parse_field(field: &str, text: &str) -> Result<NonZeroU32, ConversionError> {
    let trimmed = text.trim();
    let value: u32 = trimmed.parse().map_err(|_| {
        ConversionError::invalid_parameters(field, format!("'{}' is not a whole number", trimmed))
    })?;
    non_zero(field, value)
}

fn non_zero(field: &str, value: u32) -> Result<NonZeroU32, ConversionError> {
    NonZeroU32::new(value)
        .ok_or_else(|| ConversionError::invalid_parameters(field, "cannot be zero"))
}
