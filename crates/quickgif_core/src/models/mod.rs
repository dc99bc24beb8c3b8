//! Data models for Quick GIF.
//!
//! This module contains the core data structures shared by every stage:
//! - Selections and the candidate sets derived from them
//! - Format families (extension synonym groups)
//! - Validated encode parameters
//! - Requests, terminal results, and the error taxonomy

mod errors;
mod format;
mod jobs;
mod params;
mod selection;

// Re-export all public types
pub use errors::{ConversionError, ErrorKind};
pub use format::{FormatFamily, SYNONYM_GROUPS};
pub use jobs::{ConversionRequest, ConversionResult, SelectionSummary};
pub use params::EncodeParameters;
pub use selection::{lowercase_extension, Candidate, CandidateSet, SourceSelection};
