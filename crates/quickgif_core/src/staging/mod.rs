//! Staging area for the encoder's input sequence.
//!
//! The staging directory is process-wide and single-purpose: it is wiped
//! and recreated at the start of every job, filled with contiguous
//! zero-padded copies of the candidates, and swept at shutdown.
//!
//! # Naming
//!
//! Frames are named `img000.<ext>` .. `img999.<ext>`. The index width is
//! fixed at [`INDEX_WIDTH`] digits, so a job may stage at most
//! [`MAX_FRAMES`] files; larger selections are rejected up front.

mod area;

pub use area::{check_frame_limit, frame_name, SkippedFile, StagedSequence, StagingArea};

/// Digits in a staged frame index.
pub const INDEX_WIDTH: usize = 3;

/// Largest number of frames the index width can address.
pub const MAX_FRAMES: usize = 1000;

/// File name prefix of every staged frame.
pub const FRAME_PREFIX: &str = "img";
