//! Time-based progress estimation.
//!
//! The encoder reports no usable progress, so the estimate is driven by a
//! timer: `max(candidates, min_steps)` ticks spaced
//! `min(step_cap, target_duration / steps)` apart. The estimate never
//! reaches 1.0 on its own; only job completion does.

mod estimator;
mod tracker;

pub use estimator::{EstimatePlan, ProgressEstimator};
pub use tracker::{ProgressCallback, ProgressTracker};
