//! Background ticker that advances a [`ProgressTracker`].

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::tracker::ProgressTracker;
use crate::config::ProgressSettings;

/// Number of ticks and the delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatePlan {
    pub steps: u32,
    pub delay: Duration,
}

impl EstimatePlan {
    /// Plan for a job with `candidate_count` frames.
    pub fn new(candidate_count: usize, settings: &ProgressSettings) -> Self {
        let count = u32::try_from(candidate_count).unwrap_or(u32::MAX);
        let steps = count.max(settings.min_steps).max(1);
        let delay = settings.step_cap().min(settings.target_duration() / steps);
        Self { steps, delay }
    }

    /// Value reported after tick `i` (1-based). Always below 1.0.
    pub fn value_at(&self, i: u32) -> f64 {
        f64::from(i.min(self.steps - 1)) / f64::from(self.steps)
    }

    /// Upper bound on how long the estimate takes to run out.
    pub fn total(&self) -> Duration {
        self.delay * self.steps.saturating_sub(1)
    }
}

/// Handle to a running estimator thread.
///
/// The thread stops on its own after its last tick, or as soon as
/// [`stop`](Self::stop) is called or the handle is dropped.
pub struct ProgressEstimator {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressEstimator {
    /// Start ticking on a background thread.
    pub fn start(plan: EstimatePlan, tracker: Arc<ProgressTracker>) -> io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("progress-estimator".to_string())
            .spawn(move || {
                for i in 1..plan.steps {
                    match stop_rx.recv_timeout(plan.delay) {
                        Err(RecvTimeoutError::Timeout) => {
                            tracker.advance(plan.value_at(i));
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop ticking and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressEstimator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
