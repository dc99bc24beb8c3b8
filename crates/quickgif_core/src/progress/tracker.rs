//! Monotonic progress value shared by the estimator and the coordinator.

use parking_lot::Mutex;

/// Receiver for progress updates in `[0, 1]`.
pub type ProgressCallback = Box<dyn Fn(f64) + Send + Sync>;

#[derive(Debug, Default)]
struct TrackerState {
    value: f64,
    finished: bool,
}

/// Progress value that only moves forward.
///
/// Values below 1.0 come from [`advance`](Self::advance); 1.0 is reached
/// only through [`finish`](Self::finish), exactly once. Updates are
/// delivered to the callback in order, under the tracker's lock, so the
/// callback must not call back into the tracker.
pub struct ProgressTracker {
    state: Mutex<TrackerState>,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            callback,
        }
    }

    /// Move the estimate forward. Returns true if the value changed.
    ///
    /// Ignored if the value is not greater than the current one, is 1.0 or
    /// more, or the tracker is already finished.
    pub fn advance(&self, value: f64) -> bool {
        let mut state = self.state.lock();
        if state.finished || !(value > state.value && value < 1.0) {
            return false;
        }
        state.value = value;
        self.notify(value);
        true
    }

    /// Force completion. Returns true the first time only.
    pub fn finish(&self) -> bool {
        let mut state = self.state.lock();
        if state.finished {
            return false;
        }
        state.finished = true;
        state.value = 1.0;
        self.notify(1.0);
        true
    }

    pub fn value(&self) -> f64 {
        self.state.lock().value
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    fn notify(&self, value: f64) {
        if let Some(ref callback) = self.callback {
            callback(value);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(None)
    }
}
