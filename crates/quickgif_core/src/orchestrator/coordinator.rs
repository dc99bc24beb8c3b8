//! Conversion coordinator: the caller-facing entry point.
//!
//! The `Coordinator` owns the single-flight flag and the staging directory.
//! Each accepted request runs the standard pipeline on its own thread and
//! reports exactly one [`ConversionResult`] through its [`JobHandle`].
//!
//! Per job, in order:
//! 1. Claim the single-flight flag (or fail with `JobAlreadyActive`)
//! 2. Run Validate → Collect → Resolve → Stage → Encode
//! 3. Force progress to 1.0
//! 4. Report the final status and release the flag
//! 5. Deliver the result to the handle
//!
//! # Example
//!
//! ```ignore
//! let coordinator = Coordinator::new(settings);
//! let request = ConversionRequest::new(paths, "15", "640");
//! let handle = coordinator.start(request, Arc::new(SilentObserver))?;
//! match handle.wait() {
//!     ConversionResult::Success { output_path, .. } => println!("{}", output_path.display()),
//!     ConversionResult::Failure { message, .. } => eprintln!("{}", message),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use uuid::Uuid;

use super::create_standard_pipeline;
use super::pipeline::{CancelHandle, Pipeline};
use super::types::{Context, JobState};
use crate::config::Settings;
use crate::format;
use crate::input::InputNormalizer;
use crate::logging::{JobLogger, LogCallback, LogConfig};
use crate::models::{
    ConversionError, ConversionRequest, ConversionResult, SelectionSummary, SourceSelection,
};
use crate::progress::ProgressTracker;
use crate::staging::StagingArea;

/// Receiver of interim updates for one job.
///
/// All methods default to doing nothing. They are called from the job's
/// worker threads, never from the caller's.
pub trait JobObserver: Send + Sync {
    /// Progress in `[0, 1]`; non-decreasing, 1.0 exactly once at the end.
    fn on_progress(&self, _value: f64) {}

    /// User-facing status line (warnings and the final message).
    fn on_status(&self, _message: &str) {}

    /// One formatted job log line.
    fn on_log(&self, _line: &str) {}
}

/// Observer that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl JobObserver for SilentObserver {}

/// Held while a job is in flight; clears the flag on drop.
struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    /// Atomically claim the flag, or fail if it is already set.
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, ConversionError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ConversionError::JobAlreadyActive)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Handle to a job started with [`Coordinator::start`].
pub struct JobHandle {
    job_id: String,
    receiver: Receiver<ConversionResult>,
    cancel: CancelHandle,
    thread: Option<JoinHandle<()>>,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Ask the job to stop. A running encoder is killed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancellation flag for this job, for use from other threads.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Whether the job has delivered its result.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Block until the job's terminal result is available.
    pub fn wait(mut self) -> ConversionResult {
        let result = self.receiver.recv().unwrap_or_else(|_| {
            ConversionResult::failure(
                &self.job_id,
                &ConversionError::Internal("job ended without a result".to_string()),
            )
        });

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Job thread for {} panicked", self.job_id);
            }
        }
        result
    }
}

/// Orchestrates conversions under the single-job-at-a-time rule.
pub struct Coordinator {
    settings: Settings,
    busy: Arc<AtomicBool>,
    /// Outputs produced during this session, for shutdown cleanup.
    session_outputs: Arc<Mutex<Vec<PathBuf>>>,
    shut_down: AtomicBool,
}

impl Coordinator {
    /// Create a new coordinator. Nothing is touched on disk yet.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            busy: Arc::new(AtomicBool::new(false)),
            session_outputs: Arc::new(Mutex::new(Vec::new())),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether a job is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.settings.staging_dir()
    }

    /// Start a conversion on a background thread.
    ///
    /// Fails immediately with `JobAlreadyActive` if another job is in
    /// flight; nothing is touched in that case. Every other failure is
    /// reported as the job's result.
    pub fn start(
        &self,
        request: ConversionRequest,
        observer: Arc<dyn JobObserver>,
    ) -> Result<JobHandle, ConversionError> {
        let guard = BusyGuard::acquire(&self.busy)?;

        let job_id = Uuid::new_v4().simple().to_string();
        let pipeline = create_standard_pipeline();
        let cancel = pipeline.cancel_handle();
        let (tx, rx) = mpsc::channel();

        let run = JobRun {
            job_id: job_id.clone(),
            request,
            settings: self.settings.clone(),
            observer,
            session_outputs: Arc::clone(&self.session_outputs),
        };

        tracing::info!("Starting job {}", job_id);

        let thread = thread::Builder::new()
            .name(format!("quickgif-job-{}", &job_id[..8]))
            .spawn(move || {
                let result = run.execute(&pipeline);
                drop(guard);
                let _ = tx.send(result);
            })
            .map_err(|e| ConversionError::Internal(format!("cannot start job thread: {}", e)))?;

        Ok(JobHandle {
            job_id,
            receiver: rx,
            cancel,
            thread: Some(thread),
        })
    }

    /// Start a conversion and block until it finishes.
    pub fn run(
        &self,
        request: ConversionRequest,
        observer: Arc<dyn JobObserver>,
    ) -> Result<ConversionResult, ConversionError> {
        Ok(self.start(request, observer)?.wait())
    }

    /// Preview what a selection would stage. Touches nothing.
    pub fn inspect<I, P>(&self, paths: I) -> SelectionSummary
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let selection = SourceSelection::new(paths);
        let candidates =
            InputNormalizer::from_settings(&self.settings.input).normalize(&selection);

        match format::resolve(&candidates) {
            Ok(resolution) => SelectionSummary {
                candidate_count: candidates.len(),
                family: Some(resolution.family.key().to_string()),
                staged_count: resolution.candidates.len(),
                mixed_formats: resolution.is_mixed(),
            },
            Err(_) => SelectionSummary {
                candidate_count: candidates.len(),
                family: None,
                staged_count: 0,
                mixed_formats: false,
            },
        }
    }

    /// Copy a produced GIF to a user-chosen destination.
    ///
    /// A directory destination receives the file under its own name. Any
    /// existing file at the target is removed first.
    pub fn export(&self, output: &Path, destination: &Path) -> Result<PathBuf, ConversionError> {
        let target = match (destination.is_dir(), output.file_name()) {
            (true, Some(name)) => destination.join(name),
            _ => destination.to_path_buf(),
        };

        let export_failed = |source: io::Error| ConversionError::ExportFailed {
            path: target.clone(),
            source,
        };

        if !output.is_file() {
            return Err(export_failed(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", output.display()),
            )));
        }

        match fs::remove_file(&target) {
            Ok(()) => tracing::debug!("Replaced existing {}", target.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(export_failed(e)),
        }

        fs::copy(output, &target).map_err(export_failed)?;
        tracing::info!("Exported {} to {}", output.display(), target.display());
        Ok(target)
    }

    /// Session teardown: sweep the staging directory and, if configured,
    /// this session's outputs.
    ///
    /// Skipped while a job is in flight, so it can be retried once the job
    /// has finished. After one completed teardown, later calls do nothing.
    pub fn shutdown(&self) {
        if self.is_busy() {
            tracing::warn!("Job in flight; postponing staging cleanup");
            return;
        }

        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let cleanup = &self.settings.cleanup;
        if cleanup.sweep_on_shutdown {
            let staging = StagingArea::new(self.staging_dir());
            match staging.sweep() {
                Ok(true) => tracing::debug!("Removed {}", staging.dir().display()),
                Ok(false) => {}
                Err(e) => tracing::warn!("Cannot remove {}: {}", staging.dir().display(), e),
            }
        }

        if cleanup.remove_outputs_on_shutdown {
            for output in self.session_outputs.lock().drain(..) {
                if let Err(e) = fs::remove_file(&output) {
                    if e.kind() != io::ErrorKind::NotFound {
                        tracing::warn!("Cannot remove {}: {}", output.display(), e);
                    }
                }
            }
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Everything a job thread needs, moved onto that thread.
struct JobRun {
    job_id: String,
    request: ConversionRequest,
    settings: Settings,
    observer: Arc<dyn JobObserver>,
    session_outputs: Arc<Mutex<Vec<PathBuf>>>,
}

impl JobRun {
    fn execute(self, pipeline: &Pipeline) -> ConversionResult {
        let logger = Arc::new(self.create_logger());

        let tracker = {
            let observer = Arc::clone(&self.observer);
            let logger = Arc::clone(&logger);
            Arc::new(ProgressTracker::new(Some(Box::new(move |value: f64| {
                observer.on_progress(value);
                logger.progress(value);
            }))))
        };

        let status_observer = Arc::clone(&self.observer);
        let ctx = Context::new(
            &self.job_id,
            &self.request,
            self.settings,
            Arc::clone(&logger),
            pipeline.cancel_handle(),
        )
        .with_progress(Arc::clone(&tracker))
        .with_status_callback(Box::new(move |message: &str| {
            status_observer.on_status(message)
        }));

        logger.info(&format!(
            "Job {} started with {} path(s)",
            self.job_id,
            ctx.selection.len()
        ));

        let mut state = JobState::new(&self.job_id);
        let result = match pipeline.run(&ctx, &mut state) {
            Ok(_) => state.success_result().unwrap_or_else(|| {
                ConversionResult::failure(
                    &self.job_id,
                    &ConversionError::Internal("pipeline finished without output".to_string()),
                )
            }),
            Err(e) => ConversionResult::failure(&self.job_id, &e.into_conversion_error()),
        };

        tracker.finish();

        match &result {
            ConversionResult::Success { output_path, .. } => {
                self.session_outputs.lock().push(output_path.clone());
                logger.success(&result.status_message());
            }
            ConversionResult::Failure { message, .. } => logger.error(message),
        }
        self.observer.on_status(&result.status_message());
        logger.close();

        result
    }

    /// Job logger writing to the logs folder; callback-only if that fails.
    fn create_logger(&self) -> JobLogger {
        let config = LogConfig::from(&self.settings.logging);
        let callback = || -> LogCallback {
            let observer = Arc::clone(&self.observer);
            Box::new(move |line: &str| observer.on_log(line))
        };

        let log_dir = self.settings.logs_dir();
        match JobLogger::new(&self.job_id, log_dir, config.clone(), Some(callback())) {
            Ok(logger) => logger,
            Err(e) => {
                tracing::warn!("Cannot create job log file: {}", e);
                JobLogger::detached(&self.job_id, config, Some(callback()))
            }
        }
    }
}
