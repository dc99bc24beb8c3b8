//! Encoder process supervision.
//!
//! The supervisor owns the child process for the duration of one job:
//!
//! 1. Removes any file already sitting at the output path
//! 2. Spawns the encoder with both output pipes captured
//! 3. Drains stdout and stderr on two named threads into a [`DiagnosticSink`]
//! 4. Polls for the exit status, killing the child's whole process group if
//!    cancellation is requested
//! 5. Joins both drain threads, then reports exactly one outcome
//!
//! Drained output is diagnostic only. Success is decided by the exit status.

use std::env;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::command::{format_args_for_log, EncoderCommand};
use crate::logging::{JobLogger, OutputStream};
use crate::models::ConversionError;
use crate::orchestrator::CancelHandle;

/// How long readers may keep draining once a cancelled encoder is gone.
const CANCEL_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Receiver for drained encoder output.
pub trait DiagnosticSink: Send + Sync {
    /// Record one line of output.
    fn record(&self, line: &str, stream: OutputStream);

    /// Recent output, oldest first, for failure reports.
    fn tail(&self) -> Vec<String> {
        Vec::new()
    }
}

impl DiagnosticSink for JobLogger {
    fn record(&self, line: &str, stream: OutputStream) {
        self.output_line(line, stream);
    }

    fn tail(&self) -> Vec<String> {
        self.get_tail()
    }
}

/// A finished encoder run that exited with status zero.
#[derive(Debug, Clone)]
pub struct EncoderOutcome {
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

enum WaitOutcome {
    Exited(ExitStatus),
    Cancelled,
}

/// Launches and supervises one encoder process at a time.
#[derive(Debug, Clone)]
pub struct EncoderSupervisor {
    program: PathBuf,
    poll_interval: Duration,
}

impl EncoderSupervisor {
    /// Create a supervisor for the given executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            poll_interval: Duration::from_millis(20),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command line as it would be logged.
    pub fn describe(&self, command: &EncoderCommand) -> String {
        format_args_for_log(&self.program.to_string_lossy(), &command.build())
    }

    /// Run the encoder to completion.
    ///
    /// Blocks until the process has exited and both pipes are drained.
    pub fn run(
        &self,
        command: &EncoderCommand,
        sink: Arc<dyn DiagnosticSink>,
        cancel: &CancelHandle,
    ) -> Result<EncoderOutcome, ConversionError> {
        let output_path = command.output_path().to_path_buf();
        prepare_output(&output_path)?;

        let mut process = Command::new(&self.program);
        process
            .args(command.build())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            // Own group: a terminal Ctrl-C stays with us, and cancel can reach
            // anything the encoder spawns.
            use std::os::unix::process::CommandExt;
            process.process_group(0);
        }

        let started = Instant::now();
        let mut child = process
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    ConversionError::EncoderMissing(self.program.display().to_string())
                }
                _ => ConversionError::LaunchFailed(e),
            })?;

        tracing::debug!("Encoder started (pid {})", child.id());

        let drains = match spawn_drains(&mut child, &sink) {
            Ok(drains) => drains,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConversionError::LaunchFailed(e));
            }
        };

        let waited = self.wait(&mut child, cancel);
        let cancelled = matches!(waited, Ok(WaitOutcome::Cancelled));
        join_drains(drains, cancelled.then_some(CANCEL_DRAIN_GRACE));

        match waited.map_err(ConversionError::LaunchFailed)? {
            WaitOutcome::Cancelled => Err(ConversionError::Cancelled),
            WaitOutcome::Exited(status) if status.success() => Ok(EncoderOutcome {
                output_path,
                elapsed: started.elapsed(),
            }),
            WaitOutcome::Exited(status) => Err(ConversionError::EncoderExitedNonZero {
                code: status.code().unwrap_or(-1),
                tail: sink.tail(),
            }),
        }
    }

    fn wait(&self, child: &mut Child, cancel: &CancelHandle) -> io::Result<WaitOutcome> {
        loop {
            if cancel.is_cancelled() {
                tracing::info!("Cancelling encoder (pid {})", child.id());
                terminate(child)?;
                return Ok(WaitOutcome::Cancelled);
            }

            match child.try_wait() {
                Ok(Some(status)) => return Ok(WaitOutcome::Exited(status)),
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => {
                    let _ = terminate(child);
                    return Err(e);
                }
            }
        }
    }
}

/// Remove a stale output file and make sure its folder exists.
fn prepare_output(output_path: &Path) -> Result<(), ConversionError> {
    match fs::remove_file(output_path) {
        Ok(()) => tracing::debug!("Removed existing {}", output_path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(ConversionError::LaunchFailed(e)),
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(ConversionError::LaunchFailed)?;
    }
    Ok(())
}

fn terminate(child: &mut Child) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }
    #[cfg(unix)]
    kill_process_group(child.id());
    let _ = child.kill();
    child.wait()
}

/// Kill every process in the group led by `pgid`.
#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let status = Command::new("kill")
        .args(["-s", "KILL", "--", &format!("-{}", pgid)])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = status {
        tracing::debug!("Cannot signal process group {}: {}", pgid, e);
    }
}

/// Join the drain threads.
///
/// With a grace period, readers still blocked when it runs out are
/// detached instead; a leftover process may hold the pipes open.
fn join_drains(drains: Vec<JoinHandle<()>>, grace: Option<Duration>) {
    if let Some(grace) = grace {
        let deadline = Instant::now() + grace;
        while drains.iter().any(|drain| !drain.is_finished()) {
            if Instant::now() >= deadline {
                tracing::warn!("Encoder output still open after cancel; detaching readers");
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    for drain in drains {
        if drain.join().is_err() {
            tracing::warn!("Encoder output reader panicked");
        }
    }
}

fn spawn_drains(
    child: &mut Child,
    sink: &Arc<dyn DiagnosticSink>,
) -> io::Result<Vec<JoinHandle<()>>> {
    let mut drains = Vec::with_capacity(2);

    if let Some(stdout) = child.stdout.take() {
        drains.push(spawn_drain(stdout, OutputStream::Stdout, Arc::clone(sink))?);
    }
    if let Some(stderr) = child.stderr.take() {
        drains.push(spawn_drain(stderr, OutputStream::Stderr, Arc::clone(sink))?);
    }

    Ok(drains)
}

fn spawn_drain(
    pipe: impl Read + Send + 'static,
    stream: OutputStream,
    sink: Arc<dyn DiagnosticSink>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("encoder-{}", stream))
        .spawn(move || drain(pipe, stream, sink.as_ref()))
}

/// Read a pipe until end-of-data, forwarding each line.
///
/// Progress output that rewrites itself with `\r` is split into separate
/// lines. Invalid UTF-8 is replaced, never fatal.
fn drain(pipe: impl Read, stream: OutputStream, sink: &dyn DiagnosticSink) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                for line in text
                    .split('\r')
                    .map(|segment| segment.trim_end_matches('\n'))
                    .filter(|segment| !segment.is_empty())
                {
                    sink.record(line, stream);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("Stopped reading encoder {}: {}", stream, e);
                break;
            }
        }
    }
}

/// Verify a configured encoder path points at an executable file.
pub fn check_encoder(path: Option<&Path>) -> Result<PathBuf, ConversionError> {
    let path = path.ok_or_else(|| {
        ConversionError::EncoderMissing("no encoder executable configured".to_string())
    })?;

    if !is_executable(path) {
        return Err(ConversionError::EncoderMissing(path.display().to_string()));
    }
    Ok(path.to_path_buf())
}

/// Search `PATH` for an executable called `name`.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .flat_map(|dir| executable_names(name).map(move |n| dir.join(n)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn executable_names(name: &str) -> impl Iterator<Item = String> {
    [name.to_string(), format!("{}.exe", name)].into_iter()
}

#[cfg(not(windows))]
fn executable_names(name: &str) -> impl Iterator<Item = String> {
    std::iter::once(name.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorKind;
    use parking_lot::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct Collect(Mutex<Vec<(OutputStream, String)>>);

    impl DiagnosticSink for Collect {
        fn record(&self, line: &str, stream: OutputStream) {
            self.0.lock().push((stream, line.to_string()));
        }
    }

    #[test]
    fn drain_splits_lines_and_carriage_returns() {
        let sink = Collect::default();
        let input: &[u8] = b"first\nframe=1\rframe=2\r\nlast";

        drain(input, OutputStream::Stderr, &sink);

        let lines: Vec<String> = sink.0.lock().iter().map(|(_, l)| l.clone()).collect();
        assert_eq!(lines, vec!["first", "frame=1", "frame=2", "last"]);
    }

    #[test]
    fn drain_tolerates_invalid_utf8() {
        let sink = Collect::default();
        let input: &[u8] = b"ok \xff\xfe bytes\n";

        drain(input, OutputStream::Stdout, &sink);

        let recorded = sink.0.lock();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].1.starts_with("ok "));
    }

    #[test]
    fn missing_configuration_is_encoder_missing() {
        let err = check_encoder(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncoderMissing);

        let dir = tempdir().unwrap();
        let err = check_encoder(Some(&dir.path().join("ffmpeg"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncoderMissing);
    }

    #[test]
    fn directory_is_not_an_encoder() {
        let dir = tempdir().unwrap();
        assert!(check_encoder(Some(dir.path())).is_err());
    }

    #[test]
    fn prepare_output_removes_stale_file() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("out.gif");
        prepare_output(&out).unwrap();
        assert!(out.parent().unwrap().is_dir());

        fs::write(&out, b"old").unwrap();
        prepare_output(&out).unwrap();
        assert!(!out.exists());
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ffmpeg");
        fs::write(&path, b"#!/bin/sh\n").unwrap();
        assert!(check_encoder(Some(&path)).is_err());
    }

    #[test]
    fn stuck_readers_are_detached_after_grace() {
        let stuck = thread::spawn(|| thread::sleep(Duration::from_secs(5)));
        let started = Instant::now();

        join_drains(vec![stuck], Some(Duration::from_millis(50)));

        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn finished_readers_are_joined() {
        let done = thread::spawn(|| {});
        join_drains(vec![done], Some(Duration::from_millis(500)));
        join_drains(Vec::new(), None);
    }
}
