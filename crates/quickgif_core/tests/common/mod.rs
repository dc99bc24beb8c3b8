//! Shared fixtures: a stand-in encoder script and a recording observer.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use quickgif_core::config::Settings;
use quickgif_core::JobObserver;

/// How the stand-in encoder behaves.
#[derive(Debug, Clone)]
pub struct FakeEncoder {
    pub exit_code: i32,
    pub sleep_secs: u32,
    pub write_output: bool,
    pub noisy_lines: u32,
    /// Let the sleeping child inherit stdout and stderr.
    pub sleep_holds_pipes: bool,
}

impl Default for FakeEncoder {
    fn default() -> Self {
        Self {
            exit_code: 0,
            sleep_secs: 0,
            write_output: true,
            noisy_lines: 0,
            sleep_holds_pipes: false,
        }
    }
}

impl FakeEncoder {
    /// Write the script into `dir`; returns (script, argv record file).
    pub fn install(&self, dir: &Path) -> (PathBuf, PathBuf) {
        let script = dir.join("fake-ffmpeg");
        let record = dir.join("argv.txt");

        let mut body = String::from("#!/bin/sh\n");
        body.push_str(&format!("record='{}'\n", record.display()));
        body.push_str(": > \"$record\"\n");
        body.push_str("for arg in \"$@\"; do printf '%s\\n' \"$arg\" >> \"$record\"; done\n");
        body.push_str("echo 'fake encoder starting'\n");
        body.push_str("echo 'some diagnostics' >&2\n");
        if self.noisy_lines > 0 {
            body.push_str(&format!(
                "i=0\nwhile [ $i -lt {} ]; do echo \"frame=$i fps=0.0 q=-0.0 size=N/A time=00:00:00.00\" >&2; i=$((i+1)); done\n",
                self.noisy_lines
            ));
        }
        if self.sleep_secs > 0 && self.sleep_holds_pipes {
            body.push_str(&format!("sleep {}\n", self.sleep_secs));
        } else if self.sleep_secs > 0 {
            body.push_str(&format!(
                "sleep {} </dev/null >/dev/null 2>&1\n",
                self.sleep_secs
            ));
        }
        body.push_str("for last; do :; done\n");
        if self.write_output {
            body.push_str("printf 'GIF89a' > \"$last\"\n");
        }
        body.push_str(&format!("exit {}\n", self.exit_code));

        fs::write(&script, body).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        (script, record)
    }
}

/// Settings rooted in a temp dir, pointing at the given encoder.
pub fn settings(root: &Path, encoder: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.paths.temp_root = root.join("work").to_string_lossy().to_string();
    settings.encoder.path = encoder.to_string_lossy().to_string();
    settings.progress.min_steps = 10;
    settings.progress.step_cap_ms = 5;
    settings.progress.target_duration_ms = 50;
    settings
}

/// Create empty image files with the given names; returns their paths.
pub fn images(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    fs::create_dir_all(dir).unwrap();
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            fs::write(&path, name.as_bytes()).unwrap();
            path
        })
        .collect()
}

/// Recorded encoder arguments.
pub fn recorded_args(record: &Path) -> Vec<String> {
    fs::read_to_string(record)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Sorted file names in a directory.
pub fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Observer that keeps everything it is told.
#[derive(Default)]
pub struct Recorder {
    pub progress: Mutex<Vec<f64>>,
    pub statuses: Mutex<Vec<String>>,
    pub logs: Mutex<Vec<String>>,
}

impl JobObserver for Recorder {
    fn on_progress(&self, value: f64) {
        self.progress.lock().push(value);
    }

    fn on_status(&self, message: &str) {
        self.statuses.lock().push(message.to_string());
    }

    fn on_log(&self, line: &str) {
        self.logs.lock().push(line.to_string());
    }
}
