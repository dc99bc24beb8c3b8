//! End-to-end conversions against a stand-in encoder script.

#![cfg(unix)]

mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{images, listing, recorded_args, settings, FakeEncoder, Recorder};
use quickgif_core::encoder::scale_pad_filter;
use quickgif_core::{
    ConversionRequest, ConversionResult, Coordinator, ErrorKind, SilentObserver,
};
use tempfile::tempdir;

#[test]
fn five_pngs_become_one_gif() {
    let root = tempdir().unwrap();
    let (encoder, record) = FakeEncoder::default().install(root.path());
    let sources = images(
        &root.path().join("in"),
        &["e.png", "a.png", "c.png", "b.png", "d.png"],
    );
    let coordinator = Coordinator::new(settings(root.path(), &encoder));

    let result = coordinator
        .run(ConversionRequest::new(&sources, "12", "320"), Arc::new(SilentObserver))
        .unwrap();

    let (output_path, frame_count, family, mixed_formats) = match result {
        ConversionResult::Success {
            output_path,
            frame_count,
            family,
            mixed_formats,
            ..
        } => (output_path, frame_count, family, mixed_formats),
        other => panic!("expected success, got {:?}", other),
    };
    assert_eq!(frame_count, 5);
    assert_eq!(family, "png");
    assert!(!mixed_formats);
    assert!(output_path.to_string_lossy().ends_with(".gif"));
    assert!(output_path.is_file());

    let staging = coordinator.staging_dir();
    assert_eq!(
        listing(&staging),
        vec!["img000.png", "img001.png", "img002.png", "img003.png", "img004.png"]
    );
    // Frame order follows selection order.
    assert_eq!(fs::read_to_string(staging.join("img000.png")).unwrap(), "e.png");
    assert_eq!(fs::read_to_string(staging.join("img004.png")).unwrap(), "d.png");

    let args = recorded_args(&record);
    let pattern = staging.join("img%03d.png").to_string_lossy().to_string();
    let output = output_path.to_string_lossy().to_string();
    assert_eq!(
        args,
        vec![
            "-y",
            "-framerate",
            "12",
            "-i",
            pattern.as_str(),
            "-vf",
            scale_pad_filter(320).as_str(),
            "-loop",
            "0",
            output.as_str(),
        ]
    );
}

#[test]
fn jpg_and_jpeg_folder_is_one_family() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder::default().install(root.path());
    let folder = root.path().join("shots");
    images(&folder, &["1.jpg", "2.jpeg", "3.jpg", "4.JPEG", "5.jpg", "notes.txt"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));
    let observer = Arc::new(Recorder::default());

    let result = coordinator
        .run(ConversionRequest::new([&folder], "15", "640"), observer.clone())
        .unwrap();

    match result {
        ConversionResult::Success {
            frame_count,
            ref family,
            mixed_formats,
            ..
        } => {
            assert_eq!(frame_count, 5);
            assert_eq!(family, "jpg");
            assert!(!mixed_formats);
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(listing(&coordinator.staging_dir()).len(), 5);
    assert!(listing(&coordinator.staging_dir())
        .iter()
        .all(|name| name.ends_with(".jpg")));
    assert!(!observer
        .statuses
        .lock()
        .iter()
        .any(|s| s.contains("Mixed")));
}

#[test]
fn png_and_bmp_tie_goes_to_first_seen() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder::default().install(root.path());
    let sources = images(&root.path().join("in"), &["first.png", "second.bmp"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));
    let observer = Arc::new(Recorder::default());

    let result = coordinator
        .run(ConversionRequest::new(&sources, "10", "100"), observer.clone())
        .unwrap();

    match result {
        ConversionResult::Success {
            frame_count,
            ref family,
            mixed_formats,
            ..
        } => {
            assert_eq!(family, "png");
            assert_eq!(frame_count, 1);
            assert!(mixed_formats);
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(listing(&coordinator.staging_dir()), vec!["img000.png"]);
    assert!(observer
        .statuses
        .lock()
        .iter()
        .any(|s| s.contains("Mixed image formats")));
}

#[test]
fn missing_encoder_leaves_previous_staging_alone() {
    let root = tempdir().unwrap();
    let sources = images(&root.path().join("in"), &["a.png", "b.png"]);
    let settings = settings(root.path(), &root.path().join("no-such-ffmpeg"));

    let staging = settings.staging_dir();
    fs::create_dir_all(&staging).unwrap();
    fs::write(staging.join("img000.png"), b"previous run").unwrap();

    let coordinator = Coordinator::new(settings);
    let result = coordinator
        .run(ConversionRequest::new(&sources, "10", "100"), Arc::new(SilentObserver))
        .unwrap();

    assert_eq!(result.error_kind(), Some(ErrorKind::EncoderMissing));
    assert_eq!(
        fs::read_to_string(staging.join("img000.png")).unwrap(),
        "previous run"
    );
}

#[test]
fn unconfigured_encoder_is_reported() {
    let root = tempdir().unwrap();
    let sources = images(&root.path().join("in"), &["a.png"]);
    let mut settings = settings(root.path(), &root.path().join("unused"));
    settings.encoder.path.clear();

    let coordinator = Coordinator::new(settings);
    let result = coordinator
        .run(ConversionRequest::new(&sources, "10", "100"), Arc::new(SilentObserver))
        .unwrap();

    assert_eq!(result.error_kind(), Some(ErrorKind::EncoderMissing));
}

#[test]
fn second_start_while_busy_is_rejected() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder {
        sleep_secs: 1,
        ..Default::default()
    }
    .install(root.path());
    let first = images(&root.path().join("one"), &["a.png", "b.png", "c.png"]);
    let second = images(&root.path().join("two"), &["x.png"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));

    let handle = coordinator
        .start(ConversionRequest::new(&first, "10", "100"), Arc::new(SilentObserver))
        .unwrap();
    assert!(coordinator.is_busy());

    // Let the first job reach its encoder.
    thread::sleep(Duration::from_millis(300));
    let staged_before = listing(&coordinator.staging_dir());

    let rejected = coordinator.start(
        ConversionRequest::new(&second, "10", "100"),
        Arc::new(SilentObserver),
    );
    assert!(matches!(
        rejected.as_ref().map_err(|e| e.kind()),
        Err(ErrorKind::JobAlreadyActive)
    ));
    assert_eq!(listing(&coordinator.staging_dir()), staged_before);

    let result = handle.wait();
    assert!(result.is_success(), "{:?}", result);
    assert!(!coordinator.is_busy());
    assert_eq!(staged_before.len(), 3);
}

#[test]
fn repeated_runs_produce_distinct_outputs() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder::default().install(root.path());
    let sources = images(&root.path().join("in"), &["a.gif", "b.gif"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));

    let outputs: Vec<PathBuf> = (0..2)
        .map(|_| {
            coordinator
                .run(ConversionRequest::new(&sources, "10", "100"), Arc::new(SilentObserver))
                .unwrap()
                .output_path()
                .map(PathBuf::from)
                .unwrap()
        })
        .collect();

    assert_ne!(outputs[0], outputs[1]);
    assert!(outputs.iter().all(|p| p.is_file()));
}

#[test]
fn progress_is_monotonic_and_completes_once() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder {
        sleep_secs: 1,
        ..Default::default()
    }
    .install(root.path());
    let sources = images(&root.path().join("in"), &["a.png", "b.png"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));
    let observer = Arc::new(Recorder::default());

    let result = coordinator
        .run(ConversionRequest::new(&sources, "10", "100"), observer.clone())
        .unwrap();
    assert!(result.is_success());

    let values = observer.progress.lock().clone();
    assert!(values.len() > 1, "estimator never ticked: {:?}", values);
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(values.last().copied(), Some(1.0));
    assert_eq!(values.iter().filter(|v| **v >= 1.0).count(), 1);
}

#[test]
fn failed_job_still_completes_progress() {
    let root = tempdir().unwrap();
    let coordinator = Coordinator::new(settings(root.path(), &root.path().join("none")));
    let observer = Arc::new(Recorder::default());

    let result = coordinator
        .run(ConversionRequest::new(["/x/a.png"], "0", "100"), observer.clone())
        .unwrap();

    assert_eq!(result.error_kind(), Some(ErrorKind::InvalidParameters));
    assert_eq!(*observer.progress.lock(), vec![1.0]);
    assert_eq!(
        observer.statuses.lock().last().map(String::as_str),
        Some("Invalid frame rate: cannot be zero")
    );
}

#[test]
fn bad_parameters_are_rejected_before_staging() {
    let root = tempdir().unwrap();
    let (encoder, record) = FakeEncoder::default().install(root.path());
    let sources = images(&root.path().join("in"), &["a.png"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));

    for (fps, res) in [("0", "100"), ("10", "0"), ("ten", "100"), ("10", "big"), ("", "")] {
        let result = coordinator
            .run(ConversionRequest::new(&sources, fps, res), Arc::new(SilentObserver))
            .unwrap();

        assert_eq!(
            result.error_kind(),
            Some(ErrorKind::InvalidParameters),
            "fps={:?} res={:?}",
            fps,
            res
        );
    }
    assert!(!coordinator.staging_dir().exists());
    assert!(!record.exists());
}

#[test]
fn non_zero_exit_carries_code_and_output_tail() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder {
        exit_code: 3,
        write_output: false,
        ..Default::default()
    }
    .install(root.path());
    let sources = images(&root.path().join("in"), &["a.png"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));

    let result = coordinator
        .run(ConversionRequest::new(&sources, "10", "100"), Arc::new(SilentObserver))
        .unwrap();

    match result {
        ConversionResult::Failure { kind, ref message, .. } => {
            assert_eq!(kind, ErrorKind::EncoderExitedNonZero);
            assert!(message.starts_with("Encoder failed with code 3"));
            assert!(message.contains("some diagnostics"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!coordinator.is_busy());
}

#[test]
fn zero_exit_without_output_is_a_failure() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder {
        write_output: false,
        ..Default::default()
    }
    .install(root.path());
    let sources = images(&root.path().join("in"), &["a.png"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));

    let result = coordinator
        .run(ConversionRequest::new(&sources, "10", "100"), Arc::new(SilentObserver))
        .unwrap();

    assert_eq!(result.error_kind(), Some(ErrorKind::OutputMissing));
}

#[test]
fn heavy_encoder_output_does_not_stall() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder {
        noisy_lines: 5000,
        ..Default::default()
    }
    .install(root.path());
    let sources = images(&root.path().join("in"), &["a.png"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));

    let started = Instant::now();
    let result = coordinator
        .run(ConversionRequest::new(&sources, "10", "100"), Arc::new(SilentObserver))
        .unwrap();

    assert!(result.is_success(), "{:?}", result);
    assert!(started.elapsed() < Duration::from_secs(30));
}

#[test]
fn cancel_kills_a_running_encoder() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder {
        sleep_secs: 10,
        ..Default::default()
    }
    .install(root.path());
    let sources = images(&root.path().join("in"), &["a.png"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));
    let observer = Arc::new(Recorder::default());

    let started = Instant::now();
    let handle = coordinator
        .start(ConversionRequest::new(&sources, "10", "100"), observer.clone())
        .unwrap();
    thread::sleep(Duration::from_millis(300));
    handle.cancel();
    let result = handle.wait();

    assert_eq!(result.error_kind(), Some(ErrorKind::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(8));
    assert!(!coordinator.is_busy());
    assert_eq!(observer.progress.lock().last().copied(), Some(1.0));
}

#[test]
fn cancel_does_not_wait_for_processes_holding_encoder_output() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder {
        sleep_secs: 6,
        sleep_holds_pipes: true,
        ..Default::default()
    }
    .install(root.path());
    let sources = images(&root.path().join("in"), &["a.png"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));

    let started = Instant::now();
    let handle = coordinator
        .start(ConversionRequest::new(&sources, "10", "100"), Arc::new(SilentObserver))
        .unwrap();
    thread::sleep(Duration::from_millis(300));
    handle.cancel();
    let result = handle.wait();

    assert_eq!(result.error_kind(), Some(ErrorKind::Cancelled));
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "cancel took {:?}",
        started.elapsed()
    );
    assert!(!coordinator.is_busy());
}

#[test]
fn too_many_frames_are_rejected_up_front() {
    let root = tempdir().unwrap();
    let (encoder, record) = FakeEncoder::default().install(root.path());
    let folder = root.path().join("many");
    let names: Vec<String> = (0..1001).map(|i| format!("f{:04}.png", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    images(&folder, &refs);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));

    let result = coordinator
        .run(ConversionRequest::new([&folder], "10", "100"), Arc::new(SilentObserver))
        .unwrap();

    assert_eq!(result.error_kind(), Some(ErrorKind::FrameLimitExceeded));
    assert!(!coordinator.staging_dir().exists());
    assert!(!record.exists());
}

#[test]
fn job_log_is_written_per_job() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder::default().install(root.path());
    let sources = images(&root.path().join("in"), &["a.png"]);
    let settings = settings(root.path(), &encoder);
    let logs = settings.logs_dir();
    let coordinator = Coordinator::new(settings);

    let result = coordinator
        .run(ConversionRequest::new(&sources, "10", "100"), Arc::new(SilentObserver))
        .unwrap();

    let log = fs::read_to_string(logs.join(format!("{}.log", result.job_id()))).unwrap();
    assert!(log.contains("=== Encode ==="));
    assert!(log.contains("$ "));
    assert!(log.contains("[SUCCESS]"));
}

#[test]
fn shutdown_removes_staging_and_optionally_outputs() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder::default().install(root.path());
    let sources = images(&root.path().join("in"), &["a.png"]);
    let mut settings = settings(root.path(), &encoder);
    settings.cleanup.remove_outputs_on_shutdown = true;
    let coordinator = Coordinator::new(settings);

    let result = coordinator
        .run(ConversionRequest::new(&sources, "10", "100"), Arc::new(SilentObserver))
        .unwrap();
    let output = result.output_path().map(PathBuf::from).unwrap();
    let staging = coordinator.staging_dir();
    assert!(staging.exists());

    drop(coordinator);

    assert!(!staging.exists());
    assert!(!output.exists());
}

#[test]
fn shutdown_during_a_job_is_retried_afterwards() {
    let root = tempdir().unwrap();
    let (encoder, _) = FakeEncoder {
        sleep_secs: 1,
        ..Default::default()
    }
    .install(root.path());
    let sources = images(&root.path().join("in"), &["a.png", "b.png"]);
    let coordinator = Coordinator::new(settings(root.path(), &encoder));
    let staging = coordinator.staging_dir();

    let handle = coordinator
        .start(ConversionRequest::new(&sources, "10", "100"), Arc::new(SilentObserver))
        .unwrap();
    thread::sleep(Duration::from_millis(300));
    coordinator.shutdown();
    assert!(staging.exists());

    let result = handle.wait();
    assert!(result.is_success(), "{:?}", result);

    coordinator.shutdown();
    assert!(!staging.exists());
}
