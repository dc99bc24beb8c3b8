//! Staging directory lifecycle and frame copying.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{FRAME_PREFIX, INDEX_WIDTH, MAX_FRAMES};
use crate::models::{CandidateSet, ConversionError, FormatFamily};

/// File name of the frame at `index`, e.g. `img007.png`.
pub fn frame_name(index: usize, extension: &str) -> String {
    format!(
        "{}{:0width$}.{}",
        FRAME_PREFIX,
        index,
        extension,
        width = INDEX_WIDTH
    )
}

/// Reject selections the index width cannot address.
pub fn check_frame_limit(count: usize) -> Result<(), ConversionError> {
    if count > MAX_FRAMES {
        return Err(ConversionError::FrameLimitExceeded {
            count,
            max: MAX_FRAMES,
        });
    }
    Ok(())
}

/// A candidate that could not be copied into the staging directory.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub source: PathBuf,
    pub reason: String,
}

/// Result of staging: a contiguous frame sequence on disk.
#[derive(Debug, Clone)]
pub struct StagedSequence {
    dir: PathBuf,
    extension: String,
    frames: Vec<PathBuf>,
    skipped: Vec<SkippedFile>,
}

impl StagedSequence {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Extension used for every staged frame (the family's canonical key).
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Staged frame paths, index 0 first.
    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    /// Candidates that failed to copy.
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// printf-style pattern addressing every frame, e.g. `<dir>/img%03d.png`.
    pub fn input_pattern(&self) -> String {
        self.dir
            .join(format!(
                "{}%0{}d.{}",
                FRAME_PREFIX, INDEX_WIDTH, self.extension
            ))
            .to_string_lossy()
            .to_string()
    }
}

/// Owner of the staging directory.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Create a staging area rooted at `dir`. Nothing is touched yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a previous job left a staging directory behind.
    pub fn exists(&self) -> bool {
        self.dir.exists()
    }

    /// Remove any previous staging directory and create an empty one.
    pub fn recreate(&self) -> Result<(), ConversionError> {
        self.sweep().map_err(|e| {
            ConversionError::staging_io(
                format!("cannot remove old staging directory {}", self.dir.display()),
                e,
            )
        })?;

        fs::create_dir_all(&self.dir).map_err(|e| {
            ConversionError::staging_io(
                format!("cannot create staging directory {}", self.dir.display()),
                e,
            )
        })
    }

    /// Copy candidates into a fresh directory as a contiguous sequence.
    ///
    /// Files that fail to copy are skipped and reported in
    /// [`StagedSequence::skipped`]; the next file takes the free index so
    /// the sequence never has gaps. Fails if nothing could be copied.
    pub fn stage(
        &self,
        candidates: &CandidateSet,
        family: &FormatFamily,
    ) -> Result<StagedSequence, ConversionError> {
        check_frame_limit(candidates.len())?;
        self.recreate()?;

        let extension = family.key().to_string();
        let mut frames = Vec::with_capacity(candidates.len());
        let mut skipped = Vec::new();

        for candidate in candidates {
            let target = self.dir.join(frame_name(frames.len(), &extension));
            match fs::copy(&candidate.path, &target) {
                Ok(_) => frames.push(target),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", candidate.path.display(), e);
                    skipped.push(SkippedFile {
                        source: candidate.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if frames.is_empty() {
            return Err(ConversionError::staging_failed(format!(
                "none of the {} selected files could be copied",
                candidates.len()
            )));
        }

        tracing::debug!(
            "Staged {} frames in {} ({} skipped)",
            frames.len(),
            self.dir.display(),
            skipped.len()
        );

        Ok(StagedSequence {
            dir: self.dir.clone(),
            extension,
            frames,
            skipped,
        })
    }

    /// Remove the staging directory if present.
    ///
    /// Returns whether anything was removed.
    pub fn sweep(&self) -> io::Result<bool> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
