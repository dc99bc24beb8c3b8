//! Selection flattening and extension filtering.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::InputSettings;
use crate::models::{lowercase_extension, Candidate, CandidateSet, SourceSelection};

/// Turns a [`SourceSelection`] into a [`CandidateSet`].
///
/// Has no side effects. An unreadable directory yields an empty set, which
/// later stages report as "no files".
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    allowed: HashSet<String>,
    sort_directory_entries: bool,
}

impl InputNormalizer {
    /// Create a normalizer accepting the given extensions (case-insensitive).
    pub fn new<I, S>(allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: allowed_extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            sort_directory_entries: false,
        }
    }

    /// Create a normalizer from input settings.
    pub fn from_settings(settings: &InputSettings) -> Self {
        Self::new(&settings.allowed_extensions)
            .with_sorted_directories(settings.sort_directory_entries)
    }

    /// Order directory children by file name instead of enumeration order.
    pub fn with_sorted_directories(mut self, sorted: bool) -> Self {
        self.sort_directory_entries = sorted;
        self
    }

    /// Whether a path's extension is on the allow-list.
    pub fn is_allowed(&self, path: &Path) -> bool {
        lowercase_extension(path).is_some_and(|ext| self.allowed.contains(&ext))
    }

    /// Flatten, filter and deduplicate a selection.
    pub fn normalize(&self, selection: &SourceSelection) -> CandidateSet {
        match selection.single_directory() {
            Some(dir) => self.candidates(self.list_directory(dir)),
            None => self.candidates(selection.paths().iter().cloned()),
        }
    }

    fn candidates(&self, paths: impl IntoIterator<Item = PathBuf>) -> CandidateSet {
        paths
            .into_iter()
            .filter(|p| self.is_allowed(p))
            .map(|p| std::path::absolute(&p).unwrap_or(p))
            .filter_map(Candidate::from_path)
            .collect()
    }

    fn list_directory(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot list {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .filter(|p| p.is_file())
            .collect();

        if self.sort_directory_entries {
            files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        }

        tracing::debug!("{} files found in {}", files.len(), dir.display());
        files
    }
}

impl Default for InputNormalizer {
    fn default() -> Self {
        Self::from_settings(&InputSettings::default())
    }
}
