//! Source selections and the candidate sets derived from them.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::format::FormatFamily;

/// Ordered sequence of user-chosen filesystem paths for one job.
///
/// May be a single directory or a list of files. Immutable once captured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSelection {
    paths: Vec<PathBuf>,
}

impl SourceSelection {
    /// Capture a selection from any list of paths.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// The selected paths, in selection order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The directory this selection points at, if it is exactly one directory.
    pub fn single_directory(&self) -> Option<&Path> {
        match self.paths.as_slice() {
            [only] if only.is_dir() => Some(only.as_path()),
            _ => None,
        }
    }
}

/// Lower-cased extension of a path, without the leading dot.
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// A file path that passed extension filtering and is eligible for staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Absolute path to the source image.
    pub path: PathBuf,
    /// Lower-cased raw extension (e.g. "jpeg", not the family key).
    pub extension: String,
}

impl Candidate {
    /// Build a candidate from a path, or `None` if it has no extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let extension = lowercase_extension(&path)?;
        Some(Self { path, extension })
    }
}

/// Deduplicated, extension-filtered candidates in frame order.
///
/// Order is selection order (or directory enumeration order) and decides
/// the final frame order. Duplicate paths keep their first position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Candidate paths in frame order.
    pub fn paths(&self) -> Vec<&Path> {
        self.candidates.iter().map(|c| c.path.as_path()).collect()
    }

    /// Keep only candidates whose extension belongs to `family`.
    pub fn filter_family(&self, family: &FormatFamily) -> CandidateSet {
        self.candidates
            .iter()
            .filter(|c| family.accepts(&c.extension))
            .cloned()
            .collect()
    }

    /// Distinct raw extensions, in first-seen order.
    pub fn distinct_extensions(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for candidate in &self.candidates {
            if !seen.contains(&candidate.extension.as_str()) {
                seen.push(candidate.extension.as_str());
            }
        }
        seen
    }
}

impl FromIterator<Candidate> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = Candidate>>(iter: T) -> Self {
        let mut seen = HashSet::new();
        let candidates = iter
            .into_iter()
            .filter(|c| seen.insert(c.path.clone()))
            .collect();
        Self { candidates }
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
