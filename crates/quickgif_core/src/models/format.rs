//! Format families: groups of extensions that count as one image format.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Known synonym groups. The first entry of each group is the canonical key.
pub const SYNONYM_GROUPS: &[&[&str]] = &[&["jpg", "jpeg"], &["tif", "tiff"]];

/// A canonical extension key plus the raw extensions it accepts.
///
/// `jpg` and `jpeg` collapse into the `jpg` family; an extension outside
/// every synonym group is its own single-member family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatFamily {
    key: String,
    extensions: Vec<String>,
}

impl FormatFamily {
    /// The family a raw extension belongs to (matching is case-insensitive).
    pub fn for_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_lowercase();

        match SYNONYM_GROUPS.iter().find(|group| group.contains(&ext.as_str())) {
            Some(group) => Self {
                key: group[0].to_string(),
                extensions: group.iter().map(|e| e.to_string()).collect(),
            },
            None => Self {
                key: ext.clone(),
                extensions: vec![ext],
            },
        }
    }

    /// Canonical key, also used as the staged file extension.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// All raw extensions accepted by this family.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether a raw extension belongs to this family.
    pub fn accepts(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.');
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for FormatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extensions.len() > 1 {
            write!(f, "{} ({})", self.key, self.extensions.join("/"))
        } else {
            write!(f, "{}", self.key)
        }
    }
}
