//! Family counting and tie-breaking.

use crate::models::{CandidateSet, ConversionError, FormatFamily};

/// Number of candidates belonging to one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyCount {
    pub family: FormatFamily,
    pub count: usize,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct FormatResolution {
    /// Winning family.
    pub family: FormatFamily,
    /// Candidates belonging to the winning family, in frame order.
    pub candidates: CandidateSet,
    /// Every family present, in first-seen order.
    pub counts: Vec<FamilyCount>,
}

impl FormatResolution {
    /// Whether the selection spanned more than one family.
    ///
    /// `jpg` mixed with `jpeg` is one family and does not count.
    pub fn is_mixed(&self) -> bool {
        self.counts.len() > 1
    }

    /// Number of candidates dropped for not matching the winning family.
    pub fn excluded_count(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum::<usize>() - self.candidates.len()
    }
}

/// Resolve the majority family of a candidate set.
///
/// Counting is per family, so synonyms add up. On equal counts the family
/// whose first member appears earliest in the set wins.
pub fn resolve(candidates: &CandidateSet) -> Result<FormatResolution, ConversionError> {
    if candidates.is_empty() {
        return Err(ConversionError::format_resolution(
            "no supported image files in selection",
        ));
    }

    let mut counts: Vec<FamilyCount> = Vec::new();
    for candidate in candidates {
        let family = FormatFamily::for_extension(&candidate.extension);
        match counts.iter_mut().find(|c| c.family == family) {
            Some(entry) => entry.count += 1,
            None => counts.push(FamilyCount { family, count: 1 }),
        }
    }

    // First maximum in first-seen order.
    let winner = counts
        .iter()
        .fold(None::<&FamilyCount>, |best, current| match best {
            Some(b) if b.count >= current.count => Some(b),
            _ => Some(current),
        })
        .map(|c| c.family.clone())
        .ok_or_else(|| ConversionError::format_resolution("no extension could be resolved"))?;

    let filtered = candidates.filter_family(&winner);
    if filtered.is_empty() {
        return Err(ConversionError::format_resolution(format!(
            "no files matched the {} family",
            winner
        )));
    }

    tracing::debug!(
        "Resolved format {} ({} of {} candidates)",
        winner,
        filtered.len(),
        candidates.len()
    );

    Ok(FormatResolution {
        family: winner,
        candidates: filtered,
        counts,
    })
}
