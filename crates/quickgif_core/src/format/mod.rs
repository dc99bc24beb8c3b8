//! Majority format resolution.
//!
//! Picks the format family most candidates belong to and narrows the
//! candidate set to it. Ties go to the family seen first in frame order.

mod resolver;

pub use resolver::{resolve, FamilyCount, FormatResolution};
