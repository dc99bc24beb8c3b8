//! Input normalization: raw selection to candidate set.
//!
//! A selection is either exactly one directory (its immediate children are
//! the candidates) or a list of files. Either way the result is filtered by
//! an extension allow-list, made absolute, and deduplicated.

mod normalizer;

pub use normalizer::InputNormalizer;
