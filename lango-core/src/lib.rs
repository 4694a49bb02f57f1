//! Pseudo-word generation library.
//!
//! This crate learns letter-sequence statistics from a corpus of words and
//! generates new words that sound like they belong to it:
//! - Character-level Markov chain with a configurable lookback window
//! - Weighted random generation with an injectable random generator
//! - Corpus loading and normalization helpers

/// Markov chain model, transition tables and generation.
pub mod model;

/// Corpus file loading (reading, word splitting, directory listing).
pub mod corpus;

pub use model::{Chain, ChainError};
