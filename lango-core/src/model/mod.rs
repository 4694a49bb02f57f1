//! Character-level Markov chain.
//!
//! - Context keys and sentinel symbols (`key`)
//! - Per-context frequency tables (`transition_table`)
//! - Training and generation (`chain`)
//! - Error types (`error`)

/// Word-level Markov chain: training, generation and merging.
pub mod chain;

/// Errors returned by chain construction and generation.
pub mod error;

/// Lookback window and the symbols it holds.
pub mod key;

/// Weighted distribution of the symbols following one context.
pub mod transition_table;

pub use chain::{Chain, DEFAULT_LOOKBACK, DEFAULT_MAX_LENGTH};
pub use error::{ChainError, ChainResult};
pub use key::{ContextKey, Symbol};
pub use transition_table::TransitionTable;
