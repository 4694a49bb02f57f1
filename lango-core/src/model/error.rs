use thiserror::Error;

/// Result type alias for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors raised while building or sampling a [`Chain`](super::chain::Chain).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
	/// The lookback window must hold at least one character.
	#[error("invalid lookback: {0} (must be >= 1)")]
	InvalidLookback(usize),

	/// The generation bound must allow at least one character.
	#[error("invalid max length: {0} (must be >= 1)")]
	InvalidMaxLength(usize),

	/// Generation reached a context that has no recorded transitions.
	#[error("no transitions recorded for context {context:?}")]
	UntrainedContext { context: String },

	/// A table yielded the start sentinel, which only pads context keys.
	#[error("start sentinel recorded as a transition after context {context:?}")]
	InvalidTransition { context: String },

	/// Generation did not draw the end sentinel within the length bound.
	#[error("generated word exceeded {limit} characters (partial: {partial:?})")]
	WordTooLong { limit: usize, partial: String },

	/// Two chains with different window sizes cannot be merged.
	#[error("lookback mismatch: expected {expected}, found {found}")]
	LookbackMismatch { expected: usize, found: usize },
}
