use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

use log::{debug, warn};
use rand::Rng;

use super::error::{ChainError, ChainResult};
use super::key::{ContextKey, Symbol};
use super::transition_table::TransitionTable;

/// Generation bound used when none is configured.
pub const DEFAULT_MAX_LENGTH: usize = 64;

/// Window size used by the command-line and HTTP front ends by default.
pub const DEFAULT_LOOKBACK: usize = 2;

/// Character-level Markov chain over words.
///
/// The `Chain` stores one [`TransitionTable`] per context key of length
/// `lookback` and generates words by repeatedly sampling the table of the
/// current key until the end sentinel is drawn.
///
/// # Responsibilities
/// - Learn transitions from words (`add_word`)
/// - Generate new words (`make_word`, `make_word_with`)
/// - Merge with another chain of the same `lookback`
///
/// # Invariants
/// - `lookback` is always >= 1
/// - `max_length` is always >= 1
/// - Every stored table has at least one transition
/// - Counts only ever grow
#[derive(Clone, Debug)]
pub struct Chain {
	/// Number of preceding characters used as context.
	lookback: usize,

	/// Maximum number of characters a generated word may hold.
	max_length: usize,

	/// Mapping from a context key to the symbols observed after it.
	tables: HashMap<ContextKey, TransitionTable>,
}

impl Chain {
	/// Creates an empty chain with a context window of `lookback` characters.
	///
	/// # Errors
	/// Returns [`ChainError::InvalidLookback`] if `lookback` is 0.
	pub fn new(lookback: usize) -> ChainResult<Self> {
		if lookback == 0 {
			return Err(ChainError::InvalidLookback(lookback));
		}
		Ok(Self { lookback, max_length: DEFAULT_MAX_LENGTH, tables: HashMap::new() })
	}

	/// Sets the maximum length of generated words.
	///
	/// # Errors
	/// Returns [`ChainError::InvalidMaxLength`] if `max_length` is 0.
	pub fn with_max_length(mut self, max_length: usize) -> ChainResult<Self> {
		if max_length == 0 {
			return Err(ChainError::InvalidMaxLength(max_length));
		}
		self.max_length = max_length;
		Ok(self)
	}

	pub fn lookback(&self) -> usize {
		self.lookback
	}

	pub fn max_length(&self) -> usize {
		self.max_length
	}

	/// Number of distinct contexts with recorded transitions.
	pub fn len(&self) -> usize {
		self.tables.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tables.is_empty()
	}

	/// Returns the table recorded for `key`, if any.
	pub fn table(&self, key: &ContextKey) -> Option<&TransitionTable> {
		self.tables.get(key)
	}

	/// Iterates over every trained context and its table, in no particular order.
	pub fn contexts(&self) -> impl ExactSizeIterator<Item = (&ContextKey, &TransitionTable)> {
		self.tables.iter()
	}

	fn record(&mut self, key: &ContextKey, symbol: Symbol) {
		match self.tables.get_mut(key) {
			Some(table) => table.record(symbol),
			None => {
				let mut table = TransitionTable::new();
				table.record(symbol);
				self.tables.insert(key.clone(), table);
			}
		}
	}

	/// Adds a word to the chain.
	///
	/// The word is lower-cased, then every character is recorded as a
	/// transition from the window preceding it. A final transition to the
	/// end sentinel closes the word, so an empty word records exactly
	/// `^…^ -> $`.
	pub fn add_word(&mut self, word: &str) {
		let mut key = ContextKey::start(self.lookback);
		for c in word.to_lowercase().chars() {
			self.record(&key, Symbol::Char(c));
			key.advance(c);
		}
		self.record(&key, Symbol::End);
	}

	/// Adds every word of `words`.
	pub fn add_words<I, S>(&mut self, words: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut added = 0usize;
		for word in words {
			self.add_word(word.as_ref());
			added += 1;
		}
		debug!("added {} words, chain now has {} contexts", added, self.len());
	}

	/// Trains a new chain from `words` using all available cores.
	///
	/// # Behavior
	/// - Splits the words into chunks (based on CPU cores * factor).
	/// - Trains one partial chain per chunk on its own thread.
	/// - Merges the partial chains in chunk order.
	///
	/// The result holds exactly the counts sequential training would give,
	/// with every table's entries in the same first-seen order.
	///
	/// # Errors
	/// Returns [`ChainError::InvalidLookback`] if `lookback` is 0.
	pub fn train_parallel<S>(lookback: usize, words: &[S]) -> ChainResult<Self>
	where
		S: AsRef<str> + Sync,
	{
		let mut final_chain = Self::new(lookback)?;
		if words.is_empty() {
			return Ok(final_chain);
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = words.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| -> ChainResult<()> {
			for (index, chunk) in words.chunks(chunk_size).enumerate() {
				let tx = tx.clone();
				let mut partial_chain = final_chain.empty_like();
				scope.spawn(move || {
					for word in chunk {
						partial_chain.add_word(word.as_ref());
					}
					// The receiver outlives every sender
					let _ = tx.send((index, partial_chain));
				});
			}
			drop(tx);

			// Chunks finish in any order, merging must not
			let mut slots: Vec<Option<Chain>> = (0..words.len().div_ceil(chunk_size)).map(|_| None).collect();
			for (index, partial_chain) in rx.iter() {
				slots[index] = Some(partial_chain);
			}
			for partial_chain in slots.iter().flatten() {
				final_chain.merge(partial_chain)?;
			}
			Ok(())
		})?;

		debug!(
			"trained {} words on {} threads into {} contexts",
			words.len(),
			words.len().div_ceil(chunk_size),
			final_chain.len()
		);
		Ok(final_chain)
	}

	fn empty_like(&self) -> Self {
		Self { lookback: self.lookback, max_length: self.max_length, tables: HashMap::new() }
	}

	/// Generates a word using the calling thread's random generator.
	///
	/// See [`Chain::make_word_with`].
	pub fn make_word(&self) -> ChainResult<String> {
		self.make_word_with(&mut rand::rng())
	}

	/// Generates a word, drawing every choice from `rng`.
	///
	/// Starts from the all-start key and samples one symbol at a time until
	/// the end sentinel is drawn.
	///
	/// # Errors
	/// - [`ChainError::UntrainedContext`] if a context has no transitions,
	///   which is always the case before any training.
	/// - [`ChainError::WordTooLong`] if the word would grow past
	///   `max_length` characters. The truncated word is returned in the error.
	/// - [`ChainError::InvalidTransition`] if a table yields the start sentinel.
	pub fn make_word_with<R: Rng + ?Sized>(&self, rng: &mut R) -> ChainResult<String> {
		let mut key = ContextKey::start(self.lookback);
		let mut word = String::new();
		let mut length = 0usize;

		loop {
			let symbol = self
				.tables
				.get(&key)
				.and_then(|table| table.choose(rng))
				.ok_or_else(|| ChainError::UntrainedContext { context: key.to_string() })?;

			match symbol {
				Symbol::End => return Ok(word),
				Symbol::Char(c) => {
					if length == self.max_length {
						warn!("generation stopped after {} characters without reaching a word end", length);
						return Err(ChainError::WordTooLong { limit: self.max_length, partial: word });
					}
					word.push(c);
					length += 1;
					key.advance(c);
				}
				Symbol::Start => return Err(ChainError::InvalidTransition { context: key.to_string() }),
			}
		}
	}

	/// Merges another chain into this one.
	///
	/// Occurrence counts for matching contexts and symbols are summed;
	/// missing contexts are cloned. The generation bound of `self` is kept.
	///
	/// # Errors
	/// Returns [`ChainError::LookbackMismatch`] if the window sizes differ.
	pub fn merge(&mut self, other: &Self) -> ChainResult<()> {
		if self.lookback != other.lookback {
			return Err(ChainError::LookbackMismatch { expected: self.lookback, found: other.lookback });
		}

		for (key, table) in &other.tables {
			if let Some(existing) = self.tables.get_mut(key) {
				existing.merge(table);
			} else {
				self.tables.insert(key.clone(), table.clone());
			}
		}

		Ok(())
	}
}
