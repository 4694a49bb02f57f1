use rand::Rng;

use super::key::Symbol;

/// Frequency distribution of the symbols observed after one context key.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during learning
/// - Choose the next symbol using weighted random sampling
/// - Merge with the table of the same key from another chain
///
/// ## Invariants
/// - Entries are kept in first-seen order, so a seeded generator always
///   picks the same symbol
/// - Each entry count is strictly positive
/// - `total` is the sum of all entry counts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionTable {
	/// Outgoing transitions with their occurrence count.
	/// Example: [('e', 42), ('a', 3), ('$', 7)]
	entries: Vec<(Symbol, usize)>,
	total: usize,
}

impl TransitionTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of a transition toward `symbol`.
	///
	/// - If the transition already exists, its occurrence count is increased.
	/// - Otherwise, a new entry is appended with an initial count of 1.
	pub fn record(&mut self, symbol: Symbol) {
		self.add(symbol, 1);
	}

	fn add(&mut self, symbol: Symbol, occurrences: usize) {
		match self.entries.iter_mut().find(|(s, _)| *s == symbol) {
			Some((_, count)) => *count += occurrences,
			None => self.entries.push((symbol, occurrences)),
		}
		self.total += occurrences;
	}

	/// Sum of all recorded counts. Zero for an empty table.
	pub fn total_count(&self) -> usize {
		self.total
	}

	/// Count recorded for `symbol`, or zero if it was never seen.
	pub fn count(&self, symbol: Symbol) -> usize {
		self.entries
			.iter()
			.find(|(s, _)| *s == symbol)
			.map_or(0, |(_, count)| *count)
	}

	pub fn entries(&self) -> impl ExactSizeIterator<Item = (Symbol, usize)> + '_ {
		self.entries.iter().copied()
	}

	pub fn is_empty(&self) -> bool {
		self.total == 0
	}

	/// Chooses the next symbol using weighted random sampling.
	///
	/// A symbol with count `c` out of a total `T` is chosen with
	/// probability `c / T`. A draw `r` in `[0, T)` selects the first entry
	/// whose cumulative count exceeds `r`.
	///
	/// Returns `None` if the table has no transitions.
	pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Symbol> {
		if self.total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..self.total);
		for (symbol, count) in &self.entries {
			if r < *count {
				return Some(*symbol);
			}
			r -= count;
		}

		// `total` always matches the entries, so the walk returns above
		None
	}

	/// Merges another table into this one, summing occurrence counts.
	pub fn merge(&mut self, other: &Self) {
		for (symbol, count) in &other.entries {
			self.add(*symbol, *count);
		}
	}
}
