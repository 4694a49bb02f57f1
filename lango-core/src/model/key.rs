use std::fmt;

/// A single element of the chain's alphabet.
///
/// Real characters are wrapped in `Char`. The two sentinels are separate
/// variants, so no corpus character can ever be mistaken for one of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
	/// Padding used before the first real character of a word.
	Start,
	/// A character observed in the corpus.
	Char(char),
	/// Word boundary. Trained and sampled like any other symbol.
	End,
}

impl Symbol {
	/// Printable form of the start sentinel.
	pub const START_CHAR: char = '^';
	/// Printable form of the end sentinel.
	pub const END_CHAR: char = '$';

	/// Returns the printable form of this symbol.
	pub fn as_char(self) -> char {
		match self {
			Symbol::Start => Self::START_CHAR,
			Symbol::Char(c) => c,
			Symbol::End => Self::END_CHAR,
		}
	}
}

impl From<char> for Symbol {
	fn from(c: char) -> Self {
		Symbol::Char(c)
	}
}

impl fmt::Display for Symbol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_char())
	}
}

/// The lookback window: the last `lookback` symbols seen.
///
/// A fresh key is filled with [`Symbol::Start`]. Each accepted character
/// slides the window by one, dropping the oldest symbol.
///
/// ## Invariants
/// - The length never changes after construction
/// - `Symbol::End` never appears in a key
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContextKey {
	symbols: Box<[Symbol]>,
}

impl ContextKey {
	/// Creates the initial key of `lookback` start sentinels.
	pub fn start(lookback: usize) -> Self {
		Self { symbols: vec![Symbol::Start; lookback].into_boxed_slice() }
	}

	/// Slides the window: appends `c` and drops the oldest symbol.
	pub fn advance(&mut self, c: char) {
		if let Some(last) = self.symbols.len().checked_sub(1) {
			self.symbols.rotate_left(1);
			self.symbols[last] = Symbol::Char(c);
		}
	}

	/// Returns a copy of this key advanced by `c`.
	pub fn advanced(&self, c: char) -> Self {
		let mut next = self.clone();
		next.advance(c);
		next
	}

	pub fn len(&self) -> usize {
		self.symbols.len()
	}

	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}

	pub fn symbols(&self) -> &[Symbol] {
		&self.symbols
	}
}

impl fmt::Display for ContextKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for symbol in self.symbols.iter() {
			write!(f, "{symbol}")?;
		}
		Ok(())
	}
}
