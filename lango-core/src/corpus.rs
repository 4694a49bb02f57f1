use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use log::debug;
use thiserror::Error;

/// Result type alias for corpus operations.
pub type CorpusResult<T> = Result<T, CorpusError>;

/// Errors raised while locating or reading corpus files.
#[derive(Debug, Error)]
pub enum CorpusError {
	#[error("failed to read corpus {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("path has no file name: {}", .0.display())]
	NoFileName(PathBuf),

	#[error("expected a directory, got: {}", .0.display())]
	NotADirectory(PathBuf),
}

/// Strips every non-alphabetic character from `raw`.
///
/// Letters from any script are kept, so accented and non-Latin words survive.
pub fn normalize_word(raw: &str) -> String {
	raw.chars().filter(|c| c.is_alphabetic()).collect()
}

/// Splits a text into normalized words.
///
/// Tokens are separated by whitespace. Tokens that hold no letter at all
/// (numbers, lone punctuation) are dropped.
pub fn split_words(text: &str) -> Vec<String> {
	text.split_whitespace()
		.map(normalize_word)
		.filter(|word| !word.is_empty())
		.collect()
}

/// Reads a corpus file and returns its normalized words.
///
/// - Reads the entire file into memory
/// - Splits and normalizes with [`split_words`]
pub fn read_corpus<P: AsRef<Path>>(path: P) -> CorpusResult<Vec<String>> {
	let path = path.as_ref();
	let contents = fs::read_to_string(path).map_err(|source| CorpusError::Io { path: path.to_owned(), source })?;
	let words = split_words(&contents);
	debug!("read {} words from {}", words.len(), path.display());
	Ok(words)
}

/// Reads several corpora in parallel, one thread per file.
///
/// The words are concatenated in the order of `paths`, whichever file
/// finishes first.
///
/// # Errors
/// Returns the error of the first failing path, in argument order.
pub fn read_corpora<P: AsRef<Path> + Sync>(paths: &[P]) -> CorpusResult<Vec<String>> {
	let (tx, rx) = mpsc::channel();
	thread::scope(|scope| {
		for (index, path) in paths.iter().enumerate() {
			let tx = tx.clone();
			scope.spawn(move || {
				// The receiver outlives every sender
				let _ = tx.send((index, read_corpus(path)));
			});
		}
	});
	drop(tx);

	let mut slots: Vec<Option<CorpusResult<Vec<String>>>> = paths.iter().map(|_| None).collect();
	for (index, result) in rx.iter() {
		slots[index] = Some(result);
	}

	let mut words = Vec::new();
	for slot in slots.into_iter().flatten() {
		words.extend(slot?);
	}
	Ok(words)
}

/// Extracts the corpus name (base file name without extension).
///
/// Examples:
/// - `"./data/french.txt"` → `"french"`
/// - `"french.txt"` → `"french"`
pub fn corpus_name<P: AsRef<Path>>(path: P) -> CorpusResult<String> {
	let path = path.as_ref();
	let stem = path.file_stem().ok_or_else(|| CorpusError::NoFileName(path.to_owned()))?;
	Ok(stem.to_string_lossy().to_string())
}

/// Lists the corpora with a given extension in a directory.
///
/// Returns sorted corpus names (no paths, no extension). Subdirectories
/// are ignored.
pub fn list_corpora<P: AsRef<Path>>(dir: P, extension: &str) -> CorpusResult<Vec<String>> {
	let dir = dir.as_ref();
	if !dir.is_dir() {
		return Err(CorpusError::NotADirectory(dir.to_owned()));
	}

	let io_error = |source| CorpusError::Io { path: dir.to_owned(), source };
	let mut names = Vec::new();
	for entry in fs::read_dir(dir).map_err(io_error)? {
		let path = entry.map_err(io_error)?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			names.push(corpus_name(&path)?);
		}
	}

	names.sort();
	Ok(names)
}
