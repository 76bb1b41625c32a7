//! Error types shared by the automaton and the input reader.

use thiserror::Error;

/// Errors raised while reading input, configuring or persisting an automaton.
///
/// Prompt-level outcomes (`Unmatched`, `Exhausted`) and early-stopping
/// compression are not errors; see `PromptOutcome` and `CompressionOutcome`.
#[derive(Debug, Error)]
pub enum AutomatonError {
	/// A byte outside the 7-bit character range.
	#[error("Invalid character {byte:#04x} in input")]
	InvalidCharacter { byte: u8 },

	/// The input ended before the final stage was reached.
	#[error("Unexpected end of input during stage {stage}")]
	UnexpectedEndOfInput { stage: usize },

	#[error("Invalid prediction configuration: {0}")]
	InvalidConfig(String),

	/// Statements cannot be added once the automaton has been compressed.
	#[error("Automaton is already compressed")]
	AlreadyCompressed,

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("Snapshot error: {0}")]
	Snapshot(#[from] postcard::Error),
}

impl AutomatonError {
	/// True for errors caused by a badly formed input stream.
	pub fn is_malformed_input(&self) -> bool {
		matches!(self, Self::InvalidCharacter { .. } | Self::UnexpectedEndOfInput { .. })
	}
}

/// A specialized `Result` type for automaton operations.
pub type Result<T> = std::result::Result<T, AutomatonError>;
