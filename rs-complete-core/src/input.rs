use std::io::{BufRead, Bytes, Read};

use crate::error::{AutomatonError, Result};

/// Unit reported by [`InputReader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
	/// A 7-bit character of a statement or prompt.
	Char(u8),
	/// End of the current statement or prompt (`\n`).
	StatementEnd,
	/// End of the current stage (a `\n` right after another `\n`).
	StageEnd,
	/// End of input, only reported during the final stage.
	Eof,
}

/// Line-oriented tokenizer for staged input.
///
/// The input is a sequence of stages separated by blank lines. Each stage is
/// a sequence of lines: training statements, a compression count or prompts.
///
/// ## Rules
/// - `\r` is skipped everywhere
/// - a `\n` ends a line, a `\n` following a `\n` ends a stage
/// - bytes outside the 7-bit range are rejected
/// - the input may only end during the final stage
pub struct InputReader<R> {
	bytes: Bytes<R>,
	stage: usize,
	final_stage: usize,
	previous_newline: bool,
}

impl<R: BufRead> InputReader<R> {
	/// Wraps `reader`; end of input is accepted from stage `final_stage` on.
	pub fn new(reader: R, final_stage: usize) -> Self {
		Self {
			bytes: reader.bytes(),
			stage: 0,
			final_stage,
			previous_newline: false,
		}
	}

	/// Index of the stage being read, starting at 0.
	pub fn stage(&self) -> usize {
		self.stage
	}

	/// Reads the next token.
	///
	/// # Errors
	/// - `InvalidCharacter` for a byte outside the 7-bit range
	/// - `UnexpectedEndOfInput` when the input ends before the final stage
	/// - `Io` when the underlying reader fails
	pub fn next_token(&mut self) -> Result<Token> {
		let byte = loop {
			match self.bytes.next().transpose()? {
				Some(b'\r') => continue,
				other => break other,
			}
		};

		match byte {
			Some(b'\n') if self.previous_newline => {
				self.stage += 1;
				Ok(Token::StageEnd)
			}
			Some(b'\n') => {
				self.previous_newline = true;
				Ok(Token::StatementEnd)
			}
			Some(byte) if !byte.is_ascii() => Err(AutomatonError::InvalidCharacter { byte }),
			Some(byte) => {
				self.previous_newline = false;
				Ok(Token::Char(byte))
			}
			None if self.stage >= self.final_stage => Ok(Token::Eof),
			None => Err(AutomatonError::UnexpectedEndOfInput { stage: self.stage }),
		}
	}

	/// Reads the next line of the current stage.
	///
	/// Returns `None` at the end of the stage, or at the end of input. A last
	/// line without a trailing `\n` is still returned.
	pub fn next_line(&mut self) -> Result<Option<String>> {
		let mut line = String::new();
		loop {
			match self.next_token()? {
				Token::Char(byte) => line.push(char::from(byte)),
				Token::StatementEnd => return Ok(Some(line)),
				Token::StageEnd => return Ok(None),
				Token::Eof if line.is_empty() => return Ok(None),
				Token::Eof => return Ok(Some(line)),
			}
		}
	}

	/// Reads a line holding the number of compressions to perform.
	///
	/// Only the leading digits count, after optional blanks and sign. A line
	/// without digits, a negative count or a missing line all mean zero; an
	/// oversized count saturates.
	pub fn read_count(&mut self) -> Result<usize> {
		Ok(self.next_line()?.as_deref().map_or(0, parse_count))
	}
}

fn parse_count(line: &str) -> usize {
	let line = line.trim_start();
	let (negative, digits) = match line.as_bytes().first() {
		Some(b'-') => (true, &line[1..]),
		Some(b'+') => (false, &line[1..]),
		_ => (false, line),
	};
	let count = digits
		.bytes()
		.take_while(u8::is_ascii_digit)
		.fold(0usize, |count, digit| count.saturating_mul(10).saturating_add(usize::from(digit - b'0')));
	if negative { 0 } else { count }
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	fn reader(input: &str, final_stage: usize) -> InputReader<Cursor<Vec<u8>>> {
		InputReader::new(Cursor::new(input.as_bytes().to_vec()), final_stage)
	}

	#[test]
	fn tokens_follow_line_and_stage_rules() {
		let mut input = reader("a\r\nb\n\nc", 1);
		assert_eq!(input.next_token().unwrap(), Token::Char(b'a'));
		assert_eq!(input.next_token().unwrap(), Token::StatementEnd);
		assert_eq!(input.next_token().unwrap(), Token::Char(b'b'));
		assert_eq!(input.next_token().unwrap(), Token::StatementEnd);
		assert_eq!(input.next_token().unwrap(), Token::StageEnd);
		assert_eq!(input.stage(), 1);
		assert_eq!(input.next_token().unwrap(), Token::Char(b'c'));
		assert_eq!(input.next_token().unwrap(), Token::Eof);
	}

	#[test]
	fn lines_are_grouped_by_stage() {
		let mut input = reader("one\ntwo\n\nthree\nfour", 1);
		assert_eq!(input.next_line().unwrap().as_deref(), Some("one"));
		assert_eq!(input.next_line().unwrap().as_deref(), Some("two"));
		assert_eq!(input.next_line().unwrap(), None);
		assert_eq!(input.next_line().unwrap().as_deref(), Some("three"));
		assert_eq!(input.next_line().unwrap().as_deref(), Some("four"));
		assert_eq!(input.next_line().unwrap(), None);
	}

	#[test]
	fn trailing_newline_does_not_add_a_line() {
		let mut input = reader("last\n", 0);
		assert_eq!(input.next_line().unwrap().as_deref(), Some("last"));
		assert_eq!(input.next_line().unwrap(), None);
	}

	#[test]
	fn early_end_of_input_is_malformed() {
		let mut input = reader("abc", 2);
		let err = input.next_line().unwrap_err();
		assert!(matches!(err, AutomatonError::UnexpectedEndOfInput { stage: 0 }));
		assert!(err.is_malformed_input());
	}

	#[test]
	fn high_bytes_are_rejected() {
		let mut input = InputReader::new(Cursor::new(vec![b'a', 0xFF]), 0);
		assert_eq!(input.next_token().unwrap(), Token::Char(b'a'));
		assert!(matches!(input.next_token(), Err(AutomatonError::InvalidCharacter { byte: 0xFF })));
	}

	#[test]
	fn count_line_is_parsed() {
		assert_eq!(reader("12\nabc", 0).read_count().unwrap(), 12);
		assert_eq!(reader("  7 merges\n", 0).read_count().unwrap(), 7);
		assert_eq!(reader("+3\n", 0).read_count().unwrap(), 3);
	}

	#[test]
	fn unreadable_count_means_zero() {
		assert_eq!(reader("twelve\n", 0).read_count().unwrap(), 0);
		assert_eq!(reader("-4\n", 0).read_count().unwrap(), 0);
		assert_eq!(reader("\n", 0).read_count().unwrap(), 0);
		assert_eq!(reader("", 0).read_count().unwrap(), 0);
		assert_eq!(reader("99999999999999999999999999\n", 0).read_count().unwrap(), usize::MAX);
	}
}
