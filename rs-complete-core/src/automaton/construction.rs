use std::io::BufRead;

use log::info;

use super::model::Automaton;
use super::node::{ChainSearch, NodeId};
use crate::error::{AutomatonError, Result};
use crate::input::{InputReader, Token};

impl Automaton {
	/// Builds an automaton from a sequence of statements.
	///
	/// # Errors
	/// Returns `InvalidCharacter` if a statement holds a non 7-bit character.
	pub fn from_statements<I, S>(statements: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut automaton = Self::new();
		for statement in statements {
			automaton.insert_statement(statement.as_ref())?;
		}
		Ok(automaton)
	}

	/// Inserts one whole statement, then closes it.
	pub fn insert_statement(&mut self, statement: &str) -> Result<()> {
		for byte in statement.bytes() {
			self.push_char(byte)?;
		}
		self.end_statement()
	}

	/// Feeds every statement of the current input stage.
	///
	/// Stops at the stage boundary, or at the end of input when the reader
	/// allows it for this stage.
	pub fn read_stage<R: BufRead>(&mut self, input: &mut InputReader<R>) -> Result<()> {
		loop {
			match input.next_token()? {
				Token::Char(byte) => self.push_char(byte)?,
				Token::StatementEnd => self.end_statement()?,
				Token::StageEnd => break,
				Token::Eof => {
					if self.statement_len > 0 {
						self.end_statement()?;
					}
					break;
				}
			}
		}
		info!(
			"Built automaton: {} statements, {} characters, {} states",
			self.totals.statements, self.totals.characters, self.totals.states
		);
		Ok(())
	}

	/// Appends one character to the statement being built.
	///
	/// Leaving the cursor's node counts as one traversal of it, unless it is
	/// an existing leaf reached by matching: growing a new branch below a
	/// statement end leaves that node's count alone. The next node is either a
	/// new child (the cursor has no children yet, which is always the case
	/// once the statement has diverged from existing structure), an existing
	/// sibling with the same label, or a new node spliced into the chain at
	/// its ordered position.
	///
	/// # Errors
	/// - `InvalidCharacter` for bytes outside the 7-bit range
	/// - `AlreadyCompressed` once compression has run
	pub fn push_char(&mut self, byte: u8) -> Result<()> {
		if self.compressed {
			return Err(AutomatonError::AlreadyCompressed);
		}
		if !byte.is_ascii() {
			return Err(AutomatonError::InvalidCharacter { byte });
		}

		let cursor = self.cursor;
		let first_child = self.nodes[cursor].first_child();
		if cursor != NodeId::ROOT && (first_child.is_some() || self.diverged) {
			self.record_traversal(cursor);
		}

		self.cursor = match first_child {
			None => {
				let id = self.nodes.create_node(byte);
				self.nodes.append_child(cursor, id);
				self.totals.states += 1;
				self.diverged = true;
				id
			}
			Some(first) => match self.nodes.search_chain(first, &[byte]) {
				ChainSearch::Found(existing) => existing,
				ChainSearch::Vacant { anchor, side } => {
					let id = self.nodes.create_node(byte);
					self.nodes.insert_sibling(anchor, id, side);
					self.totals.states += 1;
					self.diverged = true;
					id
				}
			},
		};

		self.statement_len += 1;
		self.totals.characters += 1;
		Ok(())
	}

	/// Closes the current statement and moves the cursor back to the root.
	///
	/// A non-empty statement counts as one traversal of the root.
	pub fn end_statement(&mut self) -> Result<()> {
		if self.compressed {
			return Err(AutomatonError::AlreadyCompressed);
		}
		if self.statement_len > 0 {
			self.record_traversal(NodeId::ROOT);
		}
		self.cursor = NodeId::ROOT;
		self.statement_len = 0;
		self.diverged = false;
		self.totals.statements += 1;
		Ok(())
	}

	fn record_traversal(&mut self, id: NodeId) {
		self.nodes.increment_frequency(id);
		self.totals.frequency += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	fn child(automaton: &Automaton, parent: NodeId, label: &str) -> NodeId {
		automaton
			.children(parent)
			.find(|&id| automaton.node(id).map(|n| n.label()) == Some(label))
			.unwrap()
	}

	fn frequency(automaton: &Automaton, id: NodeId) -> usize {
		automaton.node(id).unwrap().frequency()
	}

	#[test]
	fn shared_prefix_is_reused() {
		let automaton = Automaton::from_statements(["ab", "ac"]).unwrap();
		let root = automaton.root();

		assert_eq!(automaton.children(root).count(), 1);
		let a = child(&automaton, root, "a");
		assert_eq!(frequency(&automaton, a), 2);

		let labels: Vec<_> = automaton.children(a).map(|id| automaton.node(id).unwrap().label()).collect();
		assert_eq!(labels, ["b", "c"]);

		assert_eq!(automaton.state_count(), 4);
		assert_eq!(automaton.statement_count(), 2);
		assert_eq!(automaton.character_count(), 4);
		// two traversals of `a` plus one root traversal per statement
		assert_eq!(automaton.total_frequency(), 4);
	}

	#[test]
	fn root_level_keeps_ascending_order() {
		let automaton = Automaton::from_statements(["m", "c", "x", "a", "p"]).unwrap();
		let labels: Vec<_> = automaton
			.children(automaton.root())
			.map(|id| automaton.node(id).unwrap().label().to_owned())
			.collect();
		assert_eq!(labels, ["a", "c", "m", "p", "x"]);
	}

	#[test]
	fn duplicate_statement_only_adds_frequency() {
		let once = Automaton::from_statements(["abc"]).unwrap();
		let twice = Automaton::from_statements(["abc", "abc"]).unwrap();

		assert_eq!(once.state_count(), twice.state_count());
		assert_eq!(twice.total_frequency(), once.total_frequency() + 3);

		let a = child(&twice, twice.root(), "a");
		let b = child(&twice, a, "b");
		let c = child(&twice, b, "c");
		assert_eq!(frequency(&twice, a), 2);
		assert_eq!(frequency(&twice, b), 2);
		assert_eq!(frequency(&twice, c), 0);
	}

	#[test]
	fn extending_below_a_leaf_keeps_its_count() {
		let automaton = Automaton::from_statements(["a", "ab"]).unwrap();
		let a = child(&automaton, automaton.root(), "a");
		assert_eq!(frequency(&automaton, a), 0);
		assert_eq!(automaton.state_count(), 3);
		assert_eq!(automaton.total_frequency(), 2);
	}

	#[test]
	fn leaf_extension_does_not_outrank_a_new_branch() {
		let automaton = Automaton::from_statements(["xb", "xbc", "xac"]).unwrap();
		let x = child(&automaton, automaton.root(), "x");
		let a = child(&automaton, x, "a");
		let b = child(&automaton, x, "b");

		assert_eq!(frequency(&automaton, x), 3);
		assert_eq!(frequency(&automaton, a), 1);
		assert_eq!(frequency(&automaton, b), 0);
		assert_eq!(automaton.total_frequency(), 7);

		let prediction = automaton.predict("x", &crate::PredictionConfig::default()).unwrap();
		assert_eq!(prediction.text, "x...ac");
	}

	#[test]
	fn empty_statement_only_counts_itself() {
		let mut automaton = Automaton::from_statements(["ab"]).unwrap();
		let before = automaton.totals();
		automaton.insert_statement("").unwrap();

		let after = automaton.totals();
		assert_eq!(after.statements, before.statements + 1);
		assert_eq!(after.frequency, before.frequency);
		assert_eq!(after.states, before.states);
	}

	#[test]
	fn rejects_non_ascii() {
		let mut automaton = Automaton::new();
		let err = automaton.push_char(0xC3).unwrap_err();
		assert!(matches!(err, AutomatonError::InvalidCharacter { byte: 0xC3 }));
		assert!(Automaton::from_statements(["café"]).is_err());
	}

	#[test]
	fn compressed_automaton_is_sealed() {
		let mut automaton = Automaton::from_statements(["abc"]).unwrap();
		automaton.compress(1);
		assert!(matches!(automaton.insert_statement("abd"), Err(AutomatonError::AlreadyCompressed)));
	}

	#[test]
	fn read_stage_stops_at_stage_boundary() {
		let mut input = InputReader::new(Cursor::new("ab\nac\n\nrest\n"), 2);
		let mut automaton = Automaton::new();
		automaton.read_stage(&mut input).unwrap();

		assert_eq!(automaton.statement_count(), 2);
		assert_eq!(automaton.character_count(), 4);
		assert_eq!(input.next_line().unwrap().as_deref(), Some("rest"));
	}
}
