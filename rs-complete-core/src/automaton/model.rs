use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::node::{Chain, Node, NodeArena, NodeId};
use crate::error::Result;
use crate::io::{build_output_path, read_file};

/// Running counters reported by the automaton.
///
/// `statements` and `characters` are diagnostics only; prediction never
/// reads them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
	/// Live nodes, root included.
	pub states: usize,
	/// Sum of every recorded traversal.
	pub frequency: usize,
	pub statements: usize,
	pub characters: usize,
}

/// Frequency-weighted character automaton.
///
/// The automaton goes through three phases:
/// - construction, one statement at a time (see `construction`)
/// - compression, merging single-child chains (see `compression`)
/// - prediction, read-only greedy completion of prompts (see `prediction`)
///
/// Once compressed, the automaton no longer accepts statements.
///
/// ## Invariants
/// - `totals.states == nodes.len()`
/// - `totals.frequency` equals the sum of the frequencies of all live nodes
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Automaton {
	pub(crate) nodes: NodeArena,
	pub(crate) totals: Totals,
	/// Construction cursor, the node the next character descends from.
	pub(crate) cursor: NodeId,
	/// Characters pushed since the last statement boundary.
	pub(crate) statement_len: usize,
	/// The current statement has created at least one node.
	pub(crate) diverged: bool,
	pub(crate) compressed: bool,
}

impl Automaton {
	/// Creates an automaton holding only its root.
	pub fn new() -> Self {
		Self {
			nodes: NodeArena::new(),
			totals: Totals { states: 1, ..Totals::default() },
			cursor: NodeId::ROOT,
			statement_len: 0,
			diverged: false,
			compressed: false,
		}
	}

	/// Loads an automaton from a corpus file holding one statement per line.
	///
	/// A compiled copy is cached next to the corpus with the `bin` extension.
	/// When that file exists it is loaded instead of re-reading the corpus.
	pub fn from_corpus<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		let binary_data_path = build_output_path(&filepath, "bin")?;
		if binary_data_path.exists() {
			return Self::load(binary_data_path);
		}

		let automaton = Self::from_statements(read_file(&filepath)?)?;
		automaton.save(&binary_data_path)?;
		info!(
			"Compiled {} statements into {} states ({})",
			automaton.totals.statements,
			automaton.totals.states,
			binary_data_path.display()
		);
		Ok(automaton)
	}

	/// Writes a `postcard` snapshot of the automaton.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(path, bytes)?;
		Ok(())
	}

	/// Reads a snapshot written by [`Automaton::save`].
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = std::fs::read(path)?;
		Ok(postcard::from_bytes(&bytes)?)
	}

	pub fn totals(&self) -> Totals {
		self.totals
	}

	pub fn state_count(&self) -> usize {
		self.totals.states
	}

	pub fn total_frequency(&self) -> usize {
		self.totals.frequency
	}

	pub fn statement_count(&self) -> usize {
		self.totals.statements
	}

	pub fn character_count(&self) -> usize {
		self.totals.characters
	}

	pub fn is_compressed(&self) -> bool {
		self.compressed
	}

	pub fn root(&self) -> NodeId {
		NodeId::ROOT
	}

	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id)
	}

	/// Children of `id`, left to right.
	pub fn children(&self, id: NodeId) -> Chain<'_> {
		self.nodes.children(id)
	}

	/// Every live node, root included.
	pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
		self.nodes.iter()
	}

	/// Concatenated labels from the root down to `id`.
	pub fn path(&self, id: NodeId) -> Option<String> {
		let mut labels = Vec::new();
		let mut current = Some(id);
		while let Some(node_id) = current {
			let node = self.nodes.get(node_id)?;
			labels.push(node.label());
			current = node.parent();
		}
		Some(labels.into_iter().rev().collect())
	}
}

impl Default for Automaton {
	fn default() -> Self {
		Self::new()
	}
}
