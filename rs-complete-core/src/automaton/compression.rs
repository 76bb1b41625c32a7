use log::{debug, info, warn};

use super::model::Automaton;
use super::node::NodeId;

/// How a compression request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionOutcome {
	/// Every requested merge was performed.
	Completed { performed: usize },
	/// The automaton ran out of merge sites first.
	Exhausted { performed: usize },
}

impl CompressionOutcome {
	pub fn performed(&self) -> usize {
		match *self {
			Self::Completed { performed } | Self::Exhausted { performed } => performed,
		}
	}

	pub fn is_exhausted(&self) -> bool {
		matches!(self, Self::Exhausted { .. })
	}
}

impl Automaton {
	/// Performs up to `count` merges and seals the automaton.
	///
	/// A merge site is a node whose only child has no siblings but has
	/// children of its own. That child is removed, its label becomes a prefix
	/// of each of its children, and its frequency leaves the total.
	///
	/// Sites are searched depth first from the root, children left to right.
	/// A node whose whole subtree was searched without finding a site is
	/// marked visited and never entered again during this call, and every
	/// step restarts from the root. The search therefore ends after at most
	/// one step per live node and depth level.
	pub fn compress(&mut self, count: usize) -> CompressionOutcome {
		self.compressed = true;
		self.cursor = NodeId::ROOT;
		self.statement_len = 0;
		self.diverged = false;

		let mut visited = vec![false; self.nodes.capacity()];
		let mut performed = 0;
		while performed < count {
			let Some(site) = self.next_merge_site(&mut visited) else {
				warn!("Compression exhausted after {performed} of {count} merges");
				return CompressionOutcome::Exhausted { performed };
			};
			self.merge_below(site);
			performed += 1;
		}

		info!(
			"Compressed {performed} times: {} states, total frequency {}",
			self.totals.states, self.totals.frequency
		);
		CompressionOutcome::Completed { performed }
	}

	/// True when the only child of `id` can be merged into its own children.
	pub fn is_merge_site(&self, id: NodeId) -> bool {
		let Some(child) = self.nodes[id].first_child() else {
			return false;
		};
		let child = &self.nodes[child];
		child.left().is_none() && child.right().is_none() && !child.is_leaf()
	}

	fn next_merge_site(&self, visited: &mut [bool]) -> Option<NodeId> {
		let mut current = NodeId::ROOT;
		loop {
			if self.is_merge_site(current) {
				return Some(current);
			}
			let unvisited = self.nodes.children(current).find(|child| !visited[child.index()]);
			match unvisited {
				Some(child) => current = child,
				None => {
					visited[current.index()] = true;
					if current == NodeId::ROOT {
						return None;
					}
					current = NodeId::ROOT;
				}
			}
		}
	}

	fn merge_below(&mut self, parent: NodeId) {
		let Some(victim) = self.nodes[parent].first_child() else {
			unreachable!("merge site without a child");
		};
		let frequency = self.nodes[victim].frequency();
		let replacement = self.nodes.detach_and_merge(victim);

		self.totals.states -= 1;
		self.totals.frequency -= frequency;
		debug!(
			"Merged node {} (frequency {frequency}) into {:?}",
			victim.index(),
			self.nodes[replacement].label()
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn only_child(automaton: &Automaton, id: NodeId) -> NodeId {
		let children: Vec<_> = automaton.children(id).collect();
		assert_eq!(children.len(), 1);
		children[0]
	}

	#[test]
	fn single_chain_collapses_into_one_node() {
		let mut automaton = Automaton::from_statements(["abc"]).unwrap();
		assert_eq!(automaton.state_count(), 4);
		assert_eq!(automaton.total_frequency(), 3);

		assert_eq!(automaton.compress(1), CompressionOutcome::Completed { performed: 1 });
		let ab = only_child(&automaton, automaton.root());
		assert_eq!(automaton.node(ab).unwrap().label(), "ab");
		assert_eq!(automaton.state_count(), 3);
		assert_eq!(automaton.total_frequency(), 2);

		let mut again = Automaton::from_statements(["abc"]).unwrap();
		assert_eq!(again.compress(2), CompressionOutcome::Completed { performed: 2 });
		let abc = only_child(&again, again.root());
		let node = again.node(abc).unwrap();
		assert_eq!(node.label(), "abc");
		assert_eq!(node.frequency(), 0);
		assert!(node.is_leaf());
		assert_eq!(again.state_count(), 2);
		assert_eq!(again.total_frequency(), 1);
	}

	#[test]
	fn merge_prefixes_every_sibling() {
		let mut automaton = Automaton::from_statements(["abx", "acy", "acz"]).unwrap();
		assert_eq!(automaton.compress(1).performed(), 1);

		let labels: Vec<_> = automaton
			.children(automaton.root())
			.map(|id| automaton.node(id).unwrap().label().to_owned())
			.collect();
		assert_eq!(labels, ["ab", "ac"]);
		// `a` was traversed three times
		assert_eq!(automaton.total_frequency(), 9 - 3);
		assert_eq!(automaton.state_count(), 6);
	}

	#[test]
	fn exhausted_compression_stops_early() {
		let mut automaton = Automaton::from_statements(["abx", "acy", "acz"]).unwrap();
		let outcome = automaton.compress(5);
		assert_eq!(outcome, CompressionOutcome::Exhausted { performed: 1 });
		assert!(outcome.is_exhausted());

		let states = automaton.state_count();
		assert_eq!(automaton.compress(3), CompressionOutcome::Exhausted { performed: 0 });
		assert_eq!(automaton.state_count(), states);
	}

	#[test]
	fn zero_compressions_leave_structure_alone() {
		let mut automaton = Automaton::from_statements(["abc", "abd"]).unwrap();
		let totals = automaton.totals();
		assert_eq!(automaton.compress(0), CompressionOutcome::Completed { performed: 0 });
		assert_eq!(automaton.totals(), totals);
	}

	#[test]
	fn deeper_sites_are_found_after_branches() {
		// root -> {a, b}; a -> x -> y -> z is a chain below a branch
		let mut automaton = Automaton::from_statements(["axyz", "b"]).unwrap();
		assert!(!automaton.is_merge_site(automaton.root()));

		assert_eq!(automaton.compress(usize::MAX), CompressionOutcome::Exhausted { performed: 2 });
		let labels: Vec<_> = automaton
			.children(automaton.root())
			.map(|id| automaton.node(id).unwrap().label().to_owned())
			.collect();
		assert_eq!(labels, ["a", "b"]);
		let a = automaton.children(automaton.root()).next().unwrap();
		let tail = only_child(&automaton, a);
		assert_eq!(automaton.node(tail).unwrap().label(), "xyz");
	}

	#[test]
	fn leaf_parent_is_not_a_site() {
		let automaton = Automaton::from_statements(["ab"]).unwrap();
		let a = only_child(&automaton, automaton.root());
		assert!(automaton.is_merge_site(automaton.root()));
		assert!(!automaton.is_merge_site(a));
	}
}
