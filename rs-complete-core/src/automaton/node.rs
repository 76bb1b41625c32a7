use std::cmp::Ordering;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Stable handle to a node stored in a [`NodeArena`].
///
/// Handles stay valid until the node is released by a compression merge;
/// released slots are never handed back to a live reference.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
	/// The empty-label root present in every arena.
	pub const ROOT: NodeId = NodeId(0);

	/// Position of the node inside the arena.
	pub fn index(self) -> usize {
		self.0
	}
}

/// Horizontal direction along a sibling chain.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
	Left,
	Right,
}

/// One labelled edge segment of the automaton.
///
/// ## Invariants
/// - `label` is non-empty ASCII, except for the root whose label is empty
/// - siblings reachable through `left` / `right` share the same `parent`
/// - `first_child` is one member of the child chain, not necessarily the leftmost
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Node {
	label: String,
	/// How many times a cursor moved below this node.
	frequency: usize,
	parent: Option<NodeId>,
	first_child: Option<NodeId>,
	left: Option<NodeId>,
	right: Option<NodeId>,
}

impl Node {
	fn new(label: String) -> Self {
		Self {
			label,
			frequency: 0,
			parent: None,
			first_child: None,
			left: None,
			right: None,
		}
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn frequency(&self) -> usize {
		self.frequency
	}

	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	/// Entry point of the child chain.
	pub fn first_child(&self) -> Option<NodeId> {
		self.first_child
	}

	pub fn left(&self) -> Option<NodeId> {
		self.left
	}

	pub fn right(&self) -> Option<NodeId> {
		self.right
	}

	pub fn is_leaf(&self) -> bool {
		self.first_child.is_none()
	}

	pub(crate) fn increment_frequency(&mut self) {
		self.frequency += 1;
	}

	fn neighbour(&self, side: Side) -> Option<NodeId> {
		match side {
			Side::Left => self.left,
			Side::Right => self.right,
		}
	}
}

/// Result of a sibling chain lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChainSearch {
	/// A sibling whose label matches the key.
	Found(NodeId),
	/// No match: a node carrying the key belongs on `side` of `anchor`.
	Vacant { anchor: NodeId, side: Side },
}

/// Compares `key` with the label prefix of the same length.
///
/// Sibling labels are sorted, so their prefixes of any fixed length are sorted
/// too; this is what lets a lookup continue inside merged labels.
fn compare_prefix(key: &[u8], label: &str) -> Ordering {
	let label = label.as_bytes();
	let end = key.len().min(label.len());
	key.cmp(&label[..end])
}

/// Arena owning every node of an automaton.
///
/// Structural links are stored as [`NodeId`]s. A merged node has its slot
/// cleared and its index parked in a free list.
///
/// ## Invariants
/// - slot 0 always holds the root
/// - walking any chain to the right yields strictly ascending labels
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NodeArena {
	slots: Vec<Option<Node>>,
	free: Vec<usize>,
	live: usize,
}

impl NodeArena {
	/// Creates an arena holding only the empty-label root.
	pub fn new() -> Self {
		Self {
			slots: vec![Some(Node::new(String::new()))],
			free: Vec::new(),
			live: 1,
		}
	}

	/// Number of live nodes, root included.
	pub fn len(&self) -> usize {
		self.live
	}

	pub fn is_empty(&self) -> bool {
		self.live == 0
	}

	/// Number of slots ever allocated (live or released).
	pub(crate) fn capacity(&self) -> usize {
		self.slots.len()
	}

	pub fn get(&self, id: NodeId) -> Option<&Node> {
		self.slots.get(id.0).and_then(Option::as_ref)
	}

	/// Iterates over every live node in slot order.
	pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
		self.slots
			.iter()
			.enumerate()
			.filter_map(|(index, slot)| slot.as_ref().map(|node| (NodeId(index), node)))
	}

	/// Allocates a detached single-character node.
	pub(crate) fn create_node(&mut self, c: u8) -> NodeId {
		self.alloc(char::from(c).to_string())
	}

	fn alloc(&mut self, label: String) -> NodeId {
		let node = Some(Node::new(label));
		self.live += 1;
		match self.free.pop() {
			Some(index) => {
				self.slots[index] = node;
				NodeId(index)
			}
			None => {
				self.slots.push(node);
				NodeId(self.slots.len() - 1)
			}
		}
	}

	fn release(&mut self, id: NodeId) -> Node {
		let Some(node) = self.slots.get_mut(id.0).and_then(Option::take) else {
			panic!("node {} released twice", id.0);
		};
		self.free.push(id.0);
		self.live -= 1;
		node
	}

	/// Makes `child` the only child of a childless `parent`.
	pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
		assert!(self[parent].is_leaf(), "append_child on a node that already has children");
		self[parent].first_child = Some(child);
		self[child].parent = Some(parent);
	}

	/// Splices `new` immediately on `side` of `existing`.
	pub(crate) fn insert_sibling(&mut self, existing: NodeId, new: NodeId, side: Side) {
		let parent = self[existing].parent;
		match side {
			Side::Left => {
				let before = self[existing].left;
				self[new].left = before;
				self[new].right = Some(existing);
				if let Some(before) = before {
					self[before].right = Some(new);
				}
				self[existing].left = Some(new);
			}
			Side::Right => {
				let after = self[existing].right;
				self[new].left = Some(existing);
				self[new].right = after;
				if let Some(after) = after {
					self[after].left = Some(new);
				}
				self[existing].right = Some(new);
			}
		}
		self[new].parent = parent;

		debug_assert!(self[new].left.is_none_or(|l| self[l].label < self[new].label));
		debug_assert!(self[new].right.is_none_or(|r| self[new].label < self[r].label));
	}

	/// Looks `key` up in the chain containing `start`.
	///
	/// The first comparison fixes the walking direction; the walk never turns
	/// back, so the lookup stops at the first match, at the first gap where
	/// the key would sit, or at the edge of the chain.
	pub(crate) fn search_chain(&self, start: NodeId, key: &[u8]) -> ChainSearch {
		let side = match compare_prefix(key, self[start].label()) {
			Ordering::Equal => return ChainSearch::Found(start),
			Ordering::Less => Side::Left,
			Ordering::Greater => Side::Right,
		};

		let mut current = start;
		while let Some(next) = self[current].neighbour(side) {
			match (compare_prefix(key, self[next].label()), side) {
				(Ordering::Equal, _) => return ChainSearch::Found(next),
				(Ordering::Greater, Side::Left) => {
					return ChainSearch::Vacant { anchor: next, side: Side::Right };
				}
				(Ordering::Less, Side::Right) => {
					return ChainSearch::Vacant { anchor: next, side: Side::Left };
				}
				_ => current = next,
			}
		}
		ChainSearch::Vacant { anchor: current, side }
	}

	/// Returns the child of `parent` whose label starts with `c`.
	pub fn match_child(&self, parent: NodeId, c: u8) -> Option<NodeId> {
		let first = self[parent].first_child?;
		match self.search_chain(first, &[c]) {
			ChainSearch::Found(id) => Some(id),
			ChainSearch::Vacant { .. } => None,
		}
	}

	/// Leftmost member of the chain containing `id`.
	pub fn leftmost(&self, mut id: NodeId) -> NodeId {
		while let Some(left) = self[id].left {
			id = left;
		}
		id
	}

	/// Iterates left to right over the chain containing `member`.
	pub fn chain(&self, member: NodeId) -> Chain<'_> {
		Chain { arena: self, next: Some(self.leftmost(member)) }
	}

	/// Iterates left to right over the children of `parent`.
	pub fn children(&self, parent: NodeId) -> Chain<'_> {
		Chain { arena: self, next: self[parent].first_child.map(|first| self.leftmost(first)) }
	}

	pub(crate) fn increment_frequency(&mut self, id: NodeId) {
		self[id].increment_frequency();
	}

	/// Removes `victim` and hands its label down to its children.
	///
	/// `victim` must be the only child of its parent and must have children.
	/// Every child gets the victim's label as a prefix and is re-parented to
	/// the victim's parent. Returns the new entry child of that parent.
	pub(crate) fn detach_and_merge(&mut self, victim: NodeId) -> NodeId {
		let node = &self[victim];
		assert!(node.left.is_none() && node.right.is_none(), "merge victim has siblings");
		let (Some(parent), Some(replacement)) = (node.parent, node.first_child) else {
			panic!("merge victim {} must have a parent and children", victim.0);
		};

		let children: Vec<NodeId> = self.chain(replacement).collect();
		let victim = self.release(victim);
		for child in children {
			let child = &mut self[child];
			child.label.insert_str(0, &victim.label);
			child.parent = Some(parent);
		}
		self[parent].first_child = Some(replacement);
		replacement
	}
}

impl Default for NodeArena {
	fn default() -> Self {
		Self::new()
	}
}

impl Index<NodeId> for NodeArena {
	type Output = Node;

	fn index(&self, id: NodeId) -> &Node {
		match self.get(id) {
			Some(node) => node,
			None => panic!("node {} is not live", id.0),
		}
	}
}

impl IndexMut<NodeId> for NodeArena {
	fn index_mut(&mut self, id: NodeId) -> &mut Node {
		match self.slots.get_mut(id.0).and_then(Option::as_mut) {
			Some(node) => node,
			None => panic!("node {} is not live", id.0),
		}
	}
}

/// Left-to-right iterator over a sibling chain.
pub struct Chain<'a> {
	arena: &'a NodeArena,
	next: Option<NodeId>,
}

impl Iterator for Chain<'_> {
	type Item = NodeId;

	fn next(&mut self) -> Option<NodeId> {
		let current = self.next?;
		self.next = self.arena[current].right;
		Some(current)
	}
}
