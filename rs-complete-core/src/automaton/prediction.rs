use std::cmp::Ordering;
use std::thread;

use super::model::Automaton;
use super::node::{ChainSearch, Node, NodeId};
use super::prediction_config::PredictionConfig;
use crate::error::{AutomatonError, Result};

/// How the prompt part of a prediction ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptOutcome {
	/// The prompt was consumed and a completion was synthesized.
	Completed,
	/// A prompt character has no matching continuation.
	Unmatched,
	/// The prompt runs past a leaf.
	Exhausted,
}

/// Rendered answer to one prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prediction {
	/// Echoed prompt, marker and completion, clipped to the output width.
	pub text: String,
	pub outcome: PromptOutcome,
}

/// Orders candidate continuations: higher frequency first, then the greater
/// label. The best candidate compares as the maximum.
pub fn rank_continuations(a: &Node, b: &Node) -> Ordering {
	a.frequency().cmp(&b.frequency()).then_with(|| a.label().cmp(b.label()))
}

/// Position of a prediction inside the automaton.
///
/// `consumed` counts the label characters of `node` already matched.
#[derive(Clone, Copy, Debug)]
struct Cursor {
	node: NodeId,
	consumed: usize,
}

/// Width-bounded output line.
struct Output {
	text: String,
	len: usize,
	width: usize,
}

impl Output {
	fn new(width: usize) -> Self {
		Self { text: String::new(), len: 0, width }
	}

	fn is_full(&self) -> bool {
		self.len >= self.width
	}

	fn push(&mut self, c: char) {
		if !self.is_full() {
			self.text.push(c);
			self.len += 1;
		}
	}

	fn push_str(&mut self, s: &str) {
		s.chars().for_each(|c| self.push(c));
	}
}

impl Automaton {
	/// Completes `prompt` with the most frequent continuation.
	///
	/// Prompt characters are echoed and matched one by one. When one cannot
	/// be matched (`Unmatched`) or the prompt runs past a leaf (`Exhausted`),
	/// the marker is written and the prediction stops. Otherwise the marker
	/// is followed by the greedy completion: at each step the best child
	/// according to [`rank_continuations`] is appended, until a leaf or the
	/// output width is reached. Prompt characters beyond the width are
	/// ignored.
	///
	/// # Errors
	/// Returns `InvalidCharacter` if the prompt holds a non 7-bit character.
	pub fn predict(&self, prompt: &str, config: &PredictionConfig) -> Result<Prediction> {
		if let Some(byte) = prompt.bytes().find(|byte| !byte.is_ascii()) {
			return Err(AutomatonError::InvalidCharacter { byte });
		}

		let mut output = Output::new(config.output_width());
		let mut cursor = Cursor { node: NodeId::ROOT, consumed: 0 };
		for byte in prompt.bytes() {
			if output.is_full() {
				break;
			}
			output.push(char::from(byte));
			if let Err(outcome) = self.advance(&mut cursor, byte) {
				output.push_str(config.truncation_marker());
				return Ok(Prediction { text: output.text, outcome });
			}
		}

		output.push_str(config.truncation_marker());
		self.synthesize(cursor, &mut output);
		Ok(Prediction { text: output.text, outcome: PromptOutcome::Completed })
	}

	/// Predicts every prompt, spreading the work over the available cores.
	///
	/// Results keep the order of `prompts`.
	pub fn predict_batch<S>(&self, prompts: &[S], config: &PredictionConfig) -> Vec<Result<Prediction>>
	where
		S: AsRef<str> + Sync,
	{
		if prompts.is_empty() {
			return Vec::new();
		}
		let chunk_size = prompts.len().div_ceil(num_cpus::get().max(1));

		thread::scope(|scope| {
			let workers: Vec<_> = prompts
				.chunks(chunk_size)
				.map(|chunk| {
					scope.spawn(move || {
						chunk
							.iter()
							.map(|prompt| self.predict(prompt.as_ref(), config))
							.collect::<Vec<_>>()
					})
				})
				.collect();

			workers
				.into_iter()
				.flat_map(|worker| match worker.join() {
					Ok(results) => results,
					Err(panic) => std::panic::resume_unwind(panic),
				})
				.collect()
		})
	}

	/// Best child of `id`, if any.
	pub fn best_child(&self, id: NodeId) -> Option<NodeId> {
		self.nodes
			.children(id)
			.max_by(|&a, &b| rank_continuations(&self.nodes[a], &self.nodes[b]))
	}

	/// Moves the cursor over one prompt character.
	fn advance(&self, cursor: &mut Cursor, byte: u8) -> std::result::Result<(), PromptOutcome> {
		let node = &self.nodes[cursor.node];
		let found = if cursor.consumed < node.label().len() {
			// inside a label: siblings share the consumed prefix
			let mut key = node.label().as_bytes()[..cursor.consumed].to_vec();
			key.push(byte);
			match self.nodes.search_chain(cursor.node, &key) {
				ChainSearch::Found(next) => Some((next, key.len())),
				ChainSearch::Vacant { .. } => None,
			}
		} else if node.is_leaf() {
			return Err(PromptOutcome::Exhausted);
		} else {
			self.nodes.match_child(cursor.node, byte).map(|next| (next, 1))
		};

		let (next, consumed) = found.ok_or(PromptOutcome::Unmatched)?;
		cursor.node = next;
		cursor.consumed = consumed;
		Ok(())
	}

	/// Appends the greedy completion from `cursor`.
	fn synthesize(&self, mut cursor: Cursor, output: &mut Output) {
		let label = self.nodes[cursor.node].label();
		if cursor.consumed < label.len() {
			let prefix = &label[..cursor.consumed];
			let best = self
				.nodes
				.chain(cursor.node)
				.filter(|&id| self.nodes[id].label().starts_with(prefix))
				.max_by(|&a, &b| rank_continuations(&self.nodes[a], &self.nodes[b]))
				.unwrap_or(cursor.node);
			output.push_str(&self.nodes[best].label()[cursor.consumed..]);
			cursor.node = best;
		}

		while !output.is_full() {
			let Some(best) = self.best_child(cursor.node) else {
				break;
			};
			output.push_str(self.nodes[best].label());
			cursor.node = best;
		}
	}
}
