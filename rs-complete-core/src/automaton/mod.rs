//! Top-level module for the prediction automaton.
//!
//! This module provides a frequency-weighted character automaton, including:
//! - The node arena and its ordered sibling chains (`node`)
//! - The automaton itself, its totals and snapshots (`model`)
//! - Statement insertion (`construction`)
//! - Single-child chain merging (`compression`)
//! - Greedy prompt completion (`prediction`, `prediction_config`)

/// Arena of labelled nodes linked into ordered sibling chains.
///
/// Exposes read-only node accessors; structural edits stay crate-internal.
pub mod node;

/// The `Automaton` type, its running totals and `postcard` snapshots.
pub mod model;

/// Character-by-character statement insertion.
///
/// Not exposed, it only adds methods to `Automaton`.
mod construction;

/// Merging of single-child chains while conserving frequency semantics.
pub mod compression;

/// Greedy highest-frequency completion of prompts.
pub mod prediction;

/// Output width and marker used when rendering predictions.
pub mod prediction_config;

pub use compression::CompressionOutcome;
pub use model::{Automaton, Totals};
pub use node::{Node, NodeId};
pub use prediction::{Prediction, PromptOutcome, rank_continuations};
pub use prediction_config::{DEFAULT_OUTPUT_WIDTH, DEFAULT_TRUNCATION_MARKER, PredictionConfig};
