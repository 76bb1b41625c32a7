//! Frequency-weighted character automaton for prompt completion.
//!
//! This crate provides:
//! - Construction of a labelled-edge automaton from training statements
//! - Compression of single-child chains into longer labels
//! - Greedy completion of prompts with the most frequent continuation
//! - A staged line reader for the training / prompt input format
//!
//! Only the high-level API is exposed publicly. Structural edits of the
//! automaton are kept internal so that sibling chains stay ordered.

/// Automaton data structure, construction, compression and prediction.
pub mod automaton;

/// Error type and `Result` alias.
pub mod error;

/// Staged input tokenizer.
pub mod input;

/// I/O utilities (corpus loading, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use automaton::{Automaton, CompressionOutcome, Prediction, PredictionConfig, PromptOutcome};
pub use error::{AutomatonError, Result};
