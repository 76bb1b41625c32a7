use serde::{Deserialize, Serialize};

use crate::error::{AutomatonError, Result};

/// Default maximum number of characters in one rendered prompt line.
pub const DEFAULT_OUTPUT_WIDTH: usize = 37;

/// Default literal written between the echoed prompt and its completion.
pub const DEFAULT_TRUNCATION_MARKER: &str = "...";

/// Rendering parameters for prompt completion.
///
/// # Responsibilities
/// - Bound the rendered line length (`output_width`, in characters)
/// - Hold the marker written after the echoed prompt, both before a
///   completion and when the prompt stops early
///
/// # Invariants
/// - `output_width` is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PredictionConfig {
	output_width: usize,
	truncation_marker: String,
}

impl PredictionConfig {
	/// Creates a configuration.
	///
	/// # Errors
	/// Returns an error if `output_width` is 0.
	pub fn new(output_width: usize, truncation_marker: impl Into<String>) -> Result<Self> {
		let mut config = Self::default();
		config.set_output_width(output_width)?;
		config.set_truncation_marker(truncation_marker);
		Ok(config)
	}

	pub fn output_width(&self) -> usize {
		self.output_width
	}

	pub fn truncation_marker(&self) -> &str {
		&self.truncation_marker
	}

	/// Sets the maximum rendered width.
	///
	/// # Errors
	/// Returns an error if `output_width` is 0.
	pub fn set_output_width(&mut self, output_width: usize) -> Result<()> {
		if output_width == 0 {
			return Err(AutomatonError::InvalidConfig("output width must be at least 1".to_owned()));
		}
		self.output_width = output_width;
		Ok(())
	}

	/// Sets the marker. An empty marker is allowed.
	pub fn set_truncation_marker(&mut self, truncation_marker: impl Into<String>) {
		self.truncation_marker = truncation_marker.into();
	}
}

impl Default for PredictionConfig {
	fn default() -> Self {
		Self {
			output_width: DEFAULT_OUTPUT_WIDTH,
			truncation_marker: DEFAULT_TRUNCATION_MARKER.to_owned(),
		}
	}
}
