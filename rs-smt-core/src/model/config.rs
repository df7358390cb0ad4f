use serde::{Deserialize, Serialize};

use crate::error::{SmtError, SmtResult};

/// Hyperparameters of training and decoding.
///
/// Every constant of the pipeline lives here so that tests and callers can
/// vary it. The configuration is persisted together with the trained tables.
///
/// # Defaults
/// | field | value |
/// |-------|-------|
/// | `em_iterations` | 5 |
/// | `prune_threshold` | 0.1 |
/// | `em_floor` | 1e-6 |
/// | `smoothing_k` | 0.1 |
/// | `vocabulary_size` | 1000 |
/// | `lm_weight` | 0.5 |
/// | `beam_width` | 5 |
/// | `candidates_per_token` | 5 |
/// | `keyword_count` | 3 |
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SmtConfig {
	/// Number of full EM passes over the corpus.
	pub em_iterations: usize,

	/// Dice scores must be strictly above this to enter the initial table.
	pub prune_threshold: f64,

	/// Probability used for absent lexical entries. Must be > 0.
	pub em_floor: f64,

	/// Add-k smoothing constant of the language model.
	pub smoothing_k: f64,

	/// Vocabulary size used in the smoothing denominator `k * V`.
	///
	/// This is a fixed constant, not the observed vocabulary size.
	pub vocabulary_size: f64,

	/// Weight of the language-model log-score in the decoder.
	pub lm_weight: f64,

	/// Maximum number of hypotheses kept after each decoding step.
	pub beam_width: usize,

	/// Number of lexical candidates considered per source token.
	pub candidates_per_token: usize,

	/// Number of keywords returned in keyword-extraction mode.
	pub keyword_count: usize,
}

impl Default for SmtConfig {
	fn default() -> Self {
		Self {
			em_iterations: 5,
			prune_threshold: 0.1,
			em_floor: 1e-6,
			smoothing_k: 0.1,
			vocabulary_size: 1000.0,
			lm_weight: 0.5,
			beam_width: 5,
			candidates_per_token: 5,
			keyword_count: 3,
		}
	}
}

impl SmtConfig {
	pub fn with_em_iterations(mut self, em_iterations: usize) -> Self {
		self.em_iterations = em_iterations;
		self
	}

	pub fn with_prune_threshold(mut self, prune_threshold: f64) -> Self {
		self.prune_threshold = prune_threshold;
		self
	}

	pub fn with_em_floor(mut self, em_floor: f64) -> Self {
		self.em_floor = em_floor;
		self
	}

	pub fn with_smoothing(mut self, smoothing_k: f64, vocabulary_size: f64) -> Self {
		self.smoothing_k = smoothing_k;
		self.vocabulary_size = vocabulary_size;
		self
	}

	pub fn with_lm_weight(mut self, lm_weight: f64) -> Self {
		self.lm_weight = lm_weight;
		self
	}

	pub fn with_beam_width(mut self, beam_width: usize) -> Self {
		self.beam_width = beam_width;
		self
	}

	pub fn with_candidates_per_token(mut self, candidates_per_token: usize) -> Self {
		self.candidates_per_token = candidates_per_token;
		self
	}

	pub fn with_keyword_count(mut self, keyword_count: usize) -> Self {
		self.keyword_count = keyword_count;
		self
	}

	/// Checks that every value keeps the arithmetic well defined.
	///
	/// # Errors
	/// Returns `InvalidConfig` if
	/// - `beam_width` or `candidates_per_token` is zero
	/// - `em_floor`, `smoothing_k` or `vocabulary_size` is not a positive finite number
	/// - `prune_threshold` or `lm_weight` is negative or not finite
	pub fn validate(&self) -> SmtResult<()> {
		if self.beam_width == 0 {
			return Err(SmtError::InvalidConfig("beam_width must be >= 1".to_owned()));
		}
		if self.candidates_per_token == 0 {
			return Err(SmtError::InvalidConfig("candidates_per_token must be >= 1".to_owned()));
		}
		for (name, value) in [
			("em_floor", self.em_floor),
			("smoothing_k", self.smoothing_k),
			("vocabulary_size", self.vocabulary_size),
		] {
			if !value.is_finite() || value <= 0.0 {
				return Err(SmtError::InvalidConfig(format!("{name} must be > 0, got {value}")));
			}
		}
		for (name, value) in [("prune_threshold", self.prune_threshold), ("lm_weight", self.lm_weight)] {
			if !value.is_finite() || value < 0.0 {
				return Err(SmtError::InvalidConfig(format!("{name} must be >= 0, got {value}")));
			}
		}
		Ok(())
	}
}
