use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Represents one two-token context of the trigram language model.
///
/// A `State` stores every token observed right after its context, with
/// occurrence counts, plus the total of those counts.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during training
/// - Answer count queries for smoothing
///
/// ## Invariants
/// - `total` always equals the sum of `transitions` values
/// - Each transition occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
	/// Outgoing transitions indexed by the next token.
	/// Example: { "timeout" => 3, "error" => 1 }
	transitions: BTreeMap<String, u64>,
	/// Sum of all transition counts.
	total: u64,
}

impl State {
	/// Creates a new empty state.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records an occurrence of a transition toward `next_token`.
	///
	/// - If the transition already exists, its occurrence count is increased.
	/// - Otherwise, a new transition is created with an initial count of 1.
	pub fn add_transition(&mut self, next_token: &str) {
		*self.transitions.entry(next_token.to_owned()).or_insert(0) += 1;
		self.total += 1;
	}

	/// Number of times `next_token` followed this context (0 if never).
	pub fn count(&self, next_token: &str) -> u64 {
		self.transitions.get(next_token).copied().unwrap_or(0)
	}

	/// Total number of transitions out of this context.
	pub fn total(&self) -> u64 {
		self.total
	}

	/// Iterates over `(next_token, count)` in token order.
	pub fn transitions(&self) -> impl Iterator<Item = (&str, u64)> {
		self.transitions.iter().map(|(t, c)| (t.as_str(), *c))
	}
}
