use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sparse lexical translation table: `source token -> target token -> probability`.
///
/// Rows are ordered maps so iteration, tie-breaking and serialization are
/// deterministic. Absent entries are never inserted on read; callers ask for
/// a default explicitly with [`LexicalTable::probability_or`].
///
/// # Invariants
/// - Every stored probability is finite and strictly positive
/// - No row is empty
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LexicalTable {
	rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl LexicalTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets `p(target | source)`. Non-positive or non-finite values are ignored.
	pub fn insert(&mut self, source: &str, target: &str, probability: f64) {
		if !probability.is_finite() || probability <= 0.0 {
			return;
		}
		self.rows
			.entry(source.to_owned())
			.or_default()
			.insert(target.to_owned(), probability);
	}

	/// Replaces the whole row of `source`. An empty row removes the source.
	pub(crate) fn replace_row(&mut self, source: String, row: BTreeMap<String, f64>) {
		let row: BTreeMap<String, f64> = row
			.into_iter()
			.filter(|(_, p)| p.is_finite() && *p > 0.0)
			.collect();
		if row.is_empty() {
			self.rows.remove(&source);
		} else {
			self.rows.insert(source, row);
		}
	}

	/// Returns the stored probability, if any.
	pub fn probability(&self, source: &str, target: &str) -> Option<f64> {
		self.rows.get(source)?.get(target).copied()
	}

	/// Returns the stored probability or `default` when the entry is absent.
	pub fn probability_or(&self, source: &str, target: &str, default: f64) -> f64 {
		self.probability(source, target).unwrap_or(default)
	}

	/// Returns the row of `source`, if the token has any entry.
	pub fn row(&self, source: &str) -> Option<&BTreeMap<String, f64>> {
		self.rows.get(source)
	}

	/// Iterates over source tokens in order.
	pub fn sources(&self) -> impl Iterator<Item = &str> {
		self.rows.keys().map(String::as_str)
	}

	/// Iterates over every `(source, target, probability)` entry.
	pub fn entries(&self) -> impl Iterator<Item = (&str, &str, f64)> {
		self.rows.iter().flat_map(|(source, row)| {
			row.iter()
				.map(move |(target, p)| (source.as_str(), target.as_str(), *p))
		})
	}

	/// Sum of the probabilities stored for `source` (0 when unknown).
	pub fn row_sum(&self, source: &str) -> f64 {
		self.row(source).map(|row| row.values().sum()).unwrap_or(0.0)
	}

	/// Returns up to `n` targets of `source` by decreasing probability.
	///
	/// Equal probabilities keep the table order (lexicographic target order).
	/// Unknown sources yield an empty list.
	pub fn top_candidates(&self, source: &str, n: usize) -> Vec<(&str, f64)> {
		let Some(row) = self.row(source) else {
			return Vec::new();
		};
		let mut candidates: Vec<(&str, f64)> = row.iter().map(|(t, p)| (t.as_str(), *p)).collect();
		candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
		candidates.truncate(n);
		candidates
	}

	/// Number of source tokens with at least one entry.
	pub fn source_count(&self) -> usize {
		self.rows.len()
	}

	/// Total number of stored entries.
	pub fn len(&self) -> usize {
		self.rows.values().map(BTreeMap::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}
}
