use std::collections::{BTreeMap, BTreeSet};

use super::lexical_table::LexicalTable;
use super::tokenizer::AlignedPair;

/// Corpus-wide document frequencies of source tokens, target tokens and
/// (source, target) pairs.
///
/// Each training pair contributes at most 1 to any count: tokens are
/// deduplicated within a sentence before counting.
///
/// # Invariants
/// - `joint(s, t) <= min(source(s), target(t))`
#[derive(Clone, Debug, Default)]
pub struct CooccurrenceCounts {
	source: BTreeMap<String, u32>,
	target: BTreeMap<String, u32>,
	joint: BTreeMap<(String, String), u32>,
}

impl CooccurrenceCounts {
	pub fn new() -> Self {
		Self::default()
	}

	/// Counts every training pair of `pairs`.
	pub fn from_pairs(pairs: &[AlignedPair]) -> Self {
		let mut counts = Self::new();
		for pair in pairs {
			counts.add_pair(pair);
		}
		counts
	}

	/// Records one training pair.
	pub fn add_pair(&mut self, pair: &AlignedPair) {
		let source: BTreeSet<&str> = pair.source.iter().map(String::as_str).collect();
		let target: BTreeSet<&str> = pair.target.iter().map(String::as_str).collect();

		for s in &source {
			*self.source.entry((*s).to_owned()).or_insert(0) += 1;
		}
		for t in &target {
			*self.target.entry((*t).to_owned()).or_insert(0) += 1;
		}
		for s in &source {
			for t in &target {
				*self.joint.entry(((*s).to_owned(), (*t).to_owned())).or_insert(0) += 1;
			}
		}
	}

	/// Number of pairs containing `token` on the source side.
	pub fn source(&self, token: &str) -> u32 {
		self.source.get(token).copied().unwrap_or(0)
	}

	/// Number of pairs containing `token` on the target side.
	pub fn target(&self, token: &str) -> u32 {
		self.target.get(token).copied().unwrap_or(0)
	}

	/// Number of pairs containing both tokens.
	pub fn joint(&self, source: &str, target: &str) -> u32 {
		self.joint
			.get(&(source.to_owned(), target.to_owned()))
			.copied()
			.unwrap_or(0)
	}

	/// Dice coefficient `2 * joint / (source + target)`, in `[0, 1]`.
	///
	/// Returns 0 when neither token was seen.
	pub fn dice(&self, source: &str, target: &str) -> f64 {
		let denominator = self.source(source) + self.target(target);
		if denominator == 0 {
			return 0.0;
		}
		2.0 * f64::from(self.joint(source, target)) / f64::from(denominator)
	}

	/// Iterates over every co-occurring `(source, target)` with its Dice score.
	pub fn scores(&self) -> impl Iterator<Item = (&str, &str, f64)> {
		self.joint.iter().map(|((s, t), joint)| {
			let denominator = self.source[s] + self.target[t];
			(s.as_str(), t.as_str(), 2.0 * f64::from(*joint) / f64::from(denominator))
		})
	}

	/// Keeps the pairs whose Dice score is strictly above `threshold`.
	pub fn into_lexical_table(&self, threshold: f64) -> LexicalTable {
		let mut table = LexicalTable::new();
		for (s, t, score) in self.scores() {
			if score > threshold {
				table.insert(s, t, score);
			}
		}
		table
	}
}

/// Builds the initial lexical table from Dice co-occurrence scores.
///
/// Sources that never score above `threshold` with any target get no row and
/// are treated as unknown at decode time.
pub fn initialize(pairs: &[AlignedPair], threshold: f64) -> LexicalTable {
	let counts = CooccurrenceCounts::from_pairs(pairs);
	let table = counts.into_lexical_table(threshold);
	log::debug!(
		"Dice initialization: {} co-occurring pairs, {} retained entries",
		counts.joint.len(),
		table.len()
	);
	table
}
