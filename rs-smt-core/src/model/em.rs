//! IBM Model 1 style Expectation-Maximization over the lexical table.
//!
//! Every target token of a pair is explained by one source token of the same
//! pair, or by the null source [`NULL_TOKEN`], under a uniform alignment prior.
//! The E-step distributes each target occurrence over the source occurrences
//! in proportion to the current `p(t | s)`; the M-step renormalizes the
//! fractional counts per source token.

use std::collections::BTreeMap;

use super::lexical_table::LexicalTable;
use super::tokenizer::AlignedPair;

/// The null source token prepended to every source sentence during EM.
///
/// Uppercase, so it can never collide with a normalized (lowercased) token.
pub const NULL_TOKEN: &str = "<NULL>";

/// Fractional counts of one EM iteration.
#[derive(Debug, Default)]
struct ExpectedCounts {
	/// `count(s, t)`, grouped by source.
	counts: BTreeMap<String, BTreeMap<String, f64>>,
	/// `total(s)` = sum over t of `count(s, t)`.
	totals: BTreeMap<String, f64>,
}

impl ExpectedCounts {
	fn add(&mut self, source: &str, target: &str, responsibility: f64) {
		*self
			.counts
			.entry(source.to_owned())
			.or_default()
			.entry(target.to_owned())
			.or_insert(0.0) += responsibility;
		*self.totals.entry(source.to_owned()).or_insert(0.0) += responsibility;
	}
}

/// Runs the E-step over every pair with the current table.
fn expectation(pairs: &[AlignedPair], table: &LexicalTable, floor: f64) -> ExpectedCounts {
	let mut expected = ExpectedCounts::default();
	let mut weights: Vec<f64> = Vec::new();

	for pair in pairs {
		// Null source first, then every source occurrence (duplicates kept)
		let sources: Vec<&str> = std::iter::once(NULL_TOKEN)
			.chain(pair.source.iter().map(String::as_str))
			.collect();

		for target in &pair.target {
			weights.clear();
			weights.extend(sources.iter().map(|s| table.probability_or(s, target, floor)));
			// Every weight is >= floor > 0, so z > 0
			let z: f64 = weights.iter().sum();

			for (source, weight) in sources.iter().zip(&weights) {
				expected.add(source, target, weight / z);
			}
		}
	}
	expected
}

/// Applies the M-step: `p(t | s) = count(s, t) / total(s)`.
///
/// Rows of sources observed in this iteration are rebuilt from their counts,
/// so entries not revisited by EM are dropped for those sources. Sources never
/// observed keep their rows unchanged.
fn maximization(expected: ExpectedCounts, table: &mut LexicalTable) {
	let ExpectedCounts { counts, totals } = expected;
	for (source, targets) in counts {
		let total = totals.get(&source).copied().unwrap_or(0.0);
		if total <= 0.0 {
			continue;
		}
		let row: BTreeMap<String, f64> = targets
			.into_iter()
			.map(|(target, count)| (target, count / total))
			.collect();
		table.replace_row(source, row);
	}
}

/// Refines `table` with `iterations` full EM passes over `pairs`.
///
/// # Parameters
/// - `pairs`: tokenized training pairs (same tokenization as initialization)
/// - `table`: initial table, usually from Dice initialization
/// - `iterations`: number of E + M passes; 0 returns the table unchanged
/// - `floor`: probability assumed for absent entries, must be > 0
///
/// # Returns
/// The refined table. For every source token seen in `pairs` (and the null
/// token when any pair has a target), probabilities over targets sum to 1.
pub fn refine(pairs: &[AlignedPair], mut table: LexicalTable, iterations: usize, floor: f64) -> LexicalTable {
	for iteration in 0..iterations {
		let expected = expectation(pairs, &table, floor);
		log::debug!(
			"EM iteration {}/{}: {} source tokens updated",
			iteration + 1,
			iterations,
			expected.totals.len()
		);
		maximization(expected, &mut table);
	}
	table
}
