use std::collections::BTreeMap;

use super::config::SmtConfig;
use super::language_model::{Context, LanguageModel};
use super::lexical_table::LexicalTable;

/// A partial translation.
///
/// Hypotheses are never mutated: [`Hypothesis::extend`] derives a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct Hypothesis {
	tokens: Vec<String>,
	context: Context,
	score: f64,
}

impl Hypothesis {
	/// The empty hypothesis every decode starts from.
	pub fn seed() -> Self {
		Self { tokens: Vec::new(), context: Context::start(), score: 0.0 }
	}

	/// Appends `token`, adding `increment` to the score and shifting the context.
	pub fn extend(&self, token: &str, increment: f64) -> Self {
		let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
		tokens.extend(self.tokens.iter().cloned());
		tokens.push(token.to_owned());
		Self { tokens, context: self.context.shift(token), score: self.score + increment }
	}

	pub fn tokens(&self) -> &[String] {
		&self.tokens
	}

	pub fn context(&self) -> &Context {
		&self.context
	}

	/// Cumulative log-score.
	pub fn score(&self) -> f64 {
		self.score
	}
}

/// The surviving hypotheses of a decode, best first.
///
/// # Invariants
/// - `len() <= width`
/// - Hypotheses are sorted by decreasing score
#[derive(Clone, Debug, PartialEq)]
pub struct Beam {
	hypotheses: Vec<Hypothesis>,
	width: usize,
}

impl Beam {
	/// A beam holding only the seed hypothesis. `width` is clamped to at least 1.
	pub fn new(width: usize) -> Self {
		Self { hypotheses: vec![Hypothesis::seed()], width: width.max(1) }
	}

	/// Builds a pruned beam from unordered hypotheses.
	///
	/// Sorting is stable: on exact score ties the earlier candidate wins.
	fn pruned(mut hypotheses: Vec<Hypothesis>, width: usize) -> Self {
		hypotheses.sort_by(|a, b| b.score.total_cmp(&a.score));
		hypotheses.truncate(width);
		Self { hypotheses, width }
	}

	/// The best-scoring hypothesis, if any.
	pub fn best(&self) -> Option<&Hypothesis> {
		self.hypotheses.first()
	}

	pub fn hypotheses(&self) -> &[Hypothesis] {
		&self.hypotheses
	}

	pub fn width(&self) -> usize {
		self.width
	}

	pub fn len(&self) -> usize {
		self.hypotheses.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hypotheses.is_empty()
	}
}

/// Beam-search decoder over a lexical table and a language model.
///
/// The decoder borrows the trained tables and never mutates them, so any
/// number of decoders may run against the same model.
pub struct Decoder<'a> {
	lexicon: &'a LexicalTable,
	language_model: &'a LanguageModel,
	config: &'a SmtConfig,
}

impl<'a> Decoder<'a> {
	pub fn new(lexicon: &'a LexicalTable, language_model: &'a LanguageModel, config: &'a SmtConfig) -> Self {
		Self { lexicon, language_model, config }
	}

	/// Score added when extending a hypothesis in `context` with `token`.
	///
	/// `ln p(token | source) + lm_weight * lm_score(token | context)`.
	fn increment(&self, probability: f64, token: &str, context: &Context) -> f64 {
		probability.max(self.config.em_floor).ln()
			+ self.config.lm_weight * self.language_model.score(token, context)
	}

	/// Advances `beam` by one source token.
	///
	/// # Behavior
	/// - Takes the `candidates_per_token` best targets of `source_token`
	/// - Extends every hypothesis with every candidate
	/// - Keeps the `beam_width` best results
	///
	/// A source token without lexical entries leaves the beam unchanged.
	pub fn step(&self, beam: &Beam, source_token: &str) -> Beam {
		let candidates = self.lexicon.top_candidates(source_token, self.config.candidates_per_token);
		if candidates.is_empty() {
			return beam.clone();
		}

		let mut extended = Vec::with_capacity(beam.len() * candidates.len());
		for hypothesis in &beam.hypotheses {
			for (token, probability) in &candidates {
				let increment = self.increment(*probability, token, &hypothesis.context);
				extended.push(hypothesis.extend(token, increment));
			}
		}
		Beam::pruned(extended, beam.width)
	}

	/// Runs the beam over filtered source tokens and returns the final beam.
	pub fn search<S: AsRef<str>>(&self, source_tokens: &[S]) -> Beam {
		source_tokens
			.iter()
			.fold(Beam::new(self.config.beam_width), |beam, token| self.step(&beam, token.as_ref()))
	}

	/// Translates filtered source tokens into the best target token sequence.
	///
	/// Returns an empty sequence when no source token has lexical entries.
	pub fn decode<S: AsRef<str>>(&self, source_tokens: &[S]) -> Vec<String> {
		let beam = self.search(source_tokens);
		let output = beam.best().map(|h| h.tokens.clone()).unwrap_or_default();
		log::debug!("Decoded {} source tokens into {} target tokens", source_tokens.len(), output.len());
		output
	}

	/// Keyword-extraction mode.
	///
	/// Sums each target token's probability over the rows of all source tokens
	/// and returns the `keyword_count` largest sums. Ties keep token order.
	pub fn keywords<S: AsRef<str>>(&self, source_tokens: &[S]) -> Vec<String> {
		let mut guesses: BTreeMap<&str, f64> = BTreeMap::new();
		for source in source_tokens {
			if let Some(row) = self.lexicon.row(source.as_ref()) {
				for (target, probability) in row {
					*guesses.entry(target.as_str()).or_insert(0.0) += probability;
				}
			}
		}

		let mut ranked: Vec<(&str, f64)> = guesses.into_iter().collect();
		ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
		ranked
			.into_iter()
			.take(self.config.keyword_count)
			.map(|(token, _)| token.to_owned())
			.collect()
	}
}
