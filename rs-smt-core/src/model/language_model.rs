use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::State;
use super::tokenizer::{Sentence, Sublanguage};

/// Sentence-start marker, used twice in front of every sentence.
pub const START_TOKEN: &str = "<s>";

/// Sentence-end marker, appended once to every sentence.
pub const END_TOKEN: &str = "</s>";

/// The two tokens preceding a position: `(token at i-2, token at i-1)`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Context(pub String, pub String);

impl Context {
	/// The context of the first token of a sentence: `(<s>, <s>)`.
	pub fn start() -> Self {
		Self(START_TOKEN.to_owned(), START_TOKEN.to_owned())
	}

	pub fn new(previous: &str, last: &str) -> Self {
		Self(previous.to_owned(), last.to_owned())
	}

	/// The context following `token`: `(self.1, token)`.
	pub fn shift(&self, token: &str) -> Self {
		Self(self.1.clone(), token.to_owned())
	}
}

/// Add-k smoothing parameters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Smoothing {
	/// Pseudo-count added to every `(context, token)` count.
	pub k: f64,
	/// Fixed vocabulary size of the denominator `total + k * V`.
	pub vocabulary_size: f64,
}

impl Default for Smoothing {
	fn default() -> Self {
		Self { k: 0.1, vocabulary_size: 1000.0 }
	}
}

/// Trigram language model over target-side sentences (defect sentences by default).
///
/// # Responsibilities
/// - Count `(context -> next token)` transitions with sentence markers
/// - Score a token in a context with add-k smoothing
///
/// # Invariants
/// - For every context, the total equals the sum of its next-token counts
/// - Built once by [`LanguageModel::build`]; there is no update API
/// - `score` is always finite: the denominator is at least `k * V > 0`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LanguageModel {
	/// Mapping from a two-token context to its transitions
	states: BTreeMap<Context, State>,
	smoothing: Smoothing,
}

impl LanguageModel {
	/// Builds the model from raw defect sentences.
	///
	/// Sentences are tokenized without stopword filtering and wrapped as
	/// `<s> <s> tokens... </s>`. Empty sentences still record `<s> <s> -> </s>`.
	pub fn build<S: AsRef<str>>(sentences: &[S], smoothing: Smoothing) -> Self {
		Self::build_for(Sublanguage::Defect, sentences, smoothing)
	}

	/// Builds the model from raw sentences written in `role`.
	///
	/// Requirement sentences are stopword-filtered, so the model scores the
	/// same token stream the lexical table produces.
	pub fn build_for<S: AsRef<str>>(role: Sublanguage, sentences: &[S], smoothing: Smoothing) -> Self {
		let mut model = Self { states: BTreeMap::new(), smoothing };
		for sentence in sentences {
			let sentence = Sentence::new(role, sentence.as_ref());
			model.add_tokens(&sentence.tokens);
		}
		log::debug!("Language model ({:?}): {} contexts", role, model.states.len());
		model
	}

	fn add_tokens(&mut self, tokens: &[String]) {
		let mut context = Context::start();
		for token in tokens.iter().map(String::as_str).chain(std::iter::once(END_TOKEN)) {
			self.states.entry(context.clone()).or_default().add_transition(token);
			context = context.shift(token);
		}
	}

	/// Number of times `token` followed `context`.
	pub fn count(&self, context: &Context, token: &str) -> u64 {
		self.states.get(context).map(|s| s.count(token)).unwrap_or(0)
	}

	/// Number of transitions recorded out of `context` (0 for unseen contexts).
	pub fn total(&self, context: &Context) -> u64 {
		self.states.get(context).map(State::total).unwrap_or(0)
	}

	/// Smoothed log-probability of `token` following `context`.
	///
	/// `ln((count + k) / (total + k * V))`. Unseen contexts score `ln(1 / V)`.
	pub fn score(&self, token: &str, context: &Context) -> f64 {
		let Smoothing { k, vocabulary_size } = self.smoothing;
		let count = self.count(context, token) as f64;
		let total = self.total(context) as f64;
		((count + k) / (total + k * vocabulary_size)).ln()
	}

	/// Iterates over every known context with its next-token counts.
	pub fn contexts(&self) -> impl Iterator<Item = (&Context, impl Iterator<Item = (&str, u64)>, u64)> {
		self.states
			.iter()
			.map(|(context, state)| (context, state.transitions(), state.total()))
	}

	/// Number of distinct contexts.
	pub fn context_count(&self) -> usize {
		self.states.len()
	}

	pub fn smoothing(&self) -> Smoothing {
		self.smoothing
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}
}
