use serde::{Deserialize, Serialize};

/// Characters split into their own token.
///
/// ASCII punctuation plus the typographic quotes found in pasted requirement
/// documents.
pub const PUNCTUATION: &[char] = &[
	'.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}', '"', '\'', '|', '/', '\\', '-',
	'\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}',
];

/// Requirement-side stopwords: articles, modal verbs and domain filler.
///
/// Kept sorted for `binary_search`.
pub const STOPWORDS: &[&str] = &[
	"a", "an", "and", "are", "for", "in", "is", "must", "of", "on", "or", "shall", "should",
	"system", "the", "to", "user", "was", "were", "will",
];

/// Returns `true` if `token` is a requirement-side stopword.
pub fn is_stopword(token: &str) -> bool {
	STOPWORDS.binary_search(&token).is_ok()
}

/// Lowercases `text`, isolates punctuation and collapses whitespace.
///
/// The result is the token sequence joined by single spaces, with no leading
/// or trailing whitespace. Any input, including the empty string, is valid.
pub fn normalize(text: &str) -> String {
	tokenize(text).join(" ")
}

/// Splits `text` into normalized tokens.
///
/// - Case-folds the input
/// - Every character of [`PUNCTUATION`] becomes its own token
/// - Runs of whitespace separate tokens
pub fn tokenize(text: &str) -> Vec<String> {
	let mut spaced = String::with_capacity(text.len() + 8);
	for c in text.chars().flat_map(char::to_lowercase) {
		if PUNCTUATION.contains(&c) {
			spaced.push(' ');
			spaced.push(c);
			spaced.push(' ');
		} else {
			spaced.push(c);
		}
	}
	spaced.split_whitespace().map(str::to_owned).collect()
}

/// Same as [`tokenize`] with [`STOPWORDS`] removed.
///
/// Used for the lexical stages and for decoding input. The language model
/// uses the unfiltered variant because stopwords matter for fluency.
pub fn tokenize_filtered(text: &str) -> Vec<String> {
	tokenize(text)
		.into_iter()
		.filter(|token| !is_stopword(token))
		.collect()
}

/// The two sublanguages the translator maps between.
///
/// Either one can be the translation source; the other is then the target.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Sublanguage {
	/// Requirement phrasing. Tokenized with stopword filtering.
	#[default]
	Requirement,
	/// Defect / log phrasing. Tokenized without filtering.
	Defect,
}

impl Sublanguage {
	/// The other sublanguage.
	pub fn counterpart(self) -> Self {
		match self {
			Self::Requirement => Self::Defect,
			Self::Defect => Self::Requirement,
		}
	}
}

/// A tokenized sentence tagged with its sublanguage role.
///
/// The role only matters during training; it decides whether stopwords
/// are filtered.
#[derive(Clone, Debug, PartialEq)]
pub struct Sentence {
	pub role: Sublanguage,
	pub tokens: Vec<String>,
}

impl Sentence {
	/// Tokenizes `text` according to `role`.
	pub fn new(role: Sublanguage, text: &str) -> Self {
		let tokens = match role {
			Sublanguage::Requirement => tokenize_filtered(text),
			Sublanguage::Defect => tokenize(text),
		};
		Self { role, tokens }
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}

/// A raw (requirement, defect) example. Tokenization happens at training time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TrainingPair {
	pub requirement: String,
	pub defect: String,
}

impl TrainingPair {
	pub fn new(requirement: &str, defect: &str) -> Self {
		Self { requirement: requirement.to_owned(), defect: defect.to_owned() }
	}

	/// The side of the pair written in `role`.
	pub fn text(&self, role: Sublanguage) -> &str {
		match role {
			Sublanguage::Requirement => &self.requirement,
			Sublanguage::Defect => &self.defect,
		}
	}
}

impl<R: AsRef<str>, D: AsRef<str>> From<(R, D)> for TrainingPair {
	fn from((requirement, defect): (R, D)) -> Self {
		Self::new(requirement.as_ref(), defect.as_ref())
	}
}

/// A training pair after tokenization, as seen by the lexical stages.
///
/// Both the co-occurrence initializer and the EM refiner consume this type,
/// so they always agree on the token streams. Each side is tokenized by its
/// own role: requirement tokens are stopword-filtered whichever side they are on.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedPair {
	/// Source-side tokens, in order, duplicates kept.
	pub source: Vec<String>,
	/// Target-side tokens, in order, duplicates kept.
	pub target: Vec<String>,
}

impl AlignedPair {
	/// Requirement to defect orientation.
	pub fn from_pair(pair: &TrainingPair) -> Self {
		Self::oriented(pair, Sublanguage::Requirement)
	}

	/// Tokenizes `pair` with `source` as the translation source.
	pub fn oriented(pair: &TrainingPair, source: Sublanguage) -> Self {
		let target = source.counterpart();
		Self {
			source: Sentence::new(source, pair.text(source)).tokens,
			target: Sentence::new(target, pair.text(target)).tokens,
		}
	}
}
