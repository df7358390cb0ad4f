use std::path::Path;

use serde::{Deserialize, Serialize};

use super::config::SmtConfig;
use super::cooccurrence;
use super::decoder::Decoder;
use super::em;
use super::language_model::{LanguageModel, Smoothing};
use super::lexical_table::LexicalTable;
use super::tokenizer::{AlignedPair, Sentence, Sublanguage, TrainingPair};
use crate::error::{SmtError, SmtResult};
use crate::io::{build_output_path, read_pairs, write_atomic};

/// Format tag written at the head of every model blob.
pub const MODEL_FORMAT: &str = "rs-smt";

/// Version of the model blob layout.
pub const MODEL_VERSION: u16 = 2;

/// Blob header, decoded before the body so version mismatches are reported
/// as such rather than as corrupt data.
#[derive(Serialize, Deserialize, Debug)]
struct Header {
	format: String,
	version: u16,
}

/// Scalar statistics derived from the training corpus.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CorpusStats {
	/// Number of training pairs.
	pub pairs: usize,
	/// Filtered requirement tokens over the corpus.
	pub requirement_tokens: usize,
	/// Defect tokens over the corpus.
	pub defect_tokens: usize,
	/// `defect_tokens / requirement_tokens`, 1.0 when there were no requirement tokens.
	pub len_ratio: f64,
}

impl Default for CorpusStats {
	fn default() -> Self {
		Self { pairs: 0, requirement_tokens: 0, defect_tokens: 0, len_ratio: 1.0 }
	}
}

impl CorpusStats {
	fn from_pairs(pairs: &[AlignedPair], source: Sublanguage) -> Self {
		let source_tokens: usize = pairs.iter().map(|p| p.source.len()).sum();
		let target_tokens: usize = pairs.iter().map(|p| p.target.len()).sum();
		let (requirement_tokens, defect_tokens) = match source {
			Sublanguage::Requirement => (source_tokens, target_tokens),
			Sublanguage::Defect => (target_tokens, source_tokens),
		};
		let len_ratio = if requirement_tokens == 0 {
			1.0
		} else {
			defect_tokens as f64 / requirement_tokens as f64
		};
		Self { pairs: pairs.len(), requirement_tokens, defect_tokens, len_ratio }
	}
}

/// Translation model between requirement and defect phrasing.
///
/// The direction is fixed at construction: [`Translator::new`] translates
/// requirements into defect tokens, [`Translator::with_source`] with
/// [`Sublanguage::Defect`] traces defects back to requirement tokens.
///
/// # Responsibilities
/// - Train the lexical table (Dice + EM) and the trigram language model once
/// - Translate requirement text into defect tokens, or extract keywords
/// - Save and restore its whole state as one blob
///
/// # Lifecycle
/// Created empty, populated by exactly one training call (or by loading a
/// blob), then used read-only. All decoding methods take `&self`, so a trained
/// translator can be shared between threads.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Translator {
	config: SmtConfig,
	source: Sublanguage,
	lexicon: LexicalTable,
	language_model: LanguageModel,
	stats: CorpusStats,
	trained: bool,
}

impl Translator {
	/// Creates an empty, untrained translator.
	///
	/// # Errors
	/// Returns `InvalidConfig` if `config` does not validate.
	pub fn new(config: SmtConfig) -> SmtResult<Self> {
		Self::with_source(config, Sublanguage::Requirement)
	}

	/// Creates an empty, untrained translator reading `source` text.
	///
	/// # Errors
	/// Returns `InvalidConfig` if `config` does not validate.
	pub fn with_source(config: SmtConfig, source: Sublanguage) -> SmtResult<Self> {
		config.validate()?;
		Ok(Self { config, source, ..Self::default() })
	}

	/// Loads a translator for the corpus at `filepath`.
	///
	/// - If a blob exists next to the corpus (same stem; `.bin` for requirement
	///   sources, `.trace.bin` for defect sources) and reads `source` text, it
	///   is loaded.
	/// - Otherwise the corpus is read and trained on, and the blob is written
	///   for the next start.
	///
	/// Note: a cached blob keeps the configuration it was trained with;
	/// `config` only applies when training.
	pub fn from_corpus<P: AsRef<Path>>(filepath: P, config: SmtConfig, source: Sublanguage) -> SmtResult<Self> {
		let extension = match source {
			Sublanguage::Requirement => "bin",
			Sublanguage::Defect => "trace.bin",
		};
		let binary_data_path = build_output_path(&filepath, extension)?;
		if binary_data_path.exists() {
			log::info!("Loading cached model {}", binary_data_path.display());
			let cached = Self::load_from_file(&binary_data_path)?;
			if cached.source == source {
				return Ok(cached);
			}
			log::warn!("Cached model reads {:?} text, retraining", cached.source);
		}

		let pairs = read_pairs(&filepath)?;
		let mut translator = Self::with_source(config, source)?;
		translator.train(&pairs)?;
		translator.save_to_file(&binary_data_path)?;
		log::info!("Cached model written to {}", binary_data_path.display());
		Ok(translator)
	}

	/// Trains with the configured number of EM iterations.
	pub fn train(&mut self, pairs: &[TrainingPair]) -> SmtResult<()> {
		self.train_with_iterations(pairs, self.config.em_iterations)
	}

	/// Trains every table from `pairs`.
	///
	/// # Behavior
	/// 1. Tokenizes each pair (filtered requirement side, unfiltered defect side)
	/// 2. Builds the Dice-initialized lexical table
	/// 3. Refines it with `iterations` EM passes
	/// 4. Builds the trigram language model over the target-side sentences
	///
	/// `iterations` is recorded in the configuration, so a saved model
	/// reports the value it was trained with. An empty corpus is valid and
	/// yields empty tables.
	///
	/// # Errors
	/// Returns `AlreadyTrained` if this instance was trained or loaded before.
	pub fn train_with_iterations(&mut self, pairs: &[TrainingPair], iterations: usize) -> SmtResult<()> {
		if self.trained {
			return Err(SmtError::AlreadyTrained);
		}
		self.config.validate()?;
		self.config.em_iterations = iterations;
		let target = self.source.counterpart();
		log::info!(
			"Training {:?} -> {:?} on {} pairs ({} EM iterations)",
			self.source,
			target,
			pairs.len(),
			iterations
		);

		let aligned: Vec<AlignedPair> = pairs.iter().map(|p| AlignedPair::oriented(p, self.source)).collect();

		let initial = cooccurrence::initialize(&aligned, self.config.prune_threshold);
		log::info!("Dice initialization: {} entries for {} source tokens", initial.len(), initial.source_count());

		let lexicon = em::refine(&aligned, initial, iterations, self.config.em_floor);
		log::info!("EM refinement: {} entries", lexicon.len());

		let smoothing = Smoothing { k: self.config.smoothing_k, vocabulary_size: self.config.vocabulary_size };
		let sentences: Vec<&str> = pairs.iter().map(|p| p.text(target)).collect();
		let language_model = LanguageModel::build_for(target, &sentences, smoothing);
		log::info!("Language model: {} contexts", language_model.context_count());

		self.stats = CorpusStats::from_pairs(&aligned, self.source);
		self.lexicon = lexicon;
		self.language_model = language_model;
		self.trained = true;
		Ok(())
	}

	/// A decoder borrowing this translator's tables.
	pub fn decoder(&self) -> Decoder<'_> {
		Decoder::new(&self.lexicon, &self.language_model, &self.config)
	}

	/// Tokenizes `source_text` the way training tokenized the source side.
	fn source_tokens(&self, source_text: &str) -> Vec<String> {
		Sentence::new(self.source, source_text).tokens
	}

	/// Translates source text into a sequence of target tokens.
	///
	/// Requirement stopwords are skipped and unknown tokens contribute
	/// nothing, so the result may be empty.
	pub fn translate(&self, source_text: &str) -> Vec<String> {
		self.decoder().decode(&self.source_tokens(source_text))
	}

	/// Same as [`Translator::translate`], joined with single spaces.
	pub fn translate_to_string(&self, source_text: &str) -> String {
		self.translate(source_text).join(" ")
	}

	/// Returns the best `keyword_count` target tokens for `source_text`.
	pub fn keywords(&self, source_text: &str) -> Vec<String> {
		self.decoder().keywords(&self.source_tokens(source_text))
	}

	/// Serializes the whole model into one blob.
	pub fn to_bytes(&self) -> SmtResult<Vec<u8>> {
		let header = Header { format: MODEL_FORMAT.to_owned(), version: MODEL_VERSION };
		let mut bytes = postcard::to_stdvec(&header)?;
		bytes.extend(postcard::to_stdvec(self)?);
		Ok(bytes)
	}

	/// Rebuilds a model from a blob produced by [`Translator::to_bytes`].
	///
	/// # Errors
	/// - `UnknownFormat` if the blob was not written by this crate
	/// - `IncompatibleModel` if it was written with another layout version
	/// - `CorruptModel` if the body cannot be decoded
	/// - `TrailingBytes` if bytes follow the body
	/// - `InvalidConfig` if the stored configuration is out of range
	pub fn from_bytes(bytes: &[u8]) -> SmtResult<Self> {
		let (header, body): (Header, &[u8]) = postcard::take_from_bytes(bytes)?;
		if header.format != MODEL_FORMAT {
			return Err(SmtError::UnknownFormat(header.format));
		}
		if header.version != MODEL_VERSION {
			return Err(SmtError::IncompatibleModel { found: header.version, expected: MODEL_VERSION });
		}
		let (translator, rest): (Self, &[u8]) = postcard::take_from_bytes(body)?;
		if !rest.is_empty() {
			return Err(SmtError::TrailingBytes(rest.len()));
		}
		translator.config.validate()?;
		Ok(translator)
	}

	/// Replaces the whole state of this instance with the blob's.
	///
	/// On error the instance is left untouched.
	pub fn restore(&mut self, bytes: &[u8]) -> SmtResult<()> {
		*self = Self::from_bytes(bytes)?;
		Ok(())
	}

	/// Writes the model blob to `path` atomically.
	pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SmtResult<()> {
		let bytes = self.to_bytes()?;
		write_atomic(path, &bytes)?;
		Ok(())
	}

	/// Reads a model blob from `path`.
	pub fn load_from_file<P: AsRef<Path>>(path: P) -> SmtResult<Self> {
		let bytes = std::fs::read(path)?;
		Self::from_bytes(&bytes)
	}

	pub fn config(&self) -> &SmtConfig {
		&self.config
	}

	pub fn lexicon(&self) -> &LexicalTable {
		&self.lexicon
	}

	pub fn language_model(&self) -> &LanguageModel {
		&self.language_model
	}

	/// The sublanguage this translator reads.
	pub fn source(&self) -> Sublanguage {
		self.source
	}

	/// The sublanguage this translator writes.
	pub fn target(&self) -> Sublanguage {
		self.source.counterpart()
	}

	pub fn stats(&self) -> &CorpusStats {
		&self.stats
	}

	/// `true` once trained or loaded from a trained blob.
	pub fn is_trained(&self) -> bool {
		self.trained
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pairs() -> Vec<TrainingPair> {
		vec![
			TrainingPair::new("The system must verify user password", "AuthError: Invalid Credentials 401"),
			TrainingPair::new("The checkout latency should be under 500ms", "TimeoutException: Gateway 504"),
			TrainingPair::new("User profile image must be PNG format", "UploadFailed: Invalid MimeType"),
			TrainingPair::new("Password must be 8 characters", "AuthError: Validation Length Failed"),
		]
	}

	fn trained() -> Translator {
		let mut translator = Translator::new(SmtConfig::default()).unwrap();
		translator.train(&pairs()).unwrap();
		translator
	}

	#[test]
	fn test_new_validates_config() {
		assert!(matches!(
			Translator::new(SmtConfig::default().with_beam_width(0)),
			Err(SmtError::InvalidConfig(_))
		));
	}

	#[test]
	fn test_train_once() {
		let mut translator = trained();
		assert!(translator.is_trained());
		assert!(matches!(translator.train(&pairs()), Err(SmtError::AlreadyTrained)));
	}

	#[test]
	fn test_stats() {
		let translator = trained();
		let stats = translator.stats();
		assert_eq!(stats.pairs, 4);
		// verify password | checkout latency be under 500ms | profile image be png format | password be 8 characters
		assert_eq!(stats.requirement_tokens, 2 + 5 + 5 + 4);
		assert!(stats.defect_tokens > 0);
		assert!((stats.len_ratio - stats.defect_tokens as f64 / 16.0).abs() < 1e-12);
		assert_eq!(Translator::default().stats().len_ratio, 1.0);
	}

	#[test]
	fn test_explicit_iterations_are_persisted() {
		let mut translator = Translator::new(SmtConfig::default()).unwrap();
		translator.train_with_iterations(&pairs(), 1).unwrap();
		assert_eq!(translator.config().em_iterations, 1);

		let restored = Translator::from_bytes(&translator.to_bytes().unwrap()).unwrap();
		assert_eq!(restored.config().em_iterations, 1);
	}

	#[test]
	fn test_defect_source_traces_to_requirement_tokens() {
		let mut tracer = Translator::with_source(SmtConfig::default(), Sublanguage::Defect).unwrap();
		tracer.train(&pairs()).unwrap();
		assert_eq!(tracer.source(), Sublanguage::Defect);
		assert_eq!(tracer.target(), Sublanguage::Requirement);

		// Defect tokens are the lexical sources, unfiltered
		assert!(tracer.lexicon().row("autherror").is_some());
		assert!(tracer.lexicon().row("verify").is_none());

		let output = tracer.translate("AuthError: Invalid Credentials");
		assert!(!output.is_empty());
		for token in output.iter().chain(&tracer.keywords("AuthError: Invalid Credentials")) {
			assert!(!crate::model::tokenizer::is_stopword(token), "{token}");
		}

		// Same corpus statistics whatever the direction
		assert_eq!(tracer.stats(), trained().stats());
	}

	#[test]
	fn test_direction_survives_round_trip() {
		let mut tracer = Translator::with_source(SmtConfig::default(), Sublanguage::Defect).unwrap();
		tracer.train(&pairs()).unwrap();
		let restored = Translator::from_bytes(&tracer.to_bytes().unwrap()).unwrap();
		assert_eq!(restored.source(), Sublanguage::Defect);
		assert_eq!(restored.translate("Invalid MimeType"), tracer.translate("Invalid MimeType"));
	}

	#[test]
	fn test_translate_password() {
		let translator = trained();
		let output = translator.translate("Verify user password length");
		assert!(!output.is_empty());
		assert!(output.len() <= 2);
		assert_eq!(translator.translate_to_string("Verify user password length"), output.join(" "));
	}

	#[test]
	fn test_untrained_translator_outputs_nothing() {
		let translator = Translator::default();
		assert!(translator.translate("Verify user password").is_empty());
		assert!(translator.keywords("Verify user password").is_empty());
	}

	#[test]
	fn test_round_trip_bytes() {
		let translator = trained();
		let bytes = translator.to_bytes().unwrap();
		let restored = Translator::from_bytes(&bytes).unwrap();
		assert_eq!(restored, translator);
	}

	#[test]
	fn test_restore_replaces_state() {
		let source = trained();
		let bytes = source.to_bytes().unwrap();

		let mut target = Translator::new(SmtConfig::default().with_beam_width(2)).unwrap();
		target.restore(&bytes).unwrap();
		assert_eq!(target, source);
		assert_eq!(target.config().beam_width, 5);
	}

	#[test]
	fn test_restore_failure_keeps_state() {
		let mut translator = trained();
		let before = translator.clone();
		assert!(translator.restore(&[1, 2, 3]).is_err());
		assert_eq!(translator, before);
	}

	#[test]
	fn test_rejects_foreign_and_future_blobs() {
		let foreign = postcard::to_stdvec(&Header { format: "other".to_owned(), version: MODEL_VERSION }).unwrap();
		assert!(matches!(Translator::from_bytes(&foreign), Err(SmtError::UnknownFormat(f)) if f == "other"));

		let mut future = postcard::to_stdvec(&Header { format: MODEL_FORMAT.to_owned(), version: 99 }).unwrap();
		future.extend(postcard::to_stdvec(&trained()).unwrap());
		assert!(matches!(
			Translator::from_bytes(&future),
			Err(SmtError::IncompatibleModel { found: 99, expected: MODEL_VERSION })
		));

		let bytes = trained().to_bytes().unwrap();
		assert!(matches!(Translator::from_bytes(&bytes[..bytes.len() / 2]), Err(SmtError::CorruptModel(_))));
		assert!(matches!(Translator::from_bytes(&[]), Err(SmtError::CorruptModel(_))));
	}

	#[test]
	fn test_rejects_trailing_bytes() {
		let mut bytes = trained().to_bytes().unwrap();
		bytes.extend([0xde, 0xad, 0xbe, 0xef, 7, 7, 7]);
		assert!(matches!(Translator::from_bytes(&bytes), Err(SmtError::TrailingBytes(7))));

		let mut translator = trained();
		let before = translator.clone();
		assert!(translator.restore(&bytes).is_err());
		assert_eq!(translator, before);
	}

	#[test]
	fn test_file_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("model.bin");
		let translator = trained();
		translator.save_to_file(&path).unwrap();
		assert_eq!(Translator::load_from_file(&path).unwrap(), translator);
	}

	#[test]
	fn test_from_corpus_writes_and_reuses_cache() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("traceability.tsv");
		std::fs::write(&corpus, "Database must enforce unique IDs\tSQL Integrity Constraint Violation\n").unwrap();

		let first = Translator::from_corpus(&corpus, SmtConfig::default(), Sublanguage::Requirement).unwrap();
		assert!(dir.path().join("traceability.bin").exists());
		assert_eq!(first.stats().pairs, 1);

		let tracer = Translator::from_corpus(&corpus, SmtConfig::default(), Sublanguage::Defect).unwrap();
		assert!(dir.path().join("traceability.trace.bin").exists());
		assert_eq!(tracer.source(), Sublanguage::Defect);

		// The cached blobs win over the (now different) corpus file
		std::fs::write(&corpus, "garbage without separator\n").unwrap();
		let second = Translator::from_corpus(&corpus, SmtConfig::default(), Sublanguage::Requirement).unwrap();
		assert_eq!(second, first);
		let traced = Translator::from_corpus(&corpus, SmtConfig::default(), Sublanguage::Defect).unwrap();
		assert_eq!(traced, tracer);
	}
}
