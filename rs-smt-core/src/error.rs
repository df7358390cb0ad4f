use thiserror::Error;

/// Errors from translator operations.
///
/// Text content never produces an error: empty or odd input degrades to empty
/// output. Only configuration, corpus files and persisted blobs can fail.
#[derive(Debug, Error)]
pub enum SmtError {
	/// I/O error while reading a corpus or reading/writing a model file.
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// The model blob could not be decoded.
	#[error("corrupt model blob: {0}")]
	CorruptModel(#[from] postcard::Error),

	/// The blob decoded, but bytes were left over after the model body.
	#[error("corrupt model blob: {0} trailing bytes")]
	TrailingBytes(usize),

	/// The blob was not written by this crate.
	#[error("unknown model format tag: {0:?}")]
	UnknownFormat(String),

	/// The blob was written by an incompatible version of this crate.
	#[error("incompatible model version: found {found}, expected {expected}")]
	IncompatibleModel { found: u16, expected: u16 },

	/// A translator can only be trained once.
	#[error("translator is already trained")]
	AlreadyTrained,

	/// A configuration value is out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// A corpus line could not be parsed.
	#[error("malformed corpus at line {line}: {reason}")]
	MalformedCorpus { line: usize, reason: String },
}

/// Result type for translator operations.
pub type SmtResult<T> = Result<T, SmtError>;
