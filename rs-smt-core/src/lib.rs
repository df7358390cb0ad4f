//! Statistical translation between requirement phrasing and defect/log phrasing.
//!
//! This crate provides a small phrase-free SMT engine including:
//! - A tokenizer/normalizer with requirement-side stopword filtering
//! - Dice co-occurrence initialization of a lexical table
//! - IBM-Model-1 style EM refinement of that table
//! - A smoothed trigram language model over defect sentences
//! - A beam-search decoder and a keyword-extraction mode
//! - Whole-model persistence as a single versioned blob
//!
//! The high-level entry point is [`model::translator::Translator`].

/// Translation models, training stages and decoding.
pub mod model;

/// Error type shared by every fallible operation of the crate.
pub mod error;

/// Corpus and model file helpers.
pub mod io;

pub use error::{SmtError, SmtResult};
pub use model::config::SmtConfig;
pub use model::translator::Translator;
pub use model::tokenizer::{Sublanguage, TrainingPair};
