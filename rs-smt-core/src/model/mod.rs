//! Top-level module for the translation system.
//!
//! This module provides the whole training and decoding pipeline:
//! - Text normalization and sentence roles (`tokenizer`)
//! - Tunable constants (`SmtConfig`)
//! - The sparse lexical translation table (`LexicalTable`)
//! - Dice initialization and EM refinement of that table
//! - The trigram language model (`LanguageModel`)
//! - Beam-search decoding (`Decoder`)
//! - The owning, persistable model (`Translator`)

/// Normalization, stopword filtering and sentence roles.
pub mod tokenizer;

/// Named hyperparameters of training and decoding.
pub mod config;

/// Sparse `source -> target -> probability` table.
pub mod lexical_table;

/// Dice co-occurrence initialization of the lexical table.
pub mod cooccurrence;

/// Expectation-Maximization refinement (IBM Model 1 with a null source).
pub mod em;

/// Add-k smoothed trigram language model over defect sentences.
pub mod language_model;

/// Internal representation of one language-model context.
///
/// Tracks next-token counts and their total.
/// This module is not exposed publicly.
mod state;

/// Beam search over lexical candidates scored with the language model.
pub mod decoder;

/// The owning model: training, translation and persistence.
pub mod translator;
