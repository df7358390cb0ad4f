use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rs_smt_core::model::cooccurrence::CooccurrenceCounts;
use rs_smt_core::model::decoder::Beam;
use rs_smt_core::model::em::NULL_TOKEN;
use rs_smt_core::model::language_model::Context;
use rs_smt_core::model::tokenizer::{AlignedPair, tokenize_filtered};
use rs_smt_core::{SmtConfig, Sublanguage, TrainingPair, Translator};

fn train(pairs: &[(&str, &str)]) -> Translator {
	let pairs: Vec<TrainingPair> = pairs.iter().map(|p| TrainingPair::from(*p)).collect();
	let mut translator = Translator::new(SmtConfig::default()).unwrap();
	translator.train(&pairs).unwrap();
	translator
}

const LATENCY_PAIRS: [(&str, &str); 2] = [
	("System latency must be under 500ms", "Error: Gateway Timeout 504"),
	("Response time shall not exceed 500ms", "TimeoutException after 5000ms"),
];

/// Builds a random corpus over small vocabularies, with stopwords mixed in.
fn random_corpus(seed: u64, size: usize) -> Vec<TrainingPair> {
	const REQUIREMENTS: [&str; 12] = [
		"latency", "checkout", "password", "database", "must", "the", "profile", "encrypt", "login",
		"system", "500ms", "unique",
	];
	const DEFECTS: [&str; 12] = [
		"timeout", "504", "autherror", "sql", "violation", ":", "error", "null", "pointer", "gateway",
		"5000ms", "the",
	];

	let mut rng = StdRng::seed_from_u64(seed);
	(0..size)
		.map(|_| {
			let requirement = random_sentence(&REQUIREMENTS, &mut rng);
			let defect = random_sentence(&DEFECTS, &mut rng);
			TrainingPair::new(&requirement, &defect)
		})
		.collect()
}

fn random_sentence(vocabulary: &[&str], rng: &mut StdRng) -> String {
	let len = rng.random_range(0..7);
	(0..len)
		.map(|_| vocabulary[rng.random_range(0..vocabulary.len())])
		.collect::<Vec<_>>()
		.join(" ")
}

#[test]
fn test_latency_scenario_keywords() {
	let translator = train(&LATENCY_PAIRS);
	let keywords = translator.keywords("Verify system latency is acceptable");
	assert_eq!(keywords.len(), 3);
	assert!(
		keywords
			.iter()
			.any(|k| ["timeout", "gateway", "504", "5000ms"].contains(&k.as_str())),
		"{keywords:?}"
	);
}

#[test]
fn test_latency_scenario_translation() {
	let translator = train(&LATENCY_PAIRS);
	let output = translator.translate("Verify system latency is acceptable");

	// Only "latency" is known; it is linked to the first defect sentence
	assert_eq!(output.len(), 1);
	assert!(
		["error", ":", "gateway", "timeout", "504"].contains(&output[0].as_str()),
		"{output:?}"
	);
}

#[test]
fn test_latency_scenario_with_repeated_evidence() {
	let translator = train(&[
		LATENCY_PAIRS[0],
		LATENCY_PAIRS[1],
		("Checkout latency should stay low", "Gateway Timeout on checkout"),
	]);
	let output = translator.translate("Verify system latency is acceptable");
	assert!(
		output.iter().any(|t| ["timeout", "gateway", "504", "5000ms"].contains(&t.as_str())),
		"{output:?}"
	);
}

#[test]
fn test_trace_defect_back_to_requirement() {
	let pairs: Vec<TrainingPair> = [
		("System latency must be under 500ms", "Error: Gateway Timeout 504"),
		("Response time shall not exceed 500ms", "TimeoutException after 5000ms"),
		("User profile must load quickly", "Latency warning: 1200ms"),
		("Database must enforce unique IDs", "SQL Integrity Constraint Violation"),
		("UI buttons must be blue", "CSS Style mismatch error"),
	]
	.iter()
	.map(|p| TrainingPair::from(*p))
	.collect();
	let mut tracer = Translator::with_source(SmtConfig::default(), Sublanguage::Defect).unwrap();
	tracer.train(&pairs).unwrap();

	// "504" only occurs with the latency requirement
	let keywords = tracer.keywords("504");
	assert_eq!(keywords.len(), 3);
	assert!(keywords.contains(&"latency".to_owned()), "{keywords:?}");
	assert_eq!(tracer.translate("504").len(), 1);

	let keywords = tracer.keywords("SQL Integrity Constraint Violation");
	assert!(
		keywords.iter().any(|k| ["database", "unique", "ids", "enforce"].contains(&k.as_str())),
		"{keywords:?}"
	);
	assert!(tracer.translate("Completely unknown").is_empty());
}

#[test]
fn test_empty_corpus() {
	let translator = train(&[]);
	assert!(translator.is_trained());
	assert!(translator.lexicon().is_empty());
	assert_eq!(translator.language_model().context_count(), 0);
	assert_eq!(translator.language_model().total(&Context::start()), 0);
	assert!(translator.translate("Verify system latency is acceptable").is_empty());
	assert!(translator.keywords("anything").is_empty());
}

#[test]
fn test_persistence_round_trip_decodes_identically() {
	let translator = train(&[
		LATENCY_PAIRS[0],
		LATENCY_PAIRS[1],
		("Latency warning must be raised", "Latency warning: 1200ms"),
		("Database must enforce unique IDs", "SQL Integrity Constraint Violation"),
		("UI buttons must be blue", "CSS Style mismatch error"),
	]);
	let bytes = translator.to_bytes().unwrap();

	let mut restored = Translator::default();
	restored.restore(&bytes).unwrap();

	for text in [
		"Verify system latency is acceptable",
		"Database IDs must be unique",
		"buttons",
		"",
	] {
		assert_eq!(restored.translate(text), translator.translate(text));
		assert_eq!(restored.keywords(text), translator.keywords(text));
	}
}

#[test]
fn test_dice_bound_on_random_corpora() {
	for seed in 0..5 {
		let pairs: Vec<AlignedPair> = random_corpus(seed, 40).iter().map(AlignedPair::from_pair).collect();
		let counts = CooccurrenceCounts::from_pairs(&pairs);
		let table = rs_smt_core::model::cooccurrence::initialize(&pairs, 0.1);
		for (s, t, _) in table.entries() {
			assert!(counts.dice(s, t) > 0.1, "seed {seed}: {s} -> {t}");
		}
	}
}

#[test]
fn test_em_normalization_on_random_corpora() {
	for seed in 0..5 {
		let corpus = random_corpus(seed, 40);
		let mut translator = Translator::new(SmtConfig::default()).unwrap();
		translator.train(&corpus).unwrap();

		for pair in &corpus {
			let has_target = !rs_smt_core::model::tokenizer::tokenize(&pair.defect).is_empty();
			if !has_target {
				continue;
			}
			for source in tokenize_filtered(&pair.requirement) {
				let sum = translator.lexicon().row_sum(&source);
				assert!((sum - 1.0).abs() < 1e-6, "seed {seed}: {source} sums to {sum}");
			}
			let null_sum = translator.lexicon().row_sum(NULL_TOKEN);
			assert!((null_sum - 1.0).abs() < 1e-6);
		}
	}
}

#[test]
fn test_language_model_consistency_on_random_corpora() {
	for seed in 0..5 {
		let translator = {
			let mut t = Translator::default();
			t.train(&random_corpus(seed, 40)).unwrap();
			t
		};
		for (context, transitions, total) in translator.language_model().contexts() {
			assert_eq!(transitions.map(|(_, c)| c).sum::<u64>(), total, "{context:?}");
			assert!(total > 0);
		}
		let unseen = translator.language_model().score("x", &Context::new("never", "seen"));
		assert!(unseen.is_finite());
	}
}

#[test]
fn test_beam_bounded_and_deterministic_on_random_corpora() {
	for seed in 0..5 {
		let corpus = random_corpus(seed, 40);
		let config = SmtConfig::default().with_beam_width(3);
		let mut translator = Translator::new(config).unwrap();
		translator.train(&corpus).unwrap();

		let decoder = translator.decoder();
		for pair in corpus.iter().take(10) {
			let tokens = tokenize_filtered(&pair.requirement);
			let mut beam = Beam::new(3);
			for token in &tokens {
				beam = decoder.step(&beam, token);
				assert!(beam.len() <= 3);
			}
			let output = translator.translate(&pair.requirement);
			assert_eq!(beam.best().map(|h| h.tokens().to_vec()).unwrap_or_default(), output);
			assert_eq!(translator.translate(&pair.requirement), output);
		}
	}
}
