use rs_smt_core::{SmtConfig, Sublanguage, TrainingPair, Translator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows every EM iteration and decode
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Mock data: (Requirement, Defect log)
    let data = [
        ("The system must verify user password", "AuthError: Invalid Credentials 401"),
        ("The checkout latency should be under 500ms", "TimeoutException: Gateway 504"),
        ("User profile image must be PNG format", "UploadFailed: Invalid MimeType"),
        ("Password must be 8 characters", "AuthError: Validation Length Failed"),
        ("System latency must be under 500ms", "Error: Gateway Timeout 504"),
        ("Response time shall not exceed 500ms", "TimeoutException after 5000ms"),
        ("Database must enforce unique IDs", "SQL Integrity Constraint Violation"),
        ("UI buttons must be blue", "CSS Style mismatch error"),
    ];
    let pairs: Vec<TrainingPair> = data.iter().map(|p| TrainingPair::from(*p)).collect();

    // Every constant can be tuned; the defaults follow the reference setup
    // (5 EM iterations, beam of 5, add-0.1 smoothing over 1000 types)
    let config = SmtConfig::default().with_em_iterations(5).with_beam_width(5);

    // Out-of-range values are rejected before any training happens
    match Translator::new(SmtConfig::default().with_beam_width(0)) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Beam width 0 is invalid: {e}"),
    }

    // A translator is trained exactly once
    log::info!("Training on {} mock pairs", pairs.len());
    let mut model = Translator::new(config)?;
    model.train(&pairs)?;
    match model.train(&pairs) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Second training rejected: {e}"),
    }

    let stats = model.stats();
    println!(
        "Trained on {} pairs, length ratio {:.2}, {} lexical entries",
        stats.pairs,
        stats.len_ratio,
        model.lexicon().len()
    );

    // Translation mode returns defect tokens, keyword mode the best three
    for requirement in [
        "Verify user password length",
        "Verify system latency is acceptable",
        "Database IDs must be unique",
        "Completely unrelated sentence",
    ] {
        println!("Input requirement: '{requirement}'");
        println!("  Predicted defect: '{}'", model.translate_to_string(requirement));
        println!("  Keywords: {:?}", model.keywords(requirement));
    }

    // The same pairs train the other direction: defects traced back to requirement keywords
    let mut tracer = Translator::with_source(SmtConfig::default(), Sublanguage::Defect)?;
    tracer.train(&pairs)?;
    for defect in ["Error code 504", "SQL Integrity Constraint Violation"] {
        println!("Input defect: '{defect}'");
        println!("  Requirement keywords: {:?}", tracer.keywords(defect));
    }

    // The whole model is one blob; restoring it gives identical output
    let bytes = model.to_bytes()?;
    let mut restored = Translator::default();
    restored.restore(&bytes)?;
    println!("Blob of {} bytes restored", bytes.len());
    assert_eq!(
        restored.translate("Verify user password length"),
        model.translate("Verify user password length")
    );

    // A damaged blob is reported, never silently used
    match Translator::from_bytes(&bytes[..bytes.len() / 3]) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Damaged blob rejected: {e}"),
    }

    Ok(())
}
