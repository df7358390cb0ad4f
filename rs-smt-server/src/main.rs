use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware, post, web};
use clap::Parser;
use serde::{Deserialize, Serialize};

use rs_smt_core::{SmtConfig, Sublanguage, Translator};

/// Command-line / environment configuration of the server.
#[derive(Parser, Debug)]
#[command(author, version, about = "Requirement to defect translation server")]
struct Args {
	/// Training corpus (`requirement<TAB>defect` per line). A `.bin` cache next to it is reused.
	#[arg(long, env = "SMT_CORPUS", default_value = "./data/traceability.tsv")]
	corpus: PathBuf,

	/// Serve a saved requirement-to-defect model blob instead of the corpus.
	#[arg(long, env = "SMT_MODEL")]
	model: Option<PathBuf>,

	/// Serve a saved defect-to-requirement model blob instead of the corpus.
	#[arg(long, env = "SMT_TRACE_MODEL")]
	trace_model: Option<PathBuf>,

	#[arg(long, env = "SMT_HOST", default_value = "127.0.0.1")]
	host: String,

	#[arg(long, env = "SMT_PORT", default_value_t = 5000)]
	port: u16,

	/// EM iterations used when training from the corpus.
	#[arg(long, env = "SMT_EM_ITERATIONS", default_value_t = 5)]
	em_iterations: usize,
}

/// Body of `/v1/translate` and `/v1/keywords`.
#[derive(Deserialize)]
struct TextRequest {
	#[serde(default)]
	text: String,
}

/// Body of `/v1/trace`.
#[derive(Deserialize)]
struct TraceRequest {
	#[serde(default)]
	defect: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct TranslateResponse {
	tokens: Vec<String>,
	translation: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct KeywordsResponse {
	keywords: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct TraceResponse {
	keywords: Vec<String>,
	tokens: Vec<String>,
	translation: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct ModelSummary {
	source: Sublanguage,
	target: Sublanguage,
	trained: bool,
	pairs: usize,
	len_ratio: f64,
	lexical_entries: usize,
	contexts: usize,
}

#[derive(Serialize, Deserialize, Debug)]
struct ModelsSummary {
	translate: ModelSummary,
	trace: ModelSummary,
}

impl ModelSummary {
	fn of(translator: &Translator) -> Self {
		let stats = translator.stats();
		Self {
			source: translator.source(),
			target: translator.target(),
			trained: translator.is_trained(),
			pairs: stats.pairs,
			len_ratio: stats.len_ratio,
			lexical_entries: translator.lexicon().len(),
			contexts: translator.language_model().context_count(),
		}
	}
}

/// Both directions, trained once and shared read-only by every worker.
struct Translators {
	/// Requirement to defect.
	translate: Translator,
	/// Defect to requirement.
	trace: Translator,
}

#[derive(Serialize)]
struct Status {
	status: &'static str,
}

#[get("/v1/health")]
async fn get_health() -> impl Responder {
	HttpResponse::Ok().json(Status { status: "online" })
}

/// HTTP GET endpoint `/v1/model`
///
/// Describes both loaded models.
#[get("/v1/model")]
async fn get_model(translators: web::Data<Translators>) -> impl Responder {
	HttpResponse::Ok().json(ModelsSummary {
		translate: ModelSummary::of(&translators.translate),
		trace: ModelSummary::of(&translators.trace),
	})
}

/// HTTP POST endpoint `/v1/translate`
///
/// Translates requirement text into defect tokens.
#[post("/v1/translate")]
async fn post_translate(translators: web::Data<Translators>, request: web::Json<TextRequest>) -> impl Responder {
	let tokens = translators.translate.translate(&request.text);
	log::debug!("translate {:?} -> {:?}", request.text, tokens);
	let translation = tokens.join(" ");
	HttpResponse::Ok().json(TranslateResponse { tokens, translation })
}

/// HTTP POST endpoint `/v1/keywords`
///
/// Returns the best defect keywords for requirement text.
#[post("/v1/keywords")]
async fn post_keywords(translators: web::Data<Translators>, request: web::Json<TextRequest>) -> impl Responder {
	let keywords = translators.translate.keywords(&request.text);
	HttpResponse::Ok().json(KeywordsResponse { keywords })
}

/// HTTP POST endpoint `/v1/trace`
///
/// Traces a defect back to requirement keywords and tokens.
#[post("/v1/trace")]
async fn post_trace(translators: web::Data<Translators>, request: web::Json<TraceRequest>) -> impl Responder {
	let tracer = &translators.trace;
	let keywords = tracer.keywords(&request.defect);
	let tokens = tracer.translate(&request.defect);
	log::debug!("trace {:?} -> {:?}", request.defect, keywords);
	let translation = tokens.join(" ");
	HttpResponse::Ok().json(TraceResponse { keywords, tokens, translation })
}

/// Registers every endpoint on an app.
fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_health)
		.service(get_model)
		.service(post_translate)
		.service(post_keywords)
		.service(post_trace);
}

/// Trains or loads the `source` direction described by `args`.
fn load_translator(args: &Args, model: Option<&PathBuf>, source: Sublanguage) -> rs_smt_core::SmtResult<Translator> {
	match model {
		Some(path) => {
			log::info!("Loading {:?} model {}", source, path.display());
			Translator::load_from_file(path)
		}
		None => {
			log::info!("Preparing {:?} model from corpus {}", source, args.corpus.display());
			let config = SmtConfig::default().with_em_iterations(args.em_iterations);
			Translator::from_corpus(&args.corpus, config, source)
		}
	}
}

fn load_translators(args: &Args) -> rs_smt_core::SmtResult<Translators> {
	Ok(Translators {
		translate: load_translator(args, args.model.as_ref(), Sublanguage::Requirement)?,
		trace: load_translator(args, args.trace_model.as_ref(), Sublanguage::Defect)?,
	})
}

/// Main entry point for the server.
///
/// Trains (or loads) both translators once, then shares them read-only
/// with every worker.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let translators = load_translators(&args).map_err(std::io::Error::other)?;
	log::info!(
		"Models ready: {} pairs, {} + {} lexical entries",
		translators.translate.stats().pairs,
		translators.translate.lexicon().len(),
		translators.trace.lexicon().len()
	);
	let shared_translators = web::Data::new(translators);

	log::info!("Listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_translators.clone())
			.configure(configure)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}
