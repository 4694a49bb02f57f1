use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::{get, middleware, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use log::info;
use serde::Deserialize;

use lango_core::corpus::{list_corpora, read_corpora};
use lango_core::model::{Chain, ChainError, DEFAULT_LOOKBACK, DEFAULT_MAX_LENGTH};

/// Extension of the corpus files served from the data folder.
const CORPUS_EXTENSION: &str = "txt";

/// Upper bound on the words returned by a single `/v1/generate` call.
const MAX_COUNT: usize = 100;

/// Command-line configuration of the server.
#[derive(Parser, Debug)]
#[command(name = "lango-server", version, about = "Serves made-up words over HTTP")]
struct Args {
	/// Address to bind
	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	/// Port to bind
	#[arg(long, default_value_t = 5000)]
	port: u16,

	/// Folder holding the `.txt` corpora
	#[arg(long, default_value = "./data")]
	data: String,

	/// Number of preceding characters used to choose the next one
	#[arg(long, default_value_t = DEFAULT_LOOKBACK, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
	lookback: usize,

	/// Longest word the generator may produce before giving up
	#[arg(long, default_value_t = DEFAULT_MAX_LENGTH, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
	max_length: usize,

	/// Corpus names to load at startup, can be specified multiple times
	#[arg(long = "corpus", value_name = "NAME")]
	corpora: Vec<String>,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	count: Option<usize>,
}

#[derive(Deserialize)]
struct CorpusQuery {
	names: Option<String>,
}

/// Immutable settings shared by every worker.
struct Settings {
	data_dir: PathBuf,
	lookback: usize,
	max_length: usize,
}

/// The trained chain and the corpora it was trained on.
///
/// Generation only needs a read lock; loading trains a fresh chain
/// off-lock and swaps it in under the write lock.
struct SharedData {
	chain: Chain,
	corpora: Vec<String>,
}

impl Settings {
	/// Path of the named corpus; names that would leave the data folder are refused.
	fn corpus_path(&self, name: &str) -> Result<PathBuf, String> {
		if !is_corpus_name(name) {
			return Err(format!("Invalid corpus name: {name:?}"));
		}
		Ok(self.data_dir.join(format!("{name}.{CORPUS_EXTENSION}")))
	}
}

/// A corpus name is a single plain file stem, no separators or `..`.
fn is_corpus_name(name: &str) -> bool {
	let mut components = Path::new(name).components();
	matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
		&& !name.contains(['/', '\\'])
}

/// Resolves the `--data` argument; a bare `.` means the working directory.
fn resolve_data_dir(data: &str) -> PathBuf {
	match data.trim_end_matches('/') {
		"." => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(data)),
		_ => PathBuf::from(data),
	}
}

impl SharedData {
	/// Reads and trains on the named corpora from the data folder.
	fn load(settings: &Settings, names: &[String]) -> Result<Self, String> {
		let paths = names
			.iter()
			.map(|name| settings.corpus_path(name))
			.collect::<Result<Vec<_>, _>>()?;

		let words = read_corpora(&paths).map_err(|e| e.to_string())?;
		let chain = Chain::train_parallel(settings.lookback, &words)
			.and_then(|chain| chain.with_max_length(settings.max_length))
			.map_err(|e| e.to_string())?;

		info!("loaded corpora {:?}: {} words, {} contexts", names, words.len(), chain.len());
		Ok(Self { chain, corpora: names.to_vec() })
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` words (default 1) from the loaded chain, one per line.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<RwLock<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let count = query.count.unwrap_or(1);
	if !(1..=MAX_COUNT).contains(&count) {
		return HttpResponse::BadRequest().body(format!("Count must be between 1 and {MAX_COUNT}"));
	}

	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let mut words = Vec::with_capacity(count);
	for _ in 0..count {
		match shared_data.chain.make_word() {
			Ok(word) => words.push(word),
			Err(e @ ChainError::UntrainedContext { .. }) => {
				return HttpResponse::Conflict().body(format!("No corpus loaded: {e}"));
			}
			Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
		}
	}

	HttpResponse::Ok().body(words.join("\n"))
}

#[get("/v1/corpora")]
async fn get_corpora(settings: web::Data<Settings>) -> impl Responder {
	match list_corpora(&settings.data_dir, CORPUS_EXTENSION) {
		Ok(names) => HttpResponse::Ok().body(names.join("\n")),
		Err(_) => HttpResponse::InternalServerError().body("Failed to list corpora"),
	}
}

#[get("/v1/loaded_corpora")]
async fn get_loaded_corpora(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.corpora.join("\n"))
}

#[put("/v1/load_corpora")]
async fn put_corpora(
	data: web::Data<RwLock<SharedData>>,
	settings: web::Data<Settings>,
	query: web::Query<CorpusQuery>,
) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty corpus name"),
	};

	let names: Vec<String> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.map(str::to_owned)
		.collect();

	if let Some(name) = names.iter().find(|name| !is_corpus_name(name)) {
		return HttpResponse::BadRequest().body(format!("Invalid corpus name: {name:?}"));
	}

	// Training is CPU bound, keep it off the async workers
	let loaded = match web::block(move || SharedData::load(&settings, &names)).await {
		Ok(Ok(loaded)) => loaded,
		Ok(Err(e)) => return HttpResponse::InternalServerError().body(format!("Failed to load corpora: {e}")),
		Err(_) => return HttpResponse::InternalServerError().body("Training task failed"),
	};

	let mut shared_data = match data.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	*shared_data = loaded;

	HttpResponse::Ok().body("Corpora loaded successfully")
}

/// Registers every endpoint.
fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(get_corpora)
		.service(get_loaded_corpora)
		.service(put_corpora);
}

/// Main entry point for the server.
///
/// Trains on the startup corpora (if any), wraps the chain in a `RwLock`
/// so requests generate concurrently, and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();
	let args = Args::parse();

	let settings = Settings {
		data_dir: resolve_data_dir(&args.data),
		lookback: args.lookback,
		max_length: args.max_length,
	};

	let shared_data = SharedData::load(&settings, &args.corpora).map_err(std::io::Error::other)?;
	let shared_model = web::Data::new(RwLock::new(shared_data));
	let settings = web::Data::new(settings);

	info!("listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(middleware::Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.app_data(settings.clone())
			.configure(configure)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;
	use std::fs;
	use tempfile::TempDir;

	fn empty(settings: &Settings) -> SharedData {
		SharedData::load(settings, &[]).unwrap()
	}

	fn settings(dir: &TempDir) -> Settings {
		Settings { data_dir: dir.path().to_owned(), lookback: 2, max_length: DEFAULT_MAX_LENGTH }
	}

	fn data_dir() -> TempDir {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("cats.txt"), "cat Cat CAT!").unwrap();
		fs::write(dir.path().join("dogs.txt"), "dog").unwrap();
		dir
	}

	macro_rules! app {
		($settings:expr, $shared:expr) => {
			test::init_service(
				App::new()
					.app_data(web::Data::new(RwLock::new($shared)))
					.app_data(web::Data::new($settings))
					.configure(configure),
			)
			.await
		};
	}

	#[actix_web::test]
	async fn generate_without_corpus_conflicts() {
		let dir = data_dir();
		let shared = empty(&settings(&dir));
		let app = app!(settings(&dir), shared);

		let req = test::TestRequest::get().uri("/v1/generate").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::CONFLICT);
	}

	#[actix_web::test]
	async fn generate_returns_requested_count() {
		let dir = data_dir();
		let shared = SharedData::load(&settings(&dir), &["cats".to_owned()]).unwrap();
		let app = app!(settings(&dir), shared);

		let req = test::TestRequest::get().uri("/v1/generate?count=3").to_request();
		let body = test::call_and_read_body(&app, req).await;
		assert_eq!(body, "cat\ncat\ncat");
	}

	#[actix_web::test]
	async fn generate_rejects_bad_count() {
		let dir = data_dir();
		let shared = SharedData::load(&settings(&dir), &["cats".to_owned()]).unwrap();
		let app = app!(settings(&dir), shared);

		for uri in ["/v1/generate?count=0", "/v1/generate?count=101"] {
			let req = test::TestRequest::get().uri(uri).to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
		}
	}

	#[actix_web::test]
	async fn corpora_are_listed() {
		let dir = data_dir();
		let shared = empty(&settings(&dir));
		let app = app!(settings(&dir), shared);

		let req = test::TestRequest::get().uri("/v1/corpora").to_request();
		let body = test::call_and_read_body(&app, req).await;
		assert_eq!(body, "cats\ndogs");
	}

	#[actix_web::test]
	async fn load_then_generate() {
		let dir = data_dir();
		let shared = empty(&settings(&dir));
		let app = app!(settings(&dir), shared);

		let req = test::TestRequest::put().uri("/v1/load_corpora?names=dogs").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);

		let req = test::TestRequest::get().uri("/v1/loaded_corpora").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "dogs");

		let req = test::TestRequest::get().uri("/v1/generate").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "dog");
	}

	#[actix_web::test]
	async fn load_requires_names() {
		let dir = data_dir();
		let shared = empty(&settings(&dir));
		let app = app!(settings(&dir), shared);

		let req = test::TestRequest::put().uri("/v1/load_corpora?names=%20").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn load_refuses_names_outside_data_folder() {
		let root = data_dir();
		let data = root.path().join("data");
		fs::create_dir(&data).unwrap();
		fs::write(data.join("birds.txt"), "owl").unwrap();
		let settings = || Settings { data_dir: data.clone(), lookback: 2, max_length: DEFAULT_MAX_LENGTH };
		let app = app!(settings(), empty(&settings()));

		for names in ["../cats", "..", "birds,../dogs", "sub%2Fbirds", "%2Ftmp%2Fcats"] {
			let req = test::TestRequest::put().uri(&format!("/v1/load_corpora?names={names}")).to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{names}");
		}

		let req = test::TestRequest::get().uri("/v1/loaded_corpora").to_request();
		assert_eq!(test::call_and_read_body(&app, req).await, "");

		assert!(SharedData::load(&settings(), &["../cats".to_owned()]).is_err());
	}

	#[actix_web::test]
	async fn corpus_names_are_plain_stems() {
		assert!(is_corpus_name("french"));
		assert!(is_corpus_name("old-english"));
		for name in ["", ".", "..", "../french", "a/b", "a\\b", "/french"] {
			assert!(!is_corpus_name(name), "{name:?}");
		}
	}

	#[actix_web::test]
	async fn dot_data_dir_is_working_directory() {
		let cwd = std::env::current_dir().unwrap();
		assert_eq!(resolve_data_dir("."), cwd);
		assert_eq!(resolve_data_dir("./"), cwd);
		assert_eq!(resolve_data_dir("./data"), PathBuf::from("./data"));
	}

	#[actix_web::test]
	async fn load_of_missing_corpus_fails() {
		let dir = data_dir();
		let shared = empty(&settings(&dir));
		let app = app!(settings(&dir), shared);

		let req = test::TestRequest::put().uri("/v1/load_corpora?names=birds").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
