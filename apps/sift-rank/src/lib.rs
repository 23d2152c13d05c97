use std::{
	fs,
	path::{Path, PathBuf},
	sync::Arc,
};

use clap::Parser;
use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use sift_config::Config;
use sift_domain::Category;
use sift_service::{
	BoxFuture, Candidate, CategoryProvider, NeutralUsage, ScoredCandidate, SearchRequest,
	SiftService, SpanReport,
};
use sift_storage::{ConfigStore, FileStore, MemoryStore};

#[derive(Debug, Parser)]
#[command(
	version = sift_cli::VERSION,
	rename_all = "kebab",
	styles = sift_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,
	#[arg(long, short = 'd', value_name = "FILE")]
	pub dataset: PathBuf,
	/// Replaces the queries listed in the dataset.
	#[arg(long = "query", short = 'q', value_name = "QUERY")]
	pub queries: Vec<String>,
	#[arg(long, value_name = "N")]
	pub max_results: Option<u32>,
	/// Collect span trees for every query.
	#[arg(long)]
	pub trace: bool,
	/// Emit span trees through the log as well.
	#[arg(long)]
	pub trace_output: bool,
}

#[derive(Debug, Deserialize)]
pub struct Dataset {
	pub providers: Vec<DatasetProvider>,
	#[serde(default)]
	pub queries: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetProvider {
	pub name: String,
	pub category: Category,
	pub candidates: Vec<DatasetCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetCandidate {
	pub title: String,
	pub subtitle: Option<String>,
	pub identifier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RankOutput {
	pub provider_count: usize,
	pub queries: Vec<QueryReport>,
}

#[derive(Debug, Serialize)]
pub struct QueryReport {
	pub query: String,
	pub trace_id: Uuid,
	pub result_count: usize,
	pub items: Vec<ScoredCandidate>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub total_trace_ms: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub trace: Option<SpanReport>,
}

/// Serves a fixed candidate list for one category.
pub struct StaticProvider {
	name: String,
	category: Category,
	candidates: Vec<Candidate>,
}
impl StaticProvider {
	pub fn from_dataset(provider: DatasetProvider) -> Self {
		let DatasetProvider { name, category, candidates } = provider;
		let candidates = candidates
			.into_iter()
			.enumerate()
			.map(|(index, candidate)| Candidate {
				identifier: candidate.identifier.unwrap_or_else(|| format!("{name}:{index}")),
				title: candidate.title,
				subtitle: candidate.subtitle,
				category,
			})
			.collect();

		Self { name, category, candidates }
	}
}
impl CategoryProvider for StaticProvider {
	fn name(&self) -> &str {
		&self.name
	}

	fn category(&self) -> Category {
		self.category
	}

	fn candidates<'a>(&'a self, _query: &'a str) -> BoxFuture<'a, Vec<Candidate>> {
		let candidates = self.candidates.clone();

		Box::pin(async move { candidates })
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = match args.config.as_deref() {
		Some(path) => sift_config::load(path)?,
		None => Config::default(),
	};
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let store = open_store(&config)?;
	let dataset = load_dataset(&args.dataset)?;
	let output = rank(config, store, dataset, &args).await?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

pub fn open_store(config: &Config) -> color_eyre::Result<Arc<dyn ConfigStore>> {
	match config.storage.path.as_ref() {
		Some(path) => Ok(Arc::new(FileStore::open(path)?)),
		None => Ok(Arc::new(MemoryStore::new())),
	}
}

pub fn load_dataset(path: &Path) -> color_eyre::Result<Dataset> {
	let raw = fs::read_to_string(path)?;
	let dataset: Dataset = serde_json::from_str(&raw)?;

	if dataset.providers.is_empty() {
		return Err(eyre::eyre!("Dataset must include at least one provider."));
	}

	Ok(dataset)
}

pub async fn rank(
	config: Config,
	store: Arc<dyn ConfigStore>,
	dataset: Dataset,
	args: &Args,
) -> color_eyre::Result<RankOutput> {
	let queries = if args.queries.is_empty() { dataset.queries } else { args.queries.clone() };

	if queries.is_empty() {
		return Err(eyre::eyre!("No queries given. Pass --query or list them in the dataset."));
	}

	let mut service = SiftService::new(config, store, Arc::new(NeutralUsage));

	if args.trace {
		service.tracer.set_enabled(true);
	}
	if args.trace_output {
		service.tracer.set_output_enabled(true);
	}

	for provider in dataset.providers {
		service.register(Arc::new(StaticProvider::from_dataset(provider)));
	}

	let mut reports = Vec::with_capacity(queries.len());

	for query in queries {
		let response = service
			.search(SearchRequest { query, max_results: args.max_results })
			.await?;

		tracing::debug!(
			trace_id = %response.trace_id,
			results = response.items.len(),
			"Ranked query."
		);

		reports.push(QueryReport {
			query: response.query,
			trace_id: response.trace_id,
			result_count: response.items.len(),
			items: response.items,
			total_trace_ms: response.trace.as_ref().map(SpanReport::total_duration_ms),
			trace: response.trace,
		});
	}

	Ok(RankOutput { provider_count: service.providers().len(), queries: reports })
}
