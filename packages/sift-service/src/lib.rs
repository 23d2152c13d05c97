pub mod scoring;
pub mod search;
pub mod time_serde;
pub mod trace;
pub mod usage;
pub mod weights;

mod error;

pub use error::{Error, Result};
pub use scoring::{Candidate, ScoredCandidate, Scorer, cmp_ranked, rank};
pub use search::{SearchRequest, SearchResponse};
pub use trace::{Span, SpanReport, TagValue, Tracer};
pub use usage::{NeutralUsage, UsageFactors};
pub use weights::ScoringWeights;

use std::{future::Future, pin::Pin, sync::Arc};

use sift_config::Config;
use sift_domain::Category;
use sift_storage::ConfigStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of candidates for one result category, such as applications or contacts.
pub trait CategoryProvider
where
	Self: Send + Sync,
{
	fn name(&self) -> &str;

	fn category(&self) -> Category;

	fn candidates<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Vec<Candidate>>;
}

/// Search session: the configuration and weight snapshot plus the registered providers.
pub struct SiftService {
	pub cfg: Config,
	pub tracer: Arc<Tracer>,
	store: Arc<dyn ConfigStore>,
	weights: Arc<ScoringWeights>,
	usage: Arc<dyn UsageFactors>,
	providers: Vec<Arc<dyn CategoryProvider>>,
}
impl SiftService {
	/// Loads the weight table and tracer flags from `store` once for the whole session.
	pub fn new(cfg: Config, store: Arc<dyn ConfigStore>, usage: Arc<dyn UsageFactors>) -> Self {
		let weights = Arc::new(ScoringWeights::load(store.as_ref()));
		let tracer = Arc::new(Tracer::from_store(store.as_ref(), cfg.tracing));

		Self { cfg, tracer, store, weights, usage, providers: Vec::new() }
	}

	pub fn with_provider(mut self, provider: Arc<dyn CategoryProvider>) -> Self {
		self.register(provider);

		self
	}

	/// Provider registration order is the final tie-breaker between fully equal results.
	pub fn register(&mut self, provider: Arc<dyn CategoryProvider>) {
		self.providers.push(provider);
	}

	pub fn providers(&self) -> &[Arc<dyn CategoryProvider>] {
		&self.providers
	}

	pub fn weights(&self) -> &ScoringWeights {
		&self.weights
	}

	pub fn scorer(&self) -> Scorer {
		Scorer::new(Arc::clone(&self.weights), Arc::clone(&self.usage))
	}

	/// Persists `weights`. The running session keeps its snapshot; new sessions load the update.
	pub fn save_weights(&self, weights: &ScoringWeights) -> Result<()> {
		weights.save(self.store.as_ref())
	}

	pub fn save_tracing_flags(&self) -> Result<()> {
		self.tracer.persist(self.store.as_ref())
	}

	pub fn record_selection(&self, category: Category, identifier: &str) {
		self.usage.record_selection(category, identifier);
	}
}
