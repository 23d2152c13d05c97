use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{Error, Result, ScoredCandidate, SiftService, SpanReport, scoring};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_results: Option<u32>,
}
impl SearchRequest {
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into(), max_results: None }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub trace_id: Uuid,
	pub query: String,
	pub items: Vec<ScoredCandidate>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub trace: Option<SpanReport>,
}

impl SiftService {
	/// Runs every registered provider concurrently, scores their candidates and returns the
	/// merged results in rank order.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let max_results = match req.max_results {
			Some(0) => {
				return Err(Error::InvalidRequest {
					message: "max_results must be greater than zero.".to_string(),
				});
			},
			Some(value) => value,
			None => self.cfg.search.max_results,
		};
		let trace_id = Uuid::new_v4();
		let query = req.query.trim().to_string();

		if query.chars().count() < self.cfg.search.min_query_chars as usize {
			return Ok(SearchResponse { trace_id, query, items: Vec::new(), trace: None });
		}

		let root = self.tracer.start_root(&query);

		root.set_tag("trace_id", trace_id.to_string());
		root.set_tag("providers", self.providers.len());

		let shared_query: Arc<str> = Arc::from(query.as_str());
		let scorer = self.scorer();
		let mut tasks = JoinSet::new();

		for (index, provider) in self.providers.iter().enumerate() {
			let provider = Arc::clone(provider);
			let tracer = Arc::clone(&self.tracer);
			let root = root.clone();
			let query = Arc::clone(&shared_query);
			let scorer = scorer.clone();
			let name = provider.name().to_string();

			tasks.spawn(async move {
				let items = tracer
					.trace_category_async(&name, &root, |span| async move {
						let candidates = provider.candidates(&query).await;
						let scoring_span = span.child("score");

						scoring_span.set_tag("candidates", candidates.len());

						let scored: Vec<ScoredCandidate> = candidates
							.into_iter()
							.filter_map(|candidate| scorer.score(&query, candidate))
							.collect();

						scoring_span.set_tag("scored", scored.len());
						scoring_span.finish();

						scored
					})
					.await;

				(index, items)
			});
		}

		let mut slots: Vec<Vec<ScoredCandidate>> = vec![Vec::new(); self.providers.len()];

		while let Some(joined) = tasks.join_next().await {
			match joined {
				Ok((index, items)) => slots[index] = items,
				Err(err) => {
					tracing::error!(
						error = %err,
						trace_id = %trace_id,
						"Category search task failed. Dropping its results."
					);
				},
			}
		}

		// Concatenating in registration order keeps the merge independent of completion order.
		let mut items: Vec<ScoredCandidate> = slots.into_iter().flatten().collect();

		scoring::rank(&mut items);
		items.truncate(max_results as usize);

		root.set_tag("resultsCount", items.len());
		root.finish();
		self.tracer.emit(&root);

		let trace = (!root.is_disabled()).then(|| root.report());

		Ok(SearchResponse { trace_id, query, items, trace })
	}
}
