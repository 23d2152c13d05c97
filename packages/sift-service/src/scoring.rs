//! Composite score for a single candidate and the total order over scored candidates.

use std::{cmp::Ordering, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{ScoringWeights, UsageFactors};
use sift_domain::{Category, MatchResult, MatchType, matching};

pub const QUALITY_SCALE: f64 = 1_000.0;
pub const MAX_FINAL_SCORE: i64 = 10_000_000;

/// One item offered by a category provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtitle: Option<String>,
	pub category: Category,
	pub identifier: String,
}
impl Candidate {
	pub fn new(category: Category, identifier: impl Into<String>, title: impl Into<String>) -> Self {
		Self { title: title.into(), subtitle: None, category, identifier: identifier.into() }
	}

	pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
		self.subtitle = Some(subtitle.into());

		self
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtitle: Option<String>,
	pub category: Category,
	pub identifier: String,
	pub raw_match: MatchResult,
	pub final_score: i64,
}

/// Stateless per call; cloning shares the weight snapshot and usage provider.
#[derive(Clone)]
pub struct Scorer {
	weights: Arc<ScoringWeights>,
	usage: Arc<dyn UsageFactors>,
}
impl Scorer {
	pub fn new(weights: Arc<ScoringWeights>, usage: Arc<dyn UsageFactors>) -> Self {
		Self { weights, usage }
	}

	pub fn weights(&self) -> &ScoringWeights {
		&self.weights
	}

	/// Returns `None` when the candidate does not match and must be discarded.
	pub fn score(&self, query: &str, candidate: Candidate) -> Option<ScoredCandidate> {
		let raw_match = best_match(query, &candidate);

		if raw_match.match_type == MatchType::NoMatch {
			return None;
		}

		let usage = self.usage.factor(candidate.category, &candidate.identifier);
		let final_score = final_score(
			raw_match.quality,
			self.weights.weight(candidate.category),
			self.weights.bonus(raw_match.match_type),
			usage,
		)?;
		let Candidate { title, subtitle, category, identifier } = candidate;

		Some(ScoredCandidate { title, subtitle, category, identifier, raw_match, final_score })
	}
}

/// Title match, replaced by the subtitle match only when that one is strictly better.
fn best_match(query: &str, candidate: &Candidate) -> MatchResult {
	let title_match = matching::analyze(query, &candidate.title);

	if title_match.quality >= 1.0 {
		return title_match;
	}

	let Some(subtitle) = candidate.subtitle.as_deref() else { return title_match };
	let subtitle_match = matching::analyze(query, subtitle);

	if subtitle_match.quality > title_match.quality { subtitle_match } else { title_match }
}

fn final_score(quality: f64, weight: f64, bonus: f64, usage: f64) -> Option<i64> {
	let raw = quality * QUALITY_SCALE * weight * bonus * usage;

	if raw.is_nan() {
		return None;
	}

	Some(raw.round().clamp(0.0, MAX_FINAL_SCORE as f64) as i64)
}

/// Descending score, then shorter title, then title text. Equal keys compare equal so a stable
/// sort keeps provider order.
pub fn cmp_ranked(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
	b.final_score
		.cmp(&a.final_score)
		.then_with(|| a.title.chars().count().cmp(&b.title.chars().count()))
		.then_with(|| a.title.cmp(&b.title))
}

pub fn rank(items: &mut [ScoredCandidate]) {
	items.sort_by(cmp_ranked);
}
