//! Per-category and per-match-type multipliers applied on top of match quality.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Result;
use sift_domain::{Category, MatchType};
use sift_storage::{ConfigStore, SCORING_WEIGHTS_KEY};

/// Multiplier used for any variant missing from a stored table.
pub const NEUTRAL_WEIGHT: f64 = 1.0;

const DEFAULT_CATEGORY_WEIGHTS: [(Category, f64); 13] = [
	(Category::Application, 1.2),
	(Category::Conversion, 1.1),
	(Category::Calendar, 0.9),
	(Category::Action, 1.0),
	(Category::GlobalAction, 1.0),
	(Category::Quicklink, 1.1),
	(Category::Contact, 0.9),
	(Category::Clipboard, 0.7),
	(Category::File, 0.8),
	(Category::Process, 0.8),
	(Category::Toggle, 1.0),
	(Category::Settings, 1.0),
	(Category::Emoji, 0.6),
];
const DEFAULT_MATCH_TYPE_BONUS: [(MatchType, f64); 6] = [
	(MatchType::Exact, 1.5),
	(MatchType::Prefix, 1.3),
	(MatchType::WordStart, 1.15),
	(MatchType::Fuzzy, 1.0),
	(MatchType::Substring, 0.8),
	(MatchType::NoMatch, 1.0),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringWeights {
	pub category_weights: BTreeMap<Category, f64>,
	pub match_type_bonus: BTreeMap<MatchType, f64>,
}
impl ScoringWeights {
	/// Reads the table from the store, substituting compiled defaults when it is absent or
	/// unreadable. Never fails.
	pub fn load(store: &dyn ConfigStore) -> Self {
		let bytes = match store.get_bytes(SCORING_WEIGHTS_KEY) {
			Ok(Some(bytes)) => bytes,
			Ok(None) => return Self::default(),
			Err(err) => {
				tracing::warn!(error = %err, "Failed to read scoring weights. Using defaults.");

				return Self::default();
			},
		};

		match serde_json::from_slice::<WeightsDocument>(&bytes) {
			Ok(document) => document.into_weights(),
			Err(err) => {
				tracing::warn!(error = %err, "Stored scoring weights are corrupt. Using defaults.");

				Self::default()
			},
		}
	}

	/// Persists the complete table.
	pub fn save(&self, store: &dyn ConfigStore) -> Result<()> {
		let bytes = serde_json::to_vec(self)?;

		store.set_bytes(SCORING_WEIGHTS_KEY, &bytes)?;

		Ok(())
	}

	pub fn weight(&self, category: Category) -> f64 {
		lookup(&self.category_weights, &category)
	}

	pub fn bonus(&self, match_type: MatchType) -> f64 {
		lookup(&self.match_type_bonus, &match_type)
	}
}
impl Default for ScoringWeights {
	fn default() -> Self {
		Self {
			category_weights: DEFAULT_CATEGORY_WEIGHTS.into_iter().collect(),
			match_type_bonus: DEFAULT_MATCH_TYPE_BONUS.into_iter().collect(),
		}
	}
}

/// Wire form of [`ScoringWeights`]. Keys are kept as strings so tables written by newer builds,
/// which may name variants this build does not know, still load.
#[derive(Debug, Deserialize)]
struct WeightsDocument {
	category_weights: Option<BTreeMap<String, Option<f64>>>,
	match_type_bonus: Option<BTreeMap<String, Option<f64>>>,
}
impl WeightsDocument {
	fn into_weights(self) -> ScoringWeights {
		let defaults = ScoringWeights::default();

		ScoringWeights {
			category_weights: match self.category_weights {
				Some(entries) => parse_entries(entries, "category_weights"),
				None => defaults.category_weights,
			},
			match_type_bonus: match self.match_type_bonus {
				Some(entries) => parse_entries(entries, "match_type_bonus"),
				None => defaults.match_type_bonus,
			},
		}
	}
}

fn parse_entries<K>(entries: BTreeMap<String, Option<f64>>, table: &str) -> BTreeMap<K, f64>
where
	K: std::str::FromStr + Ord,
{
	let mut out = BTreeMap::new();

	for (name, value) in entries {
		let Ok(key) = name.parse::<K>() else {
			tracing::debug!(table, key = %name, "Ignoring unknown scoring weight key.");

			continue;
		};
		let Some(value) = value.filter(|value| is_valid_weight(*value)) else {
			tracing::warn!(table, key = %name, "Ignoring invalid scoring weight.");

			continue;
		};

		out.insert(key, value);
	}

	out
}

fn is_valid_weight(value: f64) -> bool {
	value.is_finite() && value > 0.0
}

fn lookup<K>(table: &BTreeMap<K, f64>, key: &K) -> f64
where
	K: Ord,
{
	table.get(key).copied().filter(|value| is_valid_weight(*value)).unwrap_or(NEUTRAL_WEIGHT)
}
