use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use sift_domain::{Category, MatchType};
use sift_service::{
	Candidate, NeutralUsage, ScoredCandidate, Scorer, ScoringWeights, UsageFactors, rank,
	scoring::MAX_FINAL_SCORE,
};
use sift_storage::{ConfigStore, MemoryStore, SCORING_WEIGHTS_KEY};

struct FixedUsage {
	factor: f64,
	reads: AtomicUsize,
}
impl UsageFactors for FixedUsage {
	fn factor(&self, _category: Category, _identifier: &str) -> f64 {
		self.reads.fetch_add(1, Ordering::SeqCst);

		self.factor
	}

	fn record_selection(&self, _category: Category, _identifier: &str) {}
}

fn uniform_weights() -> ScoringWeights {
	let mut weights = ScoringWeights::default();

	for value in weights.category_weights.values_mut() {
		*value = 1.0;
	}
	for value in weights.match_type_bonus.values_mut() {
		*value = 1.0;
	}

	weights
}

fn neutral_scorer(weights: ScoringWeights) -> Scorer {
	Scorer::new(Arc::new(weights), Arc::new(NeutralUsage))
}

fn app(title: &str) -> Candidate {
	Candidate::new(Category::Application, title.to_lowercase(), title)
}

fn score_and_rank(
	scorer: &Scorer,
	query: &str,
	candidates: Vec<Candidate>,
) -> Vec<ScoredCandidate> {
	let mut scored: Vec<ScoredCandidate> =
		candidates.into_iter().filter_map(|candidate| scorer.score(query, candidate)).collect();

	rank(&mut scored);

	scored
}

fn titles(items: &[ScoredCandidate]) -> Vec<&str> {
	items.iter().map(|item| item.title.as_str()).collect()
}

#[test]
fn prefix_ties_break_on_shorter_title_and_substring_ranks_last() {
	let scorer = neutral_scorer(uniform_weights());
	let ranked = score_and_rank(&scorer, "sp", vec![app("Spotify"), app("Spark"), app("Display")]);

	assert_eq!(titles(&ranked), vec!["Spark", "Spotify", "Display"]);
	assert_eq!(ranked[0].raw_match.match_type, MatchType::Prefix);
	assert_eq!(ranked[0].final_score, ranked[1].final_score);
	assert_eq!(ranked[2].raw_match.match_type, MatchType::Substring);
	assert_eq!(ranked[2].final_score, 30);
}

#[test]
fn empty_query_discards_everything() {
	let scorer = neutral_scorer(ScoringWeights::default());
	let ranked = score_and_rank(&scorer, "", vec![app("Spotify"), app("Safari")]);

	assert!(ranked.is_empty());
}

#[test]
fn non_matching_candidates_are_discarded() {
	let scorer = neutral_scorer(ScoringWeights::default());

	assert!(scorer.score("zz", app("Safari")).is_none());
}

#[test]
fn final_score_multiplies_all_factors() {
	let mut weights = uniform_weights();

	weights.category_weights.insert(Category::Emoji, 0.5);
	weights.match_type_bonus.insert(MatchType::Prefix, 2.0);

	let usage = Arc::new(FixedUsage { factor: 1.5, reads: AtomicUsize::new(0) });
	let scorer = Scorer::new(Arc::new(weights), usage.clone());
	let scored = scorer
		.score("gr", Candidate::new(Category::Emoji, "grin", "grinning face"))
		.expect("Expected a match.");

	// 0.9 * 1000 * 0.5 * 2.0 * 1.5
	assert_eq!(scored.final_score, 1_350);
	assert_eq!(usage.reads.load(Ordering::SeqCst), 1);
}

#[test]
fn huge_factors_clamp_to_the_maximum() {
	let usage = Arc::new(FixedUsage { factor: f64::MAX, reads: AtomicUsize::new(0) });
	let scorer = Scorer::new(Arc::new(ScoringWeights::default()), usage);
	let scored = scorer.score("safari", app("Safari")).expect("Expected a match.");

	assert_eq!(scored.final_score, MAX_FINAL_SCORE);
}

#[test]
fn nan_usage_factor_discards_only_that_candidate() {
	let usage = Arc::new(FixedUsage { factor: f64::NAN, reads: AtomicUsize::new(0) });
	let scorer = Scorer::new(Arc::new(ScoringWeights::default()), usage);

	assert!(scorer.score("safari", app("Safari")).is_none());
}

#[test]
fn subtitle_can_rescue_a_weak_title() {
	let scorer = neutral_scorer(uniform_weights());
	let candidate =
		Candidate::new(Category::Contact, "c-1", "Ada Lovelace").with_subtitle("ada@example.com");
	let scored = scorer.score("example", candidate).expect("Expected a match.");

	assert_eq!(scored.raw_match.match_type, MatchType::Substring);

	let candidate = Candidate::new(Category::Contact, "c-2", "Grace Hopper").with_subtitle("Navy");
	let scored = scorer.score("navy", candidate).expect("Expected a subtitle match.");

	assert_eq!(scored.raw_match.match_type, MatchType::Exact);
	assert_eq!(scored.title, "Grace Hopper");
}

#[test]
fn category_weight_biases_equal_matches() {
	let scorer = neutral_scorer(ScoringWeights::default());
	let ranked = score_and_rank(
		&scorer,
		"calc",
		vec![
			Candidate::new(Category::Emoji, "e", "calculator"),
			Candidate::new(Category::Application, "a", "Calculator"),
		],
	);

	assert_eq!(ranked[0].category, Category::Application);
	assert!(ranked[0].final_score > ranked[1].final_score);
}

#[test]
fn ranking_is_deterministic_for_any_input_order() {
	let scorer = neutral_scorer(ScoringWeights::default());
	let base = vec![
		app("Notes"),
		app("Notion"),
		app("Nova"),
		Candidate::new(Category::File, "f", "notes.txt"),
		Candidate::new(Category::Emoji, "e", "note"),
		app("Keynote"),
		app("Obsidian Notes"),
	];
	let expected = titles(&score_and_rank(&scorer, "no", base.clone()))
		.into_iter()
		.map(str::to_string)
		.collect::<Vec<_>>();

	for rotation in 1..base.len() {
		let mut shuffled = base.clone();

		shuffled.rotate_left(rotation);

		let ranked = score_and_rank(&scorer, "no", shuffled.clone());

		assert_eq!(titles(&ranked), expected, "rotation={rotation}");

		shuffled.reverse();

		assert_eq!(titles(&score_and_rank(&scorer, "no", shuffled)), expected);
	}
}

#[test]
fn full_ties_keep_input_order() {
	let scorer = neutral_scorer(uniform_weights());
	let ranked = score_and_rank(
		&scorer,
		"mail",
		vec![
			Candidate::new(Category::Application, "first", "Mail"),
			Candidate::new(Category::Action, "second", "Mail"),
		],
	);
	let identifiers: Vec<&str> = ranked.iter().map(|item| item.identifier.as_str()).collect();

	assert_eq!(identifiers, vec!["first", "second"]);
}

#[test]
fn weight_and_bonus_are_total_and_positive() {
	let defaults = ScoringWeights::default();
	let empty = ScoringWeights {
		category_weights: Default::default(),
		match_type_bonus: Default::default(),
	};

	for weights in [&defaults, &empty] {
		for category in Category::ALL {
			let value = weights.weight(category);

			assert!(value.is_finite() && value > 0.0, "{category}: {value}");
		}
		for match_type in MatchType::ALL {
			let value = weights.bonus(match_type);

			assert!(value.is_finite() && value > 0.0, "{match_type:?}: {value}");
		}
	}
}

#[test]
fn weights_round_trip_through_the_store() {
	let store = MemoryStore::new();
	let mut weights = ScoringWeights::default();

	weights.category_weights.insert(Category::Clipboard, 1.75);
	weights.match_type_bonus.remove(&MatchType::Substring);
	weights.save(&store).expect("Failed to save weights.");

	assert_eq!(ScoringWeights::load(&store), weights);
}

#[test]
fn missing_weights_load_defaults() {
	assert_eq!(ScoringWeights::load(&MemoryStore::new()), ScoringWeights::default());
}

#[test]
fn corrupt_weights_load_defaults() {
	let store = MemoryStore::new();

	store.set_bytes(SCORING_WEIGHTS_KEY, b"{not json").expect("Failed to write.");

	assert_eq!(ScoringWeights::load(&store), ScoringWeights::default());
}

#[test]
fn older_documents_default_missing_entries_to_neutral() {
	let store = MemoryStore::new();

	store
		.set_bytes(SCORING_WEIGHTS_KEY, br#"{"category_weights": {"application": 3.0}}"#)
		.expect("Failed to write.");

	let weights = ScoringWeights::load(&store);

	assert_eq!(weights.weight(Category::Application), 3.0);
	assert_eq!(weights.weight(Category::Emoji), 1.0);
	assert_eq!(weights.match_type_bonus, ScoringWeights::default().match_type_bonus);
}
