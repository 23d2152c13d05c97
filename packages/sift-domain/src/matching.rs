//! Classification of how well a query matches a single candidate string.
//!
//! Tiers are evaluated in a fixed priority order and the first tier that fires is authoritative,
//! even when a later tier would produce a higher number.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const EXACT_QUALITY: f64 = 1.0;
pub const PREFIX_QUALITY: f64 = 0.9;
pub const WORD_START_MAX_QUALITY: f64 = 0.85;
pub const WORD_START_MIN_QUALITY: f64 = 0.6;
pub const FUZZY_MIN_QUALITY: f64 = 0.05;
pub const FUZZY_MAX_QUALITY: f64 = 0.6;
pub const SUBSTRING_QUALITY: f64 = 0.03;

const WORD_START_STEP: f64 = 0.05;
const WORD_START_MAX_PENALTY: f64 = 0.25;
const FUZZY_BASE: f64 = 0.3;
const FUZZY_CONSECUTIVE_BONUS: f64 = 0.1;
const FUZZY_GAP_PENALTY: f64 = 0.02;
const FUZZY_EARLY_BONUS: f64 = 0.2;
const FUZZY_EARLY_STEP: f64 = 0.01;
const FUZZY_LEADING_BONUS: f64 = 0.05;
const FUZZY_BOUNDARY_BONUS: f64 = 0.03;

const SEPARATORS: [char; 3] = [' ', '-', '_'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
	Exact,
	Prefix,
	WordStart,
	Fuzzy,
	Substring,
	NoMatch,
}
impl MatchType {
	pub const ALL: [MatchType; 6] = [
		MatchType::Exact,
		MatchType::Prefix,
		MatchType::WordStart,
		MatchType::Fuzzy,
		MatchType::Substring,
		MatchType::NoMatch,
	];

	/// Reference ceiling for the tier; `None` for [`MatchType::NoMatch`].
	pub fn base_quality(self) -> Option<f64> {
		match self {
			MatchType::Exact => Some(EXACT_QUALITY),
			MatchType::Prefix => Some(PREFIX_QUALITY),
			MatchType::WordStart => Some(WORD_START_MAX_QUALITY),
			MatchType::Fuzzy => Some(FUZZY_MAX_QUALITY),
			MatchType::Substring => Some(SUBSTRING_QUALITY),
			MatchType::NoMatch => None,
		}
	}

	/// Inclusive quality band a result of this tier must fall in.
	pub fn band(self) -> (f64, f64) {
		match self {
			MatchType::Exact => (EXACT_QUALITY, EXACT_QUALITY),
			MatchType::Prefix => (PREFIX_QUALITY, PREFIX_QUALITY),
			MatchType::WordStart => (WORD_START_MIN_QUALITY, WORD_START_MAX_QUALITY),
			MatchType::Fuzzy => (FUZZY_MIN_QUALITY, FUZZY_MAX_QUALITY),
			MatchType::Substring => (SUBSTRING_QUALITY, SUBSTRING_QUALITY),
			MatchType::NoMatch => (0.0, 0.0),
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			MatchType::Exact => "exact",
			MatchType::Prefix => "prefix",
			MatchType::WordStart => "word_start",
			MatchType::Fuzzy => "fuzzy",
			MatchType::Substring => "substring",
			MatchType::NoMatch => "no_match",
		}
	}
}

impl FromStr for MatchType {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		MatchType::ALL
			.into_iter()
			.find(|match_type| match_type.as_str() == value)
			.ok_or_else(|| format!("Unknown match type: {value}."))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
	pub quality: f64,
	pub match_type: MatchType,
}
impl MatchResult {
	pub const NO_MATCH: MatchResult = MatchResult { quality: 0.0, match_type: MatchType::NoMatch };

	fn new(match_type: MatchType, quality: f64) -> Self {
		let (min, max) = match_type.band();

		Self { quality: quality.clamp(min, max), match_type }
	}

	pub fn is_match(&self) -> bool {
		self.match_type != MatchType::NoMatch
	}
}

/// Classifies `target` against `query`, case-insensitively.
pub fn analyze(query: &str, target: &str) -> MatchResult {
	if query.is_empty() || target.is_empty() {
		return MatchResult::NO_MATCH;
	}

	let query = query.to_lowercase();
	let target = target.to_lowercase();

	if target == query {
		return MatchResult::new(MatchType::Exact, EXACT_QUALITY);
	}
	if target.starts_with(&query) {
		return MatchResult::new(MatchType::Prefix, PREFIX_QUALITY);
	}
	if let Some(word_index) = word_start_index(&query, &target) {
		let penalty = (word_index as f64 * WORD_START_STEP).min(WORD_START_MAX_PENALTY);

		return MatchResult::new(MatchType::WordStart, WORD_START_MAX_QUALITY - penalty);
	}

	let query_chars: Vec<char> = query.chars().collect();
	let target_chars: Vec<char> = target.chars().collect();
	let Some(positions) = subsequence_positions(&query_chars, &target_chars) else {
		return MatchResult::NO_MATCH;
	};

	// A contiguous run that is neither a prefix nor a word start is the weakest tier.
	if target.contains(&query) {
		return MatchResult::new(MatchType::Substring, SUBSTRING_QUALITY);
	}

	MatchResult::new(MatchType::Fuzzy, fuzzy_quality(&positions, &target_chars))
}

fn is_separator(ch: char) -> bool {
	SEPARATORS.contains(&ch)
}

/// Index of the first word (counting non-empty words only) from whose start the rest of the
/// target begins with `query`.
fn word_start_index(query: &str, target: &str) -> Option<usize> {
	let mut word_index = 0_usize;
	let mut at_boundary = true;

	for (offset, ch) in target.char_indices() {
		if is_separator(ch) {
			at_boundary = true;

			continue;
		}
		if at_boundary {
			if target[offset..].starts_with(query) {
				return Some(word_index);
			}

			word_index += 1;
			at_boundary = false;
		}
	}

	None
}

/// Leftmost in-order positions of every query character within the target.
fn subsequence_positions(query: &[char], target: &[char]) -> Option<Vec<usize>> {
	let mut positions = Vec::with_capacity(query.len());
	let mut cursor = 0_usize;

	for ch in query {
		let offset = target[cursor..].iter().position(|candidate| candidate == ch)?;

		positions.push(cursor + offset);

		cursor += offset + 1;
	}

	Some(positions)
}

fn fuzzy_quality(positions: &[usize], target: &[char]) -> f64 {
	let mut quality = FUZZY_BASE;

	for pair in positions.windows(2) {
		let gap = pair[1] - pair[0];

		if gap == 1 {
			quality += FUZZY_CONSECUTIVE_BONUS;
		} else {
			let extra = (gap - 1) as f64;

			quality -= extra * extra * FUZZY_GAP_PENALTY;
		}
	}

	if let Some(&first) = positions.first() {
		quality += (FUZZY_EARLY_BONUS - first as f64 * FUZZY_EARLY_STEP).max(0.0);
	}

	for &position in positions {
		if position == 0 {
			quality += FUZZY_LEADING_BONUS;
		} else if is_separator(target[position - 1]) {
			quality += FUZZY_BOUNDARY_BONUS;
		}
	}

	quality.clamp(FUZZY_MIN_QUALITY, FUZZY_MAX_QUALITY)
}
