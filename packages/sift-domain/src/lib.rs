pub mod category;
pub mod matching;

pub use category::Category;
pub use matching::{MatchResult, MatchType, analyze};
