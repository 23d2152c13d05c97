use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Kind of item a category provider offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
	Application,
	Conversion,
	Calendar,
	Action,
	GlobalAction,
	Quicklink,
	Contact,
	Clipboard,
	File,
	Process,
	Toggle,
	Settings,
	Emoji,
}
impl Category {
	pub const ALL: [Category; 13] = [
		Category::Application,
		Category::Conversion,
		Category::Calendar,
		Category::Action,
		Category::GlobalAction,
		Category::Quicklink,
		Category::Contact,
		Category::Clipboard,
		Category::File,
		Category::Process,
		Category::Toggle,
		Category::Settings,
		Category::Emoji,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Category::Application => "application",
			Category::Conversion => "conversion",
			Category::Calendar => "calendar",
			Category::Action => "action",
			Category::GlobalAction => "global_action",
			Category::Quicklink => "quicklink",
			Category::Contact => "contact",
			Category::Clipboard => "clipboard",
			Category::File => "file",
			Category::Process => "process",
			Category::Toggle => "toggle",
			Category::Settings => "settings",
			Category::Emoji => "emoji",
		}
	}
}
impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for Category {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		Category::ALL
			.into_iter()
			.find(|category| category.as_str() == value)
			.ok_or_else(|| format!("Unknown category: {value}."))
	}
}
