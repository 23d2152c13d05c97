use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	#[serde(default)]
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub tracing: Tracing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: default_log_level() }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
	/// Optional. Directory for the file-backed configuration store; an in-memory store is used
	/// when absent.
	pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_max_results")]
	pub max_results: u32,
	#[serde(default = "default_min_query_chars")]
	pub min_query_chars: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { max_results: default_max_results(), min_query_chars: default_min_query_chars() }
	}
}

/// Startup defaults for the execution tracer. Values persisted in the configuration store take
/// precedence.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Tracing {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default)]
	pub output: bool,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_max_results() -> u32 {
	50
}

fn default_min_query_chars() -> u32 {
	1
}
