//! Key-value blob stores backing persisted scoring weights and tracer flags.

pub mod file;
pub mod memory;

mod error;

pub use error::Error;
pub use file::FileStore;
pub use memory::MemoryStore;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub const SCORING_WEIGHTS_KEY: &str = "scoring.weights";
pub const TRACING_ENABLED_KEY: &str = "tracing.enabled";
pub const TRACING_OUTPUT_KEY: &str = "tracing.output";

pub trait ConfigStore
where
	Self: Send + Sync,
{
	fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

	fn set_bytes(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Keys become file names, so they are restricted to a portable character set.
pub fn validate_key(key: &str) -> Result<()> {
	if key.is_empty() {
		return Err(Error::InvalidKey("key must be non-empty".to_string()));
	}
	if key == "." || key == ".." {
		return Err(Error::InvalidKey(key.to_string()));
	}
	if !key.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-')) {
		return Err(Error::InvalidKey(key.to_string()));
	}

	Ok(())
}
