use std::{collections::HashMap, sync::Mutex};

use crate::{ConfigStore, Result};

#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<HashMap<String, Vec<u8>>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}
impl ConfigStore for MemoryStore {
	fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
		crate::validate_key(key)?;

		let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

		Ok(entries.get(key).cloned())
	}

	fn set_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
		crate::validate_key(key)?;

		let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

		entries.insert(key.to_string(), bytes.to_vec());

		Ok(())
	}
}
