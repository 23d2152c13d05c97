use std::{
	fs, io,
	path::{Path, PathBuf},
};

use uuid::Uuid;

use crate::{ConfigStore, Result};

/// One file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
	root: PathBuf,
}
impl FileStore {
	pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
		let root = root.into();

		fs::create_dir_all(&root)?;

		Ok(Self { root })
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn path_for(&self, key: &str) -> Result<PathBuf> {
		crate::validate_key(key)?;

		Ok(self.root.join(key))
	}
}
impl ConfigStore for FileStore {
	fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
		let path = self.path_for(key)?;

		match fs::read(&path) {
			Ok(bytes) => Ok(Some(bytes)),
			Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	fn set_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
		let path = self.path_for(key)?;
		// Unique per write so concurrent writers to one key never share a temp file.
		let tmp = self.root.join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));

		fs::write(&tmp, bytes)?;

		if let Err(err) = fs::rename(&tmp, &path) {
			tracing::warn!(key = %key, error = %err, "Failed to move store entry into place.");

			let _ = fs::remove_file(&tmp);

			return Err(err.into());
		}

		Ok(())
	}
}
