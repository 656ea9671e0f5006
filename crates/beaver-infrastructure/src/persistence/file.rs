//! File-backed state storage
//!
//! One `<key>.json` file per key inside a directory. Writes go to a
//! temporary file first and are renamed into place.

use crate::constants::STORAGE_FILE_EXTENSION;
use crate::error_ext::ErrorContext;
use beaver_domain::error::{Error, Result};
use beaver_domain::ports::StateStorage;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileStateStorage {
    dir: PathBuf,
}

impl FileStateStorage {
    /// Storage in `dir`, created when missing
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .storage_context(format!("Failed to create storage directory {}", dir.display()))?;
        debug!(dir = %dir.display(), "File state storage ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(Error::invalid_argument(format!("Invalid storage key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.{STORAGE_FILE_EXTENSION}")))
    }
}

impl StateStorage for FileStateStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Storage {
                message: format!("Failed to read {}", path.display()),
                source: Some(Box::new(err)),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value).storage_context(format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .storage_context(format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(Error::Storage {
                message: format!("Failed to remove {}", path.display()),
                source: Some(Box::new(err)),
            }),
            _ => Ok(()),
        }
    }
}
