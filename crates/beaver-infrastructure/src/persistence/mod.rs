//! State storage backends

pub mod file;
pub mod memory;

pub use file::FileStateStorage;
pub use memory::MemoryStateStorage;

use crate::config::{StorageBackend, StorageConfig};
use beaver_domain::error::{Error, Result};
use beaver_domain::ports::StateStorage;
use std::sync::Arc;

/// Storage selected by configuration
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn StateStorage>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStateStorage::new())),
        StorageBackend::File => {
            let path = config
                .resolved_path()
                .ok_or_else(|| Error::configuration("No directory for file storage"))?;
            Ok(Arc::new(FileStateStorage::new(path)?))
        }
    }
}
