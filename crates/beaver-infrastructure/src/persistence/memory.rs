//! In-memory state storage

use beaver_domain::error::Result;
use beaver_domain::ports::StateStorage;
use dashmap::DashMap;

/// Storage kept for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryStateStorage {
    values: DashMap<String, String>,
}

impl MemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl StateStorage for MemoryStateStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).map(|value| value.clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}
