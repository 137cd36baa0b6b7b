//! Persistence collaborator.
//!
//! The core's storage contract is deliberately minimal: `load(collection)`
//! and `save(collection, records)`, keyed by three logical collections.
//! `JsonFilePersistence` keeps one pretty-printed JSON file per collection;
//! `MemoryPersistence` backs tests and ephemeral sessions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

pub const COLLECTION_SERVICES: &str = "services";
pub const COLLECTION_CLIENTS: &str = "clients";
pub const COLLECTION_CLIENT_SERVICES: &str = "client-services";

pub trait Persistence: Send + Sync {
    /// Load a collection. `Ok(None)` means the collection was never saved.
    fn load(&self, collection: &str) -> Result<Option<Value>, AppError>;

    /// Replace a collection wholesale.
    fn save(&self, collection: &str, records: &Value) -> Result<(), AppError>;
}

/// Typed load on top of the untyped trait surface.
pub fn load_collection<T: DeserializeOwned>(
    persistence: &dyn Persistence,
    collection: &str,
) -> Result<Vec<T>, AppError> {
    match persistence.load(collection)? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

/// Typed save on top of the untyped trait surface.
pub fn save_collection<T: Serialize>(
    persistence: &dyn Persistence,
    collection: &str,
    records: &[T],
) -> Result<(), AppError> {
    persistence.save(collection, &serde_json::to_value(records)?)
}

// =============================================================================
// JSON file backend
// =============================================================================

/// One `{collection}.json` file per collection under a data directory.
pub struct JsonFilePersistence {
    dir: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFilePersistence { dir: dir.into() }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.json", collection))
    }
}

impl Persistence for JsonFilePersistence {
    fn load(&self, collection: &str) -> Result<Option<Value>, AppError> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, collection: &str, records: &Value) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.collection_path(collection);
        let content = serde_json::to_string_pretty(records)?;
        crate::util::atomic_write_str(&path, &content)?;
        log::debug!("persisted collection {} to {}", collection, path.display());
        Ok(())
    }
}

// =============================================================================
// In-memory backend
// =============================================================================

/// In-memory persistence for tests. Cloning shares the underlying map, so a
/// test can keep a handle while the `AppState` owns the boxed trait object.
#[derive(Clone, Default)]
pub struct MemoryPersistence {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    collections: HashMap<String, Value>,
    save_counts: HashMap<String, usize>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `save` has been called for a collection.
    pub fn save_count(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .save_counts
            .get(collection)
            .copied()
            .unwrap_or(0)
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self, collection: &str) -> Result<Option<Value>, AppError> {
        Ok(self.inner.lock().collections.get(collection).cloned())
    }

    fn save(&self, collection: &str, records: &Value) -> Result<(), AppError> {
        let mut inner = self.inner.lock();
        inner
            .collections
            .insert(collection.to_string(), records.clone());
        *inner.save_counts.entry(collection.to_string()).or_insert(0) += 1;
        Ok(())
    }
}

/// Convenience for binaries: default data directory under the home dir.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".clientdesk").join("data"))
}

/// Open a file-backed persistence rooted at `dir`, creating it if needed.
pub fn open_file_persistence(dir: &Path) -> Result<JsonFilePersistence, AppError> {
    std::fs::create_dir_all(dir)?;
    Ok(JsonFilePersistence::new(dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ServiceCategory, ServiceDefinition};
    use rust_decimal::Decimal;

    fn sample_services() -> Vec<ServiceDefinition> {
        vec![ServiceDefinition {
            id: "svc-1".to_string(),
            name: "Basic Hosting".to_string(),
            default_cost: Decimal::new(2500, 2),
            category: ServiceCategory::Hosting,
            description: None,
        }]
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let persistence = JsonFilePersistence::new(dir.path());

        save_collection(&persistence, COLLECTION_SERVICES, &sample_services()).unwrap();
        let loaded: Vec<ServiceDefinition> =
            load_collection(&persistence, COLLECTION_SERVICES).unwrap();
        assert_eq!(loaded, sample_services());
    }

    #[test]
    fn test_missing_collection_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let persistence = JsonFilePersistence::new(dir.path());
        let loaded: Vec<ServiceDefinition> =
            load_collection(&persistence, COLLECTION_CLIENTS).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_memory_persistence_counts_saves() {
        let persistence = MemoryPersistence::new();
        save_collection(&persistence, COLLECTION_SERVICES, &sample_services()).unwrap();
        save_collection(&persistence, COLLECTION_SERVICES, &sample_services()).unwrap();
        assert_eq!(persistence.save_count(COLLECTION_SERVICES), 2);
        assert_eq!(persistence.save_count(COLLECTION_CLIENTS), 0);

        let handle = persistence.clone();
        let loaded: Vec<ServiceDefinition> =
            load_collection(&handle, COLLECTION_SERVICES).unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
