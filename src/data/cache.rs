//! Process-wide memoization of the dataset and model loaders.
//!
//! Lifecycle: `app::run` creates one `Loaders` per process and passes it down
//! by reference. Each loader function has its own `MemoCache`, keyed by the
//! source identifier. Entries are populated on first access and live until the
//! process exits or `evict`/`clear` is called. There is no TTL and no size
//! bound.
//!
//! The lock is never held across I/O, so two callers racing on a cold key may
//! both fetch; the first value inserted wins and is returned to both. Failed
//! loads are not cached.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::data::source::{ByteSource, artifact_name, write_artifact};
use crate::domain::RawRecord;
use crate::error::AppError;
use crate::io::ingest::{TableFormat, decode_table_as, sniff_format};
use crate::models::{AdditiveModel, Forecaster};

/// Read-through cache of shared values.
pub struct MemoCache<V: ?Sized> {
    name: &'static str,
    entries: Mutex<HashMap<String, Arc<V>>>,
}

impl<V: ?Sized> MemoCache<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<V>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.lock().get(key).cloned()
    }

    /// Return the cached value for `key`, or run `load` and cache its result.
    pub fn get_or_try_load<F>(&self, key: &str, load: F) -> Result<Arc<V>, AppError>
    where
        F: FnOnce() -> Result<Arc<V>, AppError>,
    {
        if let Some(hit) = self.get(key) {
            debug!(cache = self.name, key, "cache hit");
            return Ok(hit);
        }

        debug!(cache = self.name, key, "cache miss");
        let loaded = load()?;
        let mut entries = self.lock();
        let stored = entries.entry(key.to_string()).or_insert(loaded);
        Ok(Arc::clone(stored))
    }

    /// Drop one entry; returns whether it was present.
    pub fn evict(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded source table.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: String,
    pub format: TableFormat,
    /// Local copy of the downloaded bytes.
    pub artifact: PathBuf,
    pub records: Vec<RawRecord>,
}

/// Memoized dataset/model loaders sharing one byte source.
pub struct Loaders {
    source: Box<dyn ByteSource>,
    cache_dir: PathBuf,
    datasets: MemoCache<Dataset>,
    models: MemoCache<dyn Forecaster>,
}

impl Loaders {
    pub fn new(source: Box<dyn ByteSource>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            cache_dir: cache_dir.into(),
            datasets: MemoCache::new("dataset"),
            models: MemoCache::new("model"),
        }
    }

    /// Fetch, store and decode the dataset (memoized by identifier).
    pub fn dataset(&self, identifier: &str) -> Result<Arc<Dataset>, AppError> {
        self.datasets.get_or_try_load(identifier, || {
            let bytes = self.source.fetch(identifier)?;
            let format = sniff_format(&bytes)?;
            let artifact = write_artifact(
                &self.cache_dir,
                &artifact_name("dataset", identifier, format.extension()),
                &bytes,
            )?;
            let records = decode_table_as(format, &bytes)?;
            info!(source = identifier, rows = records.len(), ?format, "dataset loaded");
            Ok(Arc::new(Dataset {
                source: identifier.to_string(),
                format,
                artifact,
                records,
            }))
        })
    }

    /// Fetch, store and deserialize the forecasting model (memoized by identifier).
    pub fn model(&self, identifier: &str) -> Result<Arc<dyn Forecaster>, AppError> {
        self.models.get_or_try_load(identifier, || {
            let bytes = self.source.fetch(identifier)?;
            write_artifact(&self.cache_dir, &artifact_name("model", identifier, "json"), &bytes)?;
            let model = AdditiveModel::from_json_slice(&bytes)?;
            info!(
                source = identifier,
                history = model.history_dates.len(),
                seasonalities = model.seasonalities.len(),
                "model loaded"
            );
            let model: Arc<dyn Forecaster> = Arc::new(model);
            Ok(model)
        })
    }

    pub fn evict_dataset(&self, identifier: &str) -> bool {
        self.datasets.evict(identifier)
    }

    pub fn evict_model(&self, identifier: &str) -> bool {
        self.models.evict(identifier)
    }

    /// Manual invalidation: the next access re-fetches everything.
    pub fn clear(&self) {
        self.datasets.clear();
        self.models.clear();
        info!("loader caches cleared");
    }
}
