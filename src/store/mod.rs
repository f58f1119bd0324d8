//! TTL-keyed entry store
//!
//! An entry is a payload record plus a JSON metadata sidecar stored under
//! `{key}:meta`, both written with the same TTL. The payload record decides
//! existence; a lost sidecar degrades the entry to category-less literal
//! content instead of hiding it.

mod entry;
mod kv;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

pub use entry::{Category, Entry, EntryMetadata};
pub use kv::{KeyValue, MemoryStore};

use crate::keys::{Key, KeySource};

/// Suffix of the metadata sidecar key. The key alphabet is lowercase hex,
/// so the `:` keeps sidecars disjoint from payload keys.
pub const METADATA_SUFFIX: &str = ":meta";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no entry for key {0}")]
    NotFound(String),
    #[error("entry {key} is {actual}, not {expected}")]
    CategoryMismatch {
        key: String,
        expected: Category,
        actual: Category,
    },
    #[error("metadata encoding failed for key {key}: {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}

fn metadata_key(key: &str) -> String {
    format!("{key}{METADATA_SUFFIX}")
}

/// Entry lifecycle over any [`KeyValue`] backend.
#[derive(Clone)]
pub struct EntryStore {
    kv: Arc<dyn KeyValue>,
}

impl EntryStore {
    pub fn new(backend: Arc<dyn KeyValue>) -> Self {
        Self { kv: backend }
    }

    /// Fresh in-memory store, without a background sweeper. Access-time
    /// expiry still applies.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Store a payload and its metadata sidecar under `key`, replacing any
    /// previous entry there. Both records get the same TTL.
    pub async fn put(
        &self,
        key: &Key,
        payload: &[u8],
        category: Category,
        ttl_secs: u64,
        source: &KeySource,
    ) -> Result<(), StoreError> {
        let ttl = Duration::from_secs(ttl_secs);
        let metadata = EntryMetadata {
            category,
            size: payload.len() as u64,
            key_source: source.redacted().to_string(),
            ttl: ttl_secs,
            stored_at: Utc::now(),
        };
        let encoded = encode_metadata(key.as_str(), &metadata)?;

        // Two independent writes. A crash between them leaves a payload
        // without a sidecar, which get() tolerates.
        self.kv.put(key.as_str(), payload.to_vec(), ttl).await?;
        self.kv.put(&metadata_key(key.as_str()), encoded, ttl).await?;

        tracing::debug!(
            key = key.as_str(),
            category = %category,
            size = metadata.size,
            ttl_secs,
            "stored entry"
        );
        Ok(())
    }

    /// Fetch an entry. The sidecar is read opportunistically: its absence
    /// (or an undecodable body) yields `metadata: None`, not an error.
    pub async fn get(&self, key: &str) -> Result<Entry, StoreError> {
        let payload = self
            .kv
            .get(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let metadata = match self.kv.get(&metadata_key(key)).await? {
            Some(raw) => match serde_json::from_slice(&raw) {
                Ok(meta) => Some(meta),
                Err(err) => {
                    tracing::warn!(key, error = %err, "undecodable metadata sidecar, serving entry without category");
                    None
                }
            },
            None => None,
        };

        Ok(Entry { payload, metadata })
    }

    /// Read just the sidecar of a live entry.
    pub async fn metadata(&self, key: &str) -> Result<Option<EntryMetadata>, StoreError> {
        if !self.kv.exists(key).await? {
            return Err(StoreError::NotFound(key.to_string()));
        }
        match self.kv.get(&metadata_key(key)).await? {
            Some(raw) => Ok(serde_json::from_slice(&raw).ok()),
            None => Ok(None),
        }
    }

    /// Remove an entry and its sidecar. `NotFound` if no live payload
    /// exists under `key`.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        if !self.kv.exists(key).await? {
            return Err(StoreError::NotFound(key.to_string()));
        }
        self.kv.delete(key).await?;
        self.kv.delete(&metadata_key(key)).await?;
        tracing::debug!(key, "deleted entry");
        Ok(())
    }

    /// Reset an entry's TTL without rewriting the payload.
    ///
    /// With `expected` set, the entry's recorded category must match or the
    /// touch is refused before anything is mutated. A missing sidecar
    /// cannot prove a mismatch, so a degraded entry is touched as-is.
    pub async fn touch(
        &self,
        key: &str,
        ttl_secs: u64,
        expected: Option<Category>,
    ) -> Result<(), StoreError> {
        let metadata = self.metadata(key).await?;

        if let (Some(expected), Some(meta)) = (expected, metadata.as_ref()) {
            if meta.category != expected {
                return Err(StoreError::CategoryMismatch {
                    key: key.to_string(),
                    expected,
                    actual: meta.category,
                });
            }
        }

        let ttl = Duration::from_secs(ttl_secs);
        if !self.kv.expire(key, ttl).await? {
            // Expired between the metadata read and here.
            return Err(StoreError::NotFound(key.to_string()));
        }
        if let Some(mut meta) = metadata {
            meta.ttl = ttl_secs;
            let encoded = encode_metadata(key, &meta)?;
            self.kv.put(&metadata_key(key), encoded, ttl).await?;
        }

        tracing::debug!(key, ttl_secs, "touched entry");
        Ok(())
    }

    /// Drop every record, live or expired. Returns the record count, which
    /// includes sidecars.
    pub async fn flush_all(&self) -> Result<usize, StoreError> {
        let flushed = self.kv.flush().await?;
        tracing::info!(flushed, "flushed store");
        Ok(flushed)
    }
}

fn encode_metadata(key: &str, metadata: &EntryMetadata) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(metadata).map_err(|source| StoreError::Codec {
        key: key.to_string(),
        source,
    })
}
