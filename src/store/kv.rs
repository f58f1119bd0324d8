//! Raw key-value surface
//!
//! The entry store sits on a minimal async byte store: put with a TTL, get,
//! delete, an existence probe, an expiry rewrite, and a full flush. Expiry
//! is enforced on every access, so a record past its deadline is invisible
//! even before the sweeper removes it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::StoreError;

/// Backend contract for TTL-keyed byte records.
#[async_trait]
pub trait KeyValue: Send + Sync {
    /// Store `value` under `key`, replacing any previous record and its
    /// deadline.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch a live record. Expired records read as absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove a record. Returns whether a live record was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Probe for a live record without copying it out.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Rewrite a live record's deadline to `ttl` from now. Returns `false`
    /// if the record is absent or already expired.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Drop every record. Returns how many were dropped.
    async fn flush(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, Clone)]
struct StoredValue {
    data: Vec<u8>,
    expires_at: Instant,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Deadline stand-in for TTLs too large for the monotonic clock.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// TTLs are caller-supplied and may be enormous; adding one to `now` must
/// not panic, so oversized values saturate decades out.
fn deadline(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE)
}

/// In-memory backend. Cheap to clone; all clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    records: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired record. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut records = self.inner.records.write().await;
        let before = records.len();
        records.retain(|_, value| !value.is_expired(now));
        before - records.len()
    }

    /// Spawn a background task that purges expired records on an interval.
    pub fn start_sweeper(self, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let purged = self.purge_expired().await;
                if purged > 0 {
                    tracing::info!(purged, "swept expired records");
                }
            }
        })
    }
}

#[async_trait]
impl KeyValue for MemoryStore {
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        let record = StoredValue {
            data: value,
            expires_at: deadline(Instant::now(), ttl),
        };
        let mut records = self.inner.records.write().await;
        records.insert(key.to_string(), record);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = Instant::now();
        {
            let records = self.inner.records.read().await;
            match records.get(key) {
                Some(value) if !value.is_expired(now) => return Ok(Some(value.data.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired but not yet swept: drop it now.
        let mut records = self.inner.records.write().await;
        if let Some(value) = records.get(key) {
            if value.is_expired(Instant::now()) {
                records.remove(key);
            }
        }
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut records = self.inner.records.write().await;
        match records.remove(key) {
            Some(value) => Ok(!value.is_expired(now)),
            None => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let records = self.inner.records.read().await;
        Ok(records.get(key).is_some_and(|value| !value.is_expired(now)))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut records = self.inner.records.write().await;
        match records.get_mut(key) {
            Some(value) if !value.is_expired(now) => {
                value.expires_at = deadline(now, ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn flush(&self) -> Result<usize, StoreError> {
        let mut records = self.inner.records.write().await;
        let count = records.len();
        records.clear();
        Ok(count)
    }
}
