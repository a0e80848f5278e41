//! Persistent response cache backed by fjall, values encoded with postcard.

use std::fmt::Display;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::task;
use tracing::debug;

use crate::Result;
use crate::error::SurfcastError;

const KEYSPACE: &str = "responses";

#[derive(Serialize, Deserialize)]
struct Entry<T> {
    value: T,
    /// Unix seconds
    expires_at: u64,
}

fn cache_err(context: &str, e: impl Display) -> SurfcastError {
    SurfcastError::cache(format!("{context}: {e}"))
}

fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| cache_err("clock before epoch", e))
}

/// On-disk key/value store with a per-entry expiry.
#[derive(Clone)]
pub struct PersistentCache {
    store: Keyspace,
}

impl PersistentCache {
    /// Opens (or creates) the cache database under `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = fjall::Database::builder(path)
            .open()
            .map_err(|e| cache_err("failed to open cache database", e))?;
        let store = db
            .keyspace(KEYSPACE, fjall::KeyspaceCreateOptions::default)
            .map_err(|e| cache_err("failed to open keyspace", e))?;
        debug!("Opened cache at {}", path.display());
        Ok(Self { store })
    }

    /// Stores `value` under `key` for `ttl`.
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let expires_at = unix_now()?.saturating_add(ttl.as_secs());
        let bytes = postcard::to_stdvec(&Entry { value, expires_at })
            .map_err(|e| cache_err("failed to encode entry", e))?;

        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        task::spawn_blocking(move || store.insert(key, bytes))
            .await
            .map_err(|e| cache_err("cache task failed", e))?
            .map_err(|e| cache_err("failed to write entry", e))
    }

    /// Fresh value for `key`, if any. Expired entries are deleted on read.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();
        let stored = task::spawn_blocking(move || {
            store.get(key_bytes).map(|v| v.map(|slice| slice.to_vec()))
        })
        .await
        .map_err(|e| cache_err("cache task failed", e))?
        .map_err(|e| cache_err("failed to read entry", e))?;

        let Some(bytes) = stored else {
            debug!("miss");
            return Ok(None);
        };

        let entry: Entry<T> =
            postcard::from_bytes(&bytes).map_err(|e| cache_err("failed to decode entry", e))?;

        if unix_now()? < entry.expires_at {
            debug!("hit");
            Ok(Some(entry.value))
        } else {
            debug!("expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        task::spawn_blocking(move || store.remove(key))
            .await
            .map_err(|e| cache_err("cache task failed", e))?
            .map_err(|e| cache_err("failed to remove entry", e))
    }
}
