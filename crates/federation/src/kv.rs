//! Key-value store backing federation bookkeeping.
//!
//! Values are JSON documents. The in-memory store lives as long as the
//! process; the Redis store shares state across instances and survives
//! restarts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::FederationError;

/// JSON key-value store.
///
/// The full contract is `get`, `set` with an optional time-to-live, and
/// `delete`, so both backends can stand in for one another. The resolver
/// currently only caches actor key pairs, which never expire; expiry and
/// removal are still honoured by every implementation.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<Value>, FederationError>;

    /// Write a value, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>)
    -> Result<(), FederationError>;

    /// Remove a value. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), FederationError>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryKvStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included until they are next read.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, FederationError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it, unless a writer replaced it in the meantime
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
            debug!(key = %key, "Evicted expired key");
        }
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), FederationError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), FederationError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Redis-backed store. Every key is namespaced with the configured prefix.
#[derive(Clone)]
pub struct RedisKvStore {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisKvStore {
    /// Create a store over a connected client.
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>, prefix: String) -> Self {
        Self { redis, prefix }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:kv:{key}", self.prefix)
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, FederationError> {
        let raw: Option<String> = self
            .redis
            .get(self.namespaced(key))
            .await
            .map_err(|e| FederationError::Kv(e.to_string()))?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(FederationError::from)
    }

    async fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), FederationError> {
        let json = serde_json::to_string(&value)?;
        // Redis rejects EX 0, so sub-second lifetimes round up
        let expiration = ttl.map(|ttl| {
            Expiration::EX(i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX))
        });

        self.redis
            .set::<(), _, _>(self.namespaced(key), json, expiration, None, false)
            .await
            .map_err(|e| FederationError::Kv(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), FederationError> {
        self.redis
            .del::<(), _>(self.namespaced(key))
            .await
            .map_err(|e| FederationError::Kv(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_set_get_delete() {
        let store = MemoryKvStore::new();
        assert!(store.get("missing").await.unwrap().is_none());

        store.set("a", json!({"n": 1}), None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"n": 1})));

        store.set("a", json!({"n": 2}), None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"n": 2})));

        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        store.delete("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_expired_entry_is_evicted() {
        let store = MemoryKvStore::new();
        store
            .set("short", json!("gone"), Some(Duration::ZERO))
            .await
            .unwrap();
        store
            .set("long", json!("kept"), Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);

        assert!(store.get("short").await.unwrap().is_none());
        assert_eq!(store.get("long").await.unwrap(), Some(json!("kept")));
        assert_eq!(store.len().await, 1);
    }
}
