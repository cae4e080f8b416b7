use crate::core::error::GatewayResult;
use dashmap::DashMap;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Contract for the backing key/value store. Anything with TTL support
/// (redis, memcached, the in-process map below) satisfies it.
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> GatewayResult<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> GatewayResult<()>;
    async fn delete(&self, key: &str) -> GatewayResult<()>;
}

/// Thread-safe in-memory backend with lazy expiry.
pub struct MemoryBackend {
    entries: DashMap<String, (Vec<u8>, Instant)>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Drop every expired entry.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> GatewayResult<Option<Vec<u8>>> {
        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = entry.value();
            if *expires_at > Instant::now() {
                return Ok(Some(value.clone()));
            }
            drop(entry);
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> GatewayResult<()> {
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> GatewayResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Deterministic cache key over the request parameters that affect the
/// cached value.
pub fn cache_key(operation: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    for part in parts {
        hasher.update(b":");
        hasher.update(part.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

enum CacheRead<T> {
    Hit(T),
    Miss,
    Unavailable,
}

/// Read-through cache over a pluggable backend.
///
/// Concurrent misses on one key are collapsed to a single upstream fetch:
/// the first caller fetches while the rest wait on a per-key gate and then
/// re-read the freshly written entry. A failing backend only costs the
/// caching benefit, never the request.
pub struct SwapCache {
    backend: Arc<dyn CacheBackend>,
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl SwapCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            inflight: DashMap::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.read(key).await {
            CacheRead::Hit(value) => return Ok(value),
            CacheRead::Unavailable => return fetch().await,
            CacheRead::Miss => {}
        }

        let gate = self
            .inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = gate.lock().await;

        // Another caller may have finished the fetch while we queued.
        if let CacheRead::Hit(value) = self.read(key).await {
            return Ok(value);
        }

        let result = fetch().await;
        if let Ok(value) = &result {
            self.write(key, value, ttl).await;
        }

        drop(guard);
        // Later missers start a fresh flight.
        self.inflight.remove(key);
        result
    }

    pub async fn invalidate(&self, key: &str) {
        if let Err(err) = self.backend.delete(key).await {
            warn!("Cache delete failed for {}: {}", key, err);
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> CacheRead<T> {
        let bytes = match self.backend.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return CacheRead::Miss,
            Err(err) => {
                warn!("Cache backend unavailable, bypassing cache: {}", err);
                return CacheRead::Unavailable;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => CacheRead::Hit(value),
            Err(err) => {
                debug!("Dropping undecodable cache entry {}: {}", key, err);
                let _ = self.backend.delete(key).await;
                CacheRead::Miss
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Could not serialize cache entry {}: {}", key, err);
                return;
            }
        };
        if let Err(err) = self.backend.set(key, bytes, ttl).await {
            warn!("Cache write failed for {}: {}", key, err);
        }
    }
}
