use std::collections::HashMap;
use std::ops::DerefMut;
use std::sync::Mutex;
use std::time::Duration;

use r2d2_redis::redis::{Commands, RedisError};
use r2d2_redis::{r2d2, RedisConnectionManager};
use uuid::Uuid;

use super::{StorageError, StoreResult};

pub type RedisPool = r2d2::Pool<RedisConnectionManager>;

const CACHE_POOL_MAX_OPEN: u32 = 16;
const CACHE_POOL_MIN_IDLE: u32 = 8;
const CACHE_POOL_EXPIRE_SECONDS: u64 = 60;

const IMAGE_NAMESPACE: &str = "images";

pub fn redis_pool(redis_url: &str) -> StoreResult<RedisPool> {
    let manager = RedisConnectionManager::new(redis_url)
        .map_err(|e| StorageError::Unavailable(e.to_string()))?;
    r2d2::Pool::builder()
        .max_size(CACHE_POOL_MAX_OPEN)
        .max_lifetime(Some(Duration::from_secs(CACHE_POOL_EXPIRE_SECONDS)))
        .min_idle(Some(CACHE_POOL_MIN_IDLE))
        .build(manager)
        .map_err(|e| StorageError::Unavailable(e.to_string()))
}

pub trait BlobStore: Send + Sync {
    fn put(&self, data: &[u8]) -> StoreResult<String>;

    //malformed ids are a miss, not an error
    fn get(&self, image_id: &str) -> StoreResult<Option<Vec<u8>>>;
}

pub fn new_blob_id() -> String {
    Uuid::new_v4().to_simple().to_string()
}

pub fn parse_blob_id(image_id: &str) -> Option<String> {
    Uuid::parse_str(image_id)
        .ok()
        .map(|id| id.to_simple().to_string())
}

fn image_key(blob_id: &str) -> String {
    format!("{}:{}", IMAGE_NAMESPACE, blob_id)
}

fn redis_error(e: RedisError) -> StorageError {
    if e.is_connection_refusal() || e.is_timeout() || e.is_connection_dropped() {
        StorageError::Unavailable(e.to_string())
    } else {
        StorageError::Backend(e.to_string())
    }
}

pub struct RedisBlobStore {
    pool: RedisPool,
    ttl: Option<Duration>,
}

impl RedisBlobStore {
    pub fn new(pool: RedisPool, ttl: Option<Duration>) -> Self {
        RedisBlobStore { pool, ttl }
    }
}

impl BlobStore for RedisBlobStore {
    fn put(&self, data: &[u8]) -> StoreResult<String> {
        let mut redis_conn = self
            .pool
            .get()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let redis_conn = redis_conn.deref_mut();

        let blob_id = new_blob_id();
        let key = image_key(&blob_id);
        match self.ttl {
            Some(ttl) => redis_conn
                .set_ex::<_, _, ()>(&key, data, ttl.as_secs() as usize)
                .map_err(redis_error)?,
            None => redis_conn
                .set::<_, _, ()>(&key, data)
                .map_err(redis_error)?,
        }
        Ok(blob_id)
    }

    fn get(&self, image_id: &str) -> StoreResult<Option<Vec<u8>>> {
        let blob_id = match parse_blob_id(image_id) {
            Some(blob_id) => blob_id,
            None => return Ok(None),
        };
        let mut redis_conn = self
            .pool
            .get()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let redis_conn = redis_conn.deref_mut();

        let data: Option<Vec<u8>> = redis_conn.get(image_key(&blob_id)).map_err(redis_error)?;
        Ok(data)
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, image_id: &str) -> bool {
        match parse_blob_id(image_id) {
            Some(blob_id) => self
                .blobs
                .lock()
                .map(|blobs| blobs.contains_key(&blob_id))
                .unwrap_or(false),
            None => false,
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, data: &[u8]) -> StoreResult<String> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Backend("blob map poisoned".to_string()))?;
        let blob_id = new_blob_id();
        blobs.insert(blob_id.clone(), data.to_vec());
        Ok(blob_id)
    }

    fn get(&self, image_id: &str) -> StoreResult<Option<Vec<u8>>> {
        let blob_id = match parse_blob_id(image_id) {
            Some(blob_id) => blob_id,
            None => return Ok(None),
        };
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StorageError::Backend("blob map poisoned".to_string()))?;
        Ok(blobs.get(&blob_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_come_back_identical() {
        let store = MemoryBlobStore::new();
        let image = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00".to_vec();
        let image_id = store.put(&image).unwrap();
        assert_eq!(store.get(&image_id).unwrap(), Some(image));
    }

    #[test]
    fn every_put_gets_a_new_id() {
        let store = MemoryBlobStore::new();
        let a = store.put(b"same").unwrap();
        let b = store.put(b"same").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn malformed_ids_are_simply_absent() {
        let store = MemoryBlobStore::new();
        store.put(b"x").unwrap();
        assert_eq!(store.get("not-an-id").unwrap(), None);
        assert_eq!(store.get("").unwrap(), None);
        assert!(!store.contains("../images"));
    }

    #[test]
    fn hyphenated_ids_resolve_to_the_same_blob() {
        let store = MemoryBlobStore::new();
        let image_id = store.put(b"abc").unwrap();
        let hyphenated = Uuid::parse_str(&image_id).unwrap().to_hyphenated().to_string();
        assert_eq!(store.get(&hyphenated).unwrap(), Some(b"abc".to_vec()));
    }

    #[test]
    fn image_keys_are_namespaced() {
        assert_eq!(image_key("abc"), "images:abc");
    }
}
