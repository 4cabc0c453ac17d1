//! Read-through caches for data every client downloads in full: the public key directory and the about/interests
//! maps. The database is always the source of truth; cache failures are logged by the callers and otherwise ignored.
use std::{collections::HashMap, time::Duration};

use thiserror::Error;

use crate::traits::UsersInfo;

mod memory;
mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

pub const PUBLIC_KEYS_KEY: &str = "puppylove:public_keys";
pub const ABOUT_MAP_KEY: &str = "puppylove:about_map";
pub const INTERESTS_MAP_KEY: &str = "puppylove:interests_map";
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        CacheError::Redis(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait ProfileCache {
    /// Returns the cached public key directory, or `None` on a miss.
    async fn public_keys(&self) -> Result<Option<HashMap<String, String>>, CacheError>;

    async fn set_public_keys(&self, keys: &HashMap<String, String>) -> Result<(), CacheError>;

    async fn invalidate_public_keys(&self) -> Result<(), CacheError>;

    async fn users_info(&self) -> Result<Option<UsersInfo>, CacheError>;

    async fn set_users_info(&self, info: &UsersInfo) -> Result<(), CacheError>;

    async fn invalidate_users_info(&self) -> Result<(), CacheError>;
}

/// The cache backend chosen at start-up.
#[derive(Clone)]
pub enum Cache {
    Memory(MemoryCache),
    Redis(RedisCache),
}

impl Default for Cache {
    fn default() -> Self {
        Cache::Memory(MemoryCache::default())
    }
}

impl Cache {
    /// Connects to Redis if a URL is given, and falls back to an in-process cache otherwise.
    pub async fn connect(redis_url: Option<&str>) -> Result<Self, CacheError> {
        match redis_url {
            Some(url) => Ok(Cache::Redis(RedisCache::connect(url).await?)),
            None => Ok(Cache::default()),
        }
    }
}

impl ProfileCache for Cache {
    async fn public_keys(&self) -> Result<Option<HashMap<String, String>>, CacheError> {
        match self {
            Cache::Memory(c) => c.public_keys().await,
            Cache::Redis(c) => c.public_keys().await,
        }
    }

    async fn set_public_keys(&self, keys: &HashMap<String, String>) -> Result<(), CacheError> {
        match self {
            Cache::Memory(c) => c.set_public_keys(keys).await,
            Cache::Redis(c) => c.set_public_keys(keys).await,
        }
    }

    async fn invalidate_public_keys(&self) -> Result<(), CacheError> {
        match self {
            Cache::Memory(c) => c.invalidate_public_keys().await,
            Cache::Redis(c) => c.invalidate_public_keys().await,
        }
    }

    async fn users_info(&self) -> Result<Option<UsersInfo>, CacheError> {
        match self {
            Cache::Memory(c) => c.users_info().await,
            Cache::Redis(c) => c.users_info().await,
        }
    }

    async fn set_users_info(&self, info: &UsersInfo) -> Result<(), CacheError> {
        match self {
            Cache::Memory(c) => c.set_users_info(info).await,
            Cache::Redis(c) => c.set_users_info(info).await,
        }
    }

    async fn invalidate_users_info(&self) -> Result<(), CacheError> {
        match self {
            Cache::Memory(c) => c.invalidate_users_info().await,
            Cache::Redis(c) => c.invalidate_users_info().await,
        }
    }
}
