use std::{collections::HashMap, time::Duration};

use moka::future::Cache as MokaCache;

use crate::{
    cache::{CacheError, ProfileCache, ABOUT_MAP_KEY, CACHE_TTL, INTERESTS_MAP_KEY, PUBLIC_KEYS_KEY},
    traits::UsersInfo,
};

/// An in-process cache, used when no Redis server is configured.
#[derive(Clone)]
pub struct MemoryCache {
    maps: MokaCache<&'static str, HashMap<String, String>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(CACHE_TTL)
    }
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self { maps: MokaCache::builder().max_capacity(16).time_to_live(ttl).build() }
    }
}

impl ProfileCache for MemoryCache {
    async fn public_keys(&self) -> Result<Option<HashMap<String, String>>, CacheError> {
        Ok(self.maps.get(PUBLIC_KEYS_KEY).await)
    }

    async fn set_public_keys(&self, keys: &HashMap<String, String>) -> Result<(), CacheError> {
        self.maps.insert(PUBLIC_KEYS_KEY, keys.clone()).await;
        Ok(())
    }

    async fn invalidate_public_keys(&self) -> Result<(), CacheError> {
        self.maps.invalidate(PUBLIC_KEYS_KEY).await;
        Ok(())
    }

    async fn users_info(&self) -> Result<Option<UsersInfo>, CacheError> {
        let about = self.maps.get(ABOUT_MAP_KEY).await;
        let interests = self.maps.get(INTERESTS_MAP_KEY).await;
        match (about, interests) {
            (Some(about), Some(interests)) => Ok(Some(UsersInfo { about, interests })),
            _ => Ok(None),
        }
    }

    async fn set_users_info(&self, info: &UsersInfo) -> Result<(), CacheError> {
        self.maps.insert(ABOUT_MAP_KEY, info.about.clone()).await;
        self.maps.insert(INTERESTS_MAP_KEY, info.interests.clone()).await;
        Ok(())
    }

    async fn invalidate_users_info(&self) -> Result<(), CacheError> {
        self.maps.invalidate(ABOUT_MAP_KEY).await;
        self.maps.invalidate(INTERESTS_MAP_KEY).await;
        Ok(())
    }
}
