use std::collections::HashMap;

use log::*;
use redis::{aio::ConnectionManager, AsyncCommands};

use crate::{
    cache::{CacheError, ProfileCache, ABOUT_MAP_KEY, CACHE_TTL, INTERESTS_MAP_KEY, PUBLIC_KEYS_KEY},
    traits::UsersInfo,
};

/// Stores each map as a Redis hash with a one-hour expiry.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!("💘️ Connected to Redis cache");
        Ok(Self { conn })
    }

    /// Redis does not distinguish a missing hash from an empty one, so both read as a miss.
    async fn read_map(&self, key: &str) -> Result<Option<HashMap<String, String>>, CacheError> {
        let mut conn = self.conn.clone();
        let map: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(if map.is_empty() { None } else { Some(map) })
    }

    fn write_map(pipe: &mut redis::Pipeline, key: &str, map: &HashMap<String, String>) {
        pipe.del(key).ignore();
        if !map.is_empty() {
            let items = map.iter().collect::<Vec<_>>();
            pipe.hset_multiple(key, &items).ignore();
            pipe.expire(key, CACHE_TTL.as_secs() as i64).ignore();
        }
    }
}

impl ProfileCache for RedisCache {
    async fn public_keys(&self) -> Result<Option<HashMap<String, String>>, CacheError> {
        self.read_map(PUBLIC_KEYS_KEY).await
    }

    async fn set_public_keys(&self, keys: &HashMap<String, String>) -> Result<(), CacheError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        Self::write_map(&mut pipe, PUBLIC_KEYS_KEY, keys);
        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn invalidate_public_keys(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(PUBLIC_KEYS_KEY).await?;
        Ok(())
    }

    async fn users_info(&self) -> Result<Option<UsersInfo>, CacheError> {
        let about = self.read_map(ABOUT_MAP_KEY).await?;
        let interests = self.read_map(INTERESTS_MAP_KEY).await?;
        match (about, interests) {
            (None, None) => Ok(None),
            (about, interests) => {
                Ok(Some(UsersInfo { about: about.unwrap_or_default(), interests: interests.unwrap_or_default() }))
            },
        }
    }

    async fn set_users_info(&self, info: &UsersInfo) -> Result<(), CacheError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        Self::write_map(&mut pipe, ABOUT_MAP_KEY, &info.about);
        Self::write_map(&mut pipe, INTERESTS_MAP_KEY, &info.interests);
        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn invalidate_users_info(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(&[ABOUT_MAP_KEY, INTERESTS_MAP_KEY][..]).await?;
        Ok(())
    }
}
