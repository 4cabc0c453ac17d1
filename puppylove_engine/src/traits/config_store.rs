use std::collections::HashMap;

use log::*;
use plv_common::parse_boolean_flag;
use thiserror::Error;

use crate::db_types::{ConfigKey, Mode};

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for ConfigError {
    fn from(e: sqlx::Error) -> Self {
        ConfigError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait ConfigStore {
    async fn fetch_config(&self, key: ConfigKey) -> Result<Option<String>, ConfigError>;

    async fn set_config(&self, key: ConfigKey, value: &str) -> Result<(), ConfigError>;

    /// Writes the default value of every config key that is not yet set. Existing values are never overwritten.
    /// Returns the keys that were initialised.
    async fn init_config_defaults(&self) -> Result<Vec<ConfigKey>, ConfigError>;

    async fn fetch_all_config(&self) -> Result<HashMap<String, String>, ConfigError>;

    /// Reads a boolean flag. Missing or unparseable values fall back to the key's default.
    async fn is_enabled(&self, key: ConfigKey) -> Result<bool, ConfigError> {
        let value = self.fetch_config(key).await?;
        Ok(parse_boolean_flag(value, key.default_value() == "true"))
    }

    async fn mode(&self) -> Result<Mode, ConfigError> {
        let mode = match self.fetch_config(ConfigKey::Mode).await? {
            Some(value) => value.parse::<Mode>().unwrap_or_else(|e| {
                warn!("🪛️ {e}. Treating PuppyLove as inactive");
                Mode::Inactive
            }),
            None => Mode::Inactive,
        };
        Ok(mode)
    }
}
