use std::{env, path::PathBuf};

use log::*;
use plv_common::Secret;
use puppylove_engine::jobs::{QueueNames, DEFAULT_MAX_DELIVERIES};

const DEFAULT_PLV_HOST: &str = "127.0.0.1";
const DEFAULT_PLV_PORT: u16 = 8080;
const DEFAULT_ASSETS_DIR: &str = "./assets";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// When absent, the directory caches live in process memory.
    pub redis_url: Option<String>,
    /// Required in the `X-Admin-Token` header of every admin route. Admin routes are closed while this is empty.
    pub admin_token: Secret<String>,
    pub queues: QueueNames,
    /// Uploaded images are moderated from `{assets_dir}/tmp` and published to `{assets_dir}/public`.
    pub assets_dir: PathBuf,
    /// A job that keeps failing is dropped after this many deliveries.
    pub max_deliveries: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PLV_HOST.to_string(),
            port: DEFAULT_PLV_PORT,
            database_url: String::default(),
            redis_url: None,
            admin_token: Secret::default(),
            queues: QueueNames::default(),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            max_deliveries: DEFAULT_MAX_DELIVERIES,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PLV_HOST").ok().unwrap_or_else(|| DEFAULT_PLV_HOST.into());
        let port = env::var("PLV_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PLV_PORT. {e} Using the default, {DEFAULT_PLV_PORT}, instead."
                    );
                    DEFAULT_PLV_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PLV_PORT);
        let database_url = env::var("PLV_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PLV_DATABASE_URL is not set. Please set it to the URL for the PuppyLove database.");
            String::default()
        });
        let redis_url = env::var("PLV_REDIS_URL").ok().filter(|s| !s.trim().is_empty());
        if redis_url.is_none() {
            info!("🪛️ PLV_REDIS_URL is not set. Directory caches will be kept in memory.");
        }
        let admin_token = env::var("PLV_ADMIN_TOKEN").ok().unwrap_or_else(|| {
            warn!("🚨️ PLV_ADMIN_TOKEN is not set. All admin routes will be refused until it is configured.");
            String::default()
        });
        let defaults = QueueNames::default();
        let queues = QueueNames {
            moderation: queue_name("PLV_MODERATION_QUEUE", defaults.moderation),
            mail: queue_name("PLV_MAIL_QUEUE", defaults.mail),
            profile: queue_name("PLV_PROFILE_QUEUE", defaults.profile),
        };
        let assets_dir = env::var("PLV_ASSETS_DIR").ok().unwrap_or_else(|| {
            info!("🪛️ PLV_ASSETS_DIR is not set. Using the default, {DEFAULT_ASSETS_DIR}.");
            DEFAULT_ASSETS_DIR.into()
        });
        let max_deliveries = env::var("PLV_MAX_DELIVERIES")
            .ok()
            .and_then(|s| {
                s.parse::<u32>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for PLV_MAX_DELIVERIES. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_MAX_DELIVERIES);
        Self {
            host,
            port,
            database_url,
            redis_url,
            admin_token: Secret::new(admin_token),
            queues,
            assets_dir: PathBuf::from(assets_dir),
            max_deliveries,
        }
    }
}

fn queue_name(var: &str, default: String) -> String {
    match env::var(var) {
        Ok(s) if !s.trim().is_empty() => s,
        _ => {
            debug!("🪛️ {var} is not set. Using '{default}'.");
            default
        },
    }
}
