use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use log::*;
use plv_common::Gender;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    db_types::{ConfigKey, Mode, Profile},
    helpers::roll_batch,
    plv_api::errors::AdminApiError,
    traits::{ConfigStore, MatchmakingDatabase, ProfileManagement, PublishOutcome},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_registers: u64,
    pub female_registers: u64,
    pub male_registers: u64,
    pub batchwise_registration: BTreeMap<String, u64>,
    pub total_matches: u64,
    pub batchwise_matches: BTreeMap<String, u64>,
}

impl Stats {
    /// Tallies registrations and published matches over the registered profiles.
    pub fn from_profiles(profiles: &[Profile]) -> Self {
        let mut stats = Stats::default();
        for profile in profiles.iter().filter(|p| p.registered) {
            let Some(batch) = roll_batch(&profile.roll_no) else {
                continue;
            };
            match profile.gender {
                Some(Gender::M) => stats.male_registers += 1,
                Some(Gender::F) => stats.female_registers += 1,
                None => {},
            }
            *stats.batchwise_registration.entry(batch).or_default() += 1;
            for peer in profile.matches.0.keys() {
                stats.total_matches += 1;
                if let Some(peer_batch) = roll_batch(peer) {
                    *stats.batchwise_matches.entry(peer_batch).or_default() += 1;
                }
            }
        }
        stats.total_registers = stats.male_registers + stats.female_registers;
        stats
    }
}

/// Statistics are computed on first request after publication, and kept until the next publication.
#[derive(Clone, Default)]
pub struct StatsCache {
    stats: Arc<RwLock<Option<Stats>>>,
}

impl StatsCache {
    pub async fn get(&self) -> Option<Stats> {
        self.stats.read().await.clone()
    }

    pub async fn set(&self, stats: Stats) {
        *self.stats.write().await = Some(stats);
    }

    pub async fn invalidate(&self) {
        *self.stats.write().await = None;
    }
}

/// The current value of every PuppyLove setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    pub permit: bool,
    pub mode: Mode,
    pub results_published: bool,
}

/// `AdminApi` controls the phases of PuppyLove: whether it is active, whether hearts may be sent, and when results
/// are published.
pub struct AdminApi<B> {
    db: B,
    stats: StatsCache,
}

impl<B: Clone> Clone for AdminApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), stats: self.stats.clone() }
    }
}

impl<B> Debug for AdminApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminApi")
    }
}

impl<B> AdminApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, stats: StatsCache::default() }
    }
}

impl<B> AdminApi<B>
where B: MatchmakingDatabase + ProfileManagement + ConfigStore
{
    /// Writes the default value of every unset key. Run once at start-up.
    pub async fn init_config(&self) -> Result<Vec<ConfigKey>, AdminApiError> {
        let keys = self.db.init_config_defaults().await?;
        for key in &keys {
            info!("🪛️ {key} initialised to '{}'", key.default_value());
        }
        Ok(keys)
    }

    /// Flips the permit flag and returns the new value.
    pub async fn toggle_permit(&self) -> Result<bool, AdminApiError> {
        let permit = !self.db.is_enabled(ConfigKey::Permit).await?;
        self.db.set_config(ConfigKey::Permit, &permit.to_string()).await?;
        info!("🪛️ Sending hearts is now {}", if permit { "open" } else { "closed" });
        Ok(permit)
    }

    pub async fn set_mode(&self, mode: Mode) -> Result<(), AdminApiError> {
        self.db.set_config(ConfigKey::Mode, &mode.to_string()).await?;
        info!("🪛️ PuppyLove is now {mode}");
        Ok(())
    }

    pub async fn publish_results(&self) -> Result<PublishOutcome, AdminApiError> {
        let outcome = self.db.publish_results().await?;
        match outcome {
            PublishOutcome::Published { matches, profiles_updated } => {
                info!("🪛️ Results published: {matches} matches, {profiles_updated} profiles updated");
                self.stats.invalidate().await;
            },
            PublishOutcome::AlreadyPublished => info!("🪛️ Results were already published"),
        }
        Ok(outcome)
    }

    /// Returns `None` until the results have been published.
    pub async fn stats(&self) -> Result<Option<Stats>, AdminApiError> {
        if !self.db.is_enabled(ConfigKey::ResultsPublished).await? {
            return Ok(None);
        }
        if let Some(stats) = self.stats.get().await {
            return Ok(Some(stats));
        }
        let profiles = self.db.fetch_registered_profiles().await?;
        let stats = Stats::from_profiles(&profiles);
        debug!("🪛️ Stats computed over {} profiles", profiles.len());
        self.stats.set(stats.clone()).await;
        Ok(Some(stats))
    }

    pub async fn config(&self) -> Result<ConfigSnapshot, AdminApiError> {
        Ok(ConfigSnapshot {
            permit: self.db.is_enabled(ConfigKey::Permit).await?,
            mode: self.db.mode().await?,
            results_published: self.db.is_enabled(ConfigKey::ResultsPublished).await?,
        })
    }

    pub async fn ensure_active(&self) -> Result<(), AdminApiError> {
        match self.db.mode().await? {
            Mode::Active => Ok(()),
            Mode::Inactive => Err(AdminApiError::Inactive),
        }
    }

    pub async fn ensure_permitted(&self) -> Result<(), AdminApiError> {
        if self.db.is_enabled(ConfigKey::Permit).await? {
            Ok(())
        } else {
            Err(AdminApiError::NotPermitted)
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use chrono::Utc;
    use sqlx::types::Json;

    use super::*;

    fn profile(roll_no: &str, gender: Gender, registered: bool, matches: &[&str]) -> Profile {
        let now = Utc::now();
        Profile {
            roll_no: roll_no.to_string(),
            user_id: None,
            gender: Some(gender),
            public_key: String::new(),
            private_key: String::new(),
            data: String::new(),
            claims: String::new(),
            submitted: false,
            registered,
            publish: true,
            matches: Json(matches.iter().map(|m| (m.to_string(), "song".to_string())).collect::<HashMap<_, _>>()),
            about: String::new(),
            interests: String::new(),
            send_hearts_timestamp: now,
            return_hearts_timestamp: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stats_from_profiles() {
        let profiles = vec![
            profile("210001", Gender::M, true, &["220002"]),
            profile("220002", Gender::F, true, &["210001"]),
            profile("220003", Gender::F, true, &[]),
            profile("230004", Gender::M, false, &[]),
        ];
        let stats = Stats::from_profiles(&profiles);
        assert_eq!(stats.total_registers, 3);
        assert_eq!(stats.male_registers, 1);
        assert_eq!(stats.female_registers, 2);
        assert_eq!(stats.batchwise_registration.get("y21"), Some(&1));
        assert_eq!(stats.batchwise_registration.get("y22"), Some(&2));
        assert!(!stats.batchwise_registration.contains_key("y23"));
        assert_eq!(stats.total_matches, 2);
        assert_eq!(stats.batchwise_matches.get("y21"), Some(&1));
        assert_eq!(stats.batchwise_matches.get("y22"), Some(&1));
    }

    #[tokio::test]
    async fn stats_cache_invalidates() {
        let cache = StatsCache::default();
        assert!(cache.get().await.is_none());
        cache.set(Stats::default()).await;
        assert_eq!(cache.get().await, Some(Stats::default()));
        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }
}
