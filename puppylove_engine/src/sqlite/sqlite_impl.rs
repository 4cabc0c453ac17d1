//! `SqliteDatabase` is a concrete implementation of a PuppyLove engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
//!
//! SQLite only allows one writer at a time. Every multi-statement transaction here opens with a write, so that the
//! write lock is taken up front and competing writers wait on the busy timeout instead of failing to upgrade a read
//! lock.
use std::{collections::HashMap, fmt::Debug};

use chrono::{DateTime, Utc};
use log::*;
use plv_common::Gender;
use sqlx::{migrate, migrate::MigrateError, SqlitePool};

use super::db::{
    assets,
    claims,
    config,
    db_url,
    hearts,
    matches,
    new_pool,
    profiles,
    profiles::PollCursor,
    return_hearts,
};
use crate::{
    db_types::{
        Asset,
        AssetStatus,
        ClaimRequest,
        ConfigKey,
        DraftHearts,
        HeartClaim,
        HeartSummary,
        Match,
        NewHeart,
        NewReturnHeart,
        Profile,
        Registration,
        ReturnHeart,
        ReturnHeartSummary,
        SentHeart,
        MAX_HEARTS,
    },
    helpers::append_claim,
    traits::{
        AssetStore,
        AssetStoreError,
        ConfigError,
        ConfigStore,
        MatchmakingDatabase,
        MatchmakingError,
        ProfileError,
        ProfileManagement,
        PublishOutcome,
        UsersInfo,
        VerifyOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MatchmakingDatabase for SqliteDatabase {
    async fn submit_hearts(
        &self,
        roll_no: &str,
        gender: Gender,
        hearts: &[NewHeart],
    ) -> Result<Vec<SentHeart>, MatchmakingError> {
        if hearts.len() > MAX_HEARTS {
            return Err(MatchmakingError::TooManyHearts { count: hearts.len(), max: MAX_HEARTS });
        }
        let mut tx = self.pool.begin().await?;
        if !profiles::mark_submitted(roll_no, &mut tx).await? {
            return match profiles::fetch_profile(roll_no, &mut tx).await? {
                Some(_) => Err(MatchmakingError::AlreadySubmitted),
                None => Err(MatchmakingError::ProfileNotFound(roll_no.to_string())),
            };
        }
        let mut sent = Vec::with_capacity(hearts.len());
        for heart in hearts.iter().filter(|h| !h.is_empty()) {
            let heart = hearts::insert_heart(heart, gender, &mut tx).await?;
            sent.push(heart);
        }
        tx.commit().await?;
        debug!("🗃️ {roll_no} submitted {} hearts", sent.len());
        Ok(sent)
    }

    async fn save_draft(&self, roll_no: &str, drafts: DraftHearts) -> Result<DraftHearts, MatchmakingError> {
        let mut tx = self.pool.begin().await?;
        // Touch the row first so that the write lock is held while the draft is merged
        profiles::touch(roll_no, &mut tx).await?;
        let profile = profiles::fetch_existing_profile(roll_no, &mut tx).await?;
        let mut current = profile.draft_hearts();
        current.merge(drafts)?;
        profiles::update_draft_data(roll_no, &current.to_data(), &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ Draft for {roll_no} now holds {} hearts", current.count());
        Ok(current)
    }

    async fn claim_heart(&self, claim: &ClaimRequest, roll_no: &str) -> Result<HeartClaim, MatchmakingError> {
        let mut tx = self.pool.begin().await?;
        let heart = hearts::take_heart(&claim.sha, &claim.enc, &mut tx).await?.ok_or(MatchmakingError::InvalidClaim)?;
        let new_claim = claims::insert_claim(&heart, roll_no, &mut tx).await?;
        let profile = profiles::fetch_existing_profile(roll_no, &mut tx).await?;
        let log = append_claim(&profile.claims, claim)?;
        profiles::update_claims(roll_no, &log, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Heart #{} claimed by {roll_no}", heart.id);
        Ok(new_claim)
    }

    async fn return_heart(
        &self,
        heart: &NewReturnHeart,
        roll_no: &str,
    ) -> Result<Option<ReturnHeart>, MatchmakingError> {
        if heart.sha.is_empty() || heart.enc.is_empty() {
            return Ok(None);
        }
        let mut conn = self.pool.acquire().await?;
        if claims::fetch_claim_for_user(&heart.sha, roll_no, &mut conn).await?.is_none() {
            return Err(MatchmakingError::UnauthorizedReturn(roll_no.to_string()));
        }
        let returned = return_hearts::insert_return_heart(heart, &mut conn)
            .await
            .map_err(|e| MatchmakingError::ReturnPersistFailed(e.to_string()))?;
        debug!("🗃️ {roll_no} returned heart #{}", returned.id);
        Ok(Some(returned))
    }

    async fn verify_returned_heart(
        &self,
        digest: &str,
        enc: &str,
        roll_no: &str,
    ) -> Result<VerifyOutcome, MatchmakingError> {
        let mut tx = self.pool.begin().await?;
        let returned =
            return_hearts::take_return_heart(digest, enc, &mut tx).await?.ok_or(MatchmakingError::InvalidClaim)?;
        let claim = claims::fetch_claim_by_sha(digest, &mut tx).await?.ok_or(MatchmakingError::ClaimNotFound)?;
        if claim.roll_no == roll_no {
            return Err(MatchmakingError::InvalidClaim);
        }
        if matches::fetch_match_for_pair(roll_no, &claim.roll_no, &mut tx).await?.is_some() {
            // The returned heart stays in the ledger
            tx.rollback().await?;
            return Ok(VerifyOutcome::AlreadyMatched);
        }
        match matches::insert_match(roll_no, &claim, &returned, &mut tx).await? {
            Some(m) => {
                tx.commit().await?;
                info!("🗃️ Match #{} confirmed", m.id);
                Ok(VerifyOutcome::Matched(m))
            },
            None => {
                tx.rollback().await?;
                Ok(VerifyOutcome::AlreadyMatched)
            },
        }
    }

    async fn fetch_hearts_since_cursor(
        &self,
        roll_no: &str,
        next_cursor: DateTime<Utc>,
    ) -> Result<Vec<HeartSummary>, MatchmakingError> {
        let mut conn = self.pool.acquire().await?;
        let since = profiles::fetch_cursor(roll_no, PollCursor::SentHearts, &mut conn)
            .await?
            .ok_or_else(|| MatchmakingError::ProfileNotFound(roll_no.to_string()))?;
        let hearts = hearts::fetch_hearts_since(since, &mut conn).await?;
        profiles::move_cursor(roll_no, PollCursor::SentHearts, next_cursor, &mut conn).await?;
        Ok(hearts)
    }

    async fn fetch_return_hearts_since_cursor(
        &self,
        roll_no: &str,
        next_cursor: DateTime<Utc>,
    ) -> Result<Vec<ReturnHeartSummary>, MatchmakingError> {
        let mut conn = self.pool.acquire().await?;
        let since = profiles::fetch_cursor(roll_no, PollCursor::ReturnHearts, &mut conn)
            .await?
            .ok_or_else(|| MatchmakingError::ProfileNotFound(roll_no.to_string()))?;
        let hearts = return_hearts::fetch_return_hearts_since(since, &mut conn).await?;
        profiles::move_cursor(roll_no, PollCursor::ReturnHearts, next_cursor, &mut conn).await?;
        Ok(hearts)
    }

    async fn fetch_all_matches(&self) -> Result<Vec<Match>, MatchmakingError> {
        let mut conn = self.pool.acquire().await?;
        let matches = matches::fetch_all_matches(&mut conn).await?;
        Ok(matches)
    }

    async fn fetch_match_for_pair(&self, roll_1: &str, roll_2: &str) -> Result<Option<Match>, MatchmakingError> {
        let mut conn = self.pool.acquire().await?;
        let m = matches::fetch_match_for_pair(roll_1, roll_2, &mut conn).await?;
        Ok(m)
    }

    /// Each side of a match only learns about the other if they consented to publication. `roll_a` is shown the song
    /// `roll_b` returned, and `roll_b` is shown the song `roll_a` originally sent.
    async fn publish_results(&self) -> Result<PublishOutcome, MatchmakingError> {
        let mut tx = self.pool.begin().await?;
        if !config::set_latch(ConfigKey::ResultsPublished, &mut tx).await? {
            return Ok(PublishOutcome::AlreadyPublished);
        }
        let all_matches = matches::fetch_all_matches(&mut tx).await?;
        let mut updated: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut consent: HashMap<String, bool> = HashMap::new();
        for m in &all_matches {
            for roll_no in [&m.roll_a, &m.roll_b] {
                if !consent.contains_key(roll_no) {
                    let profile = profiles::fetch_profile(roll_no, &mut tx)
                        .await?
                        .ok_or(MatchmakingError::MissingProfileForMatch(m.id))?;
                    if profile.publish {
                        updated.insert(roll_no.clone(), profile.matches.0.clone());
                    }
                    consent.insert(roll_no.clone(), profile.publish);
                }
            }
            if let Some(matches_a) = updated.get_mut(&m.roll_a) {
                matches_a.insert(m.roll_b.clone(), m.song_b_to_a.clone());
            }
            if let Some(matches_b) = updated.get_mut(&m.roll_b) {
                matches_b.insert(m.roll_a.clone(), m.song_a_to_b.clone());
            }
        }
        let mut profiles_updated = 0;
        for (roll_no, their_matches) in &updated {
            if their_matches.is_empty() {
                continue;
            }
            profiles::update_matches(roll_no, their_matches, &mut tx).await?;
            profiles_updated += 1;
        }
        tx.commit().await?;
        info!("🗃️ Results published. {} matches, {profiles_updated} profiles updated", all_matches.len());
        Ok(PublishOutcome::Published { matches: all_matches.len(), profiles_updated })
    }
}

impl ProfileManagement for SqliteDatabase {
    async fn fetch_profile(&self, roll_no: &str) -> Result<Option<Profile>, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::fetch_profile(roll_no, &mut conn).await?;
        Ok(profile)
    }

    async fn ensure_profile(&self, roll_no: &str, user_id: Option<&str>) -> Result<Profile, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::insert_if_missing(roll_no, user_id, &mut conn).await?;
        Ok(profile)
    }

    async fn register_profile(&self, registration: Registration) -> Result<Profile, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::register(registration, &mut conn).await?;
        info!("🗃️ {} has registered for PuppyLove", profile.roll_no);
        Ok(profile)
    }

    async fn reset_profile(&self, roll_no: &str) -> Result<Profile, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::reset(roll_no, &mut conn)
            .await?
            .ok_or_else(|| ProfileError::ProfileNotFound(roll_no.to_string()))?;
        info!("🗃️ Profile for {roll_no} has been reset");
        Ok(profile)
    }

    async fn update_about(&self, roll_no: &str, about: &str) -> Result<(), ProfileError> {
        let mut conn = self.pool.acquire().await?;
        profiles::update_about(roll_no, about, &mut conn).await
    }

    async fn update_interests(&self, roll_no: &str, interests: &str) -> Result<(), ProfileError> {
        let mut conn = self.pool.acquire().await?;
        profiles::update_interests(roll_no, interests, &mut conn).await
    }

    async fn set_publish_consent(&self, roll_no: &str) -> Result<(), ProfileError> {
        let mut conn = self.pool.acquire().await?;
        profiles::set_publish(roll_no, &mut conn).await
    }

    async fn fetch_public_keys(&self) -> Result<HashMap<String, String>, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        let keys = profiles::fetch_public_keys(&mut conn).await?;
        Ok(keys)
    }

    async fn fetch_users_info(&self) -> Result<UsersInfo, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        let info = profiles::fetch_users_info(&mut conn).await?;
        Ok(info)
    }

    async fn fetch_active_users(&self) -> Result<Vec<String>, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        let users = profiles::fetch_active_users(&mut conn).await?;
        Ok(users)
    }

    async fn fetch_registered_profiles(&self) -> Result<Vec<Profile>, ProfileError> {
        let mut conn = self.pool.acquire().await?;
        let profiles = profiles::fetch_registered_profiles(&mut conn).await?;
        Ok(profiles)
    }
}

impl ConfigStore for SqliteDatabase {
    async fn fetch_config(&self, key: ConfigKey) -> Result<Option<String>, ConfigError> {
        let mut conn = self.pool.acquire().await?;
        let value = config::fetch_config(key, &mut conn).await?;
        Ok(value)
    }

    async fn set_config(&self, key: ConfigKey, value: &str) -> Result<(), ConfigError> {
        let mut conn = self.pool.acquire().await?;
        config::upsert_config(key, value, &mut conn).await?;
        debug!("🗃️ Config {key} set to {value}");
        Ok(())
    }

    async fn init_config_defaults(&self) -> Result<Vec<ConfigKey>, ConfigError> {
        let mut conn = self.pool.acquire().await?;
        let mut initialised = Vec::new();
        for key in ConfigKey::ALL {
            if config::insert_config_if_missing(key, key.default_value(), &mut conn).await? {
                info!("🗃️ Config initialised: {key} = {}", key.default_value());
                initialised.push(key);
            }
        }
        Ok(initialised)
    }

    async fn fetch_all_config(&self) -> Result<HashMap<String, String>, ConfigError> {
        let mut conn = self.pool.acquire().await?;
        let values = config::fetch_all_config(&mut conn).await?;
        Ok(values)
    }
}

impl AssetStore for SqliteDatabase {
    async fn insert_asset(
        &self,
        asset_id: &str,
        owner_email: &str,
        content: Option<&str>,
    ) -> Result<Asset, AssetStoreError> {
        let mut conn = self.pool.acquire().await?;
        let asset = assets::insert_asset(asset_id, owner_email, content, &mut conn).await?;
        Ok(asset)
    }

    async fn fetch_asset(&self, asset_id: &str) -> Result<Option<Asset>, AssetStoreError> {
        let mut conn = self.pool.acquire().await?;
        let asset = assets::fetch_asset(asset_id, &mut conn).await?;
        Ok(asset)
    }

    async fn set_asset_status(&self, asset_id: &str, status: AssetStatus) -> Result<(), AssetStoreError> {
        let mut conn = self.pool.acquire().await?;
        assets::update_status(asset_id, status, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// The URL of the database
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }
}
