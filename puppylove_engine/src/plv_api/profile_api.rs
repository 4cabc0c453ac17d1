use std::{collections::HashMap, fmt::Debug};

use chrono::Utc;
use log::*;
use plv_common::Gender;
use uuid::Uuid;

use crate::{
    cache::{Cache, ProfileCache},
    db_types::{ConfigKey, Profile, Registration},
    jobs::{JobPublisher, ProfileAction, ProfileActionJob},
    plv_api::{
        errors::ProfileApiError,
        profile_objects::{FirstLogin, MyMatches, UserData},
    },
    traits::{ConfigStore, ProfileManagement, UsersInfo},
};

pub const MAX_ABOUT_LENGTH: usize = 70;
pub const MAX_INTERESTS_LENGTH: usize = 50;

/// `ProfileApi` manages a user's PuppyLove profile, and serves the directories (public keys, about and interests)
/// every client downloads.
pub struct ProfileApi<B> {
    db: B,
    cache: Cache,
    publisher: JobPublisher,
}

impl<B: Clone> Clone for ProfileApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), cache: self.cache.clone(), publisher: self.publisher.clone() }
    }
}

impl<B> Debug for ProfileApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProfileApi")
    }
}

impl<B> ProfileApi<B> {
    pub fn new(db: B, cache: Cache, publisher: JobPublisher) -> Self {
        Self { db, cache, publisher }
    }
}

impl<B> ProfileApi<B>
where B: ProfileManagement + ConfigStore
{
    async fn existing_profile(&self, roll_no: &str) -> Result<Profile, ProfileApiError> {
        self.db.fetch_profile(roll_no).await?.ok_or_else(|| ProfileApiError::ProfileNotFound(roll_no.to_string()))
    }

    async fn results_published(&self) -> Result<bool, ProfileApiError> {
        Ok(self.db.is_enabled(ConfigKey::ResultsPublished).await?)
    }

    /// Completes a user's first login.
    pub async fn register(&self, login: FirstLogin) -> Result<Profile, ProfileApiError> {
        let gender = login.gender.parse::<Gender>()?;
        let registration = Registration {
            roll_no: login.roll_no,
            user_id: login.user_id,
            gender,
            public_key: login.public_key,
            private_key: login.private_key,
            data: login.data,
        };
        let profile = self.db.register_profile(registration).await?;
        info!("💘️ {} registered for PuppyLove", profile.roll_no);
        self.evict_public_keys().await;
        Ok(profile)
    }

    pub async fn user_data(&self, roll_no: &str) -> Result<UserData, ProfileApiError> {
        let profile = self.existing_profile(roll_no).await?;
        let permit = self.db.is_enabled(ConfigKey::Permit).await?;
        Ok(UserData::new(profile, permit))
    }

    pub async fn update_about(&self, roll_no: &str, about: &str) -> Result<(), ProfileApiError> {
        if about.chars().count() > MAX_ABOUT_LENGTH {
            return Err(ProfileApiError::TooLong { field: "about", max: MAX_ABOUT_LENGTH });
        }
        self.db.update_about(roll_no, about).await?;
        self.evict_users_info().await;
        Ok(())
    }

    pub async fn update_interests(&self, roll_no: &str, interests: &str) -> Result<(), ProfileApiError> {
        if interests.chars().count() > MAX_INTERESTS_LENGTH {
            return Err(ProfileApiError::TooLong { field: "interests", max: MAX_INTERESTS_LENGTH });
        }
        self.db.update_interests(roll_no, interests).await?;
        self.evict_users_info().await;
        Ok(())
    }

    pub async fn active_users(&self) -> Result<Vec<String>, ProfileApiError> {
        Ok(self.db.fetch_active_users().await?)
    }

    /// The public key of every registered user, keyed by roll number. Served from the cache when possible.
    pub async fn public_keys(&self) -> Result<HashMap<String, String>, ProfileApiError> {
        match self.cache.public_keys().await {
            Ok(Some(keys)) => return Ok(keys),
            Ok(None) => trace!("💘️ Public key cache miss"),
            Err(e) => warn!("💘️ Could not read public keys from the cache. {e}"),
        }
        let keys = self.db.fetch_public_keys().await?;
        if let Err(e) = self.cache.set_public_keys(&keys).await {
            warn!("💘️ Could not cache public keys. {e}");
        }
        Ok(keys)
    }

    /// The about and interests of every registered user. Served from the cache when possible.
    pub async fn all_users_info(&self) -> Result<UsersInfo, ProfileApiError> {
        match self.cache.users_info().await {
            Ok(Some(info)) => return Ok(info),
            Ok(None) => trace!("💘️ Users info cache miss"),
            Err(e) => warn!("💘️ Could not read users info from the cache. {e}"),
        }
        let info = self.db.fetch_users_info().await?;
        if let Err(e) = self.cache.set_users_info(&info).await {
            warn!("💘️ Could not cache users info. {e}");
        }
        Ok(info)
    }

    /// Records the user's consent to have their matches revealed. Consent can no longer be given once the results are
    /// out.
    pub async fn publish_consent(&self, roll_no: &str) -> Result<(), ProfileApiError> {
        if self.results_published().await? {
            return Err(ProfileApiError::ResultsPublished);
        }
        self.db.set_publish_consent(roll_no).await?;
        debug!("💘️ {roll_no} consented to publishing their matches");
        Ok(())
    }

    pub async fn my_matches(&self, roll_no: &str) -> Result<MyMatches, ProfileApiError> {
        if !self.results_published().await? {
            return Ok(MyMatches::NotPublished);
        }
        let profile = self.existing_profile(roll_no).await?;
        if !profile.publish {
            return Ok(MyMatches::NotConsented);
        }
        Ok(MyMatches::Published(profile.matches.0))
    }

    /// Returns the profile to the unregistered state and evicts the cached public key directory.
    pub async fn reset_profile(&self, roll_no: &str) -> Result<Profile, ProfileApiError> {
        let profile = self.db.reset_profile(roll_no).await?;
        info!("💘️ Profile {roll_no} has been reset");
        self.evict_public_keys().await;
        Ok(profile)
    }

    /// Called once the user has passed the password check. Queues the follow-up profile action, and returns it.
    ///
    /// A failure to queue the job is logged, but does not fail the request.
    pub async fn request_profile_access(&self, user_id: Uuid, roll_no: &str) -> Result<ProfileAction, ProfileApiError> {
        let profile = self.db.fetch_profile(roll_no).await?;
        let has_profile = profile.is_some();
        let is_dirty = profile.map(|p| p.registered).unwrap_or(false);
        let action = ProfileAction::for_registration_state(is_dirty);
        let job = ProfileActionJob {
            action,
            user_id,
            roll_no: roll_no.to_string(),
            has_profile,
            is_dirty,
            timestamp: Utc::now().timestamp(),
        };
        if let Err(e) = self.publisher.publish_profile_action(&job) {
            error!("💘️ Could not queue profile action for {roll_no}. {e}");
        }
        Ok(action)
    }

    async fn evict_public_keys(&self) {
        if let Err(e) = self.cache.invalidate_public_keys().await {
            warn!("💘️ Could not evict cached public keys. {e}");
        }
    }

    async fn evict_users_info(&self) {
        if let Err(e) = self.cache.invalidate_users_info().await {
            warn!("💘️ Could not evict cached users info. {e}");
        }
    }
}
