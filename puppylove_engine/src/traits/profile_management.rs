use std::collections::HashMap;

use thiserror::Error;

use crate::{
    db_types::{Profile, Registration},
    traits::UsersInfo,
};

#[derive(Debug, Clone, Error)]
pub enum ProfileError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No PuppyLove profile exists for {0}")]
    ProfileNotFound(String),
    #[error("User {0} is already registered")]
    AlreadyRegistered(String),
    #[error("Please enter another public key.")]
    PublicKeyInUse,
}

impl From<sqlx::Error> for ProfileError {
    fn from(e: sqlx::Error) -> Self {
        ProfileError::DatabaseError(e.to_string())
    }
}

/// Per-user matchmaking state.
#[allow(async_fn_in_trait)]
pub trait ProfileManagement {
    async fn fetch_profile(&self, roll_no: &str) -> Result<Option<Profile>, ProfileError>;

    /// Creates an unregistered profile for `roll_no` if none exists. Calling this more than once is harmless.
    async fn ensure_profile(&self, roll_no: &str, user_id: Option<&str>) -> Result<Profile, ProfileError>;

    /// Completes a user's first login by storing their key pair and draft data and marking them as registered.
    ///
    /// Fails with `AlreadyRegistered` if the profile is registered, and with `PublicKeyInUse` if any other profile
    /// holds the same public key.
    async fn register_profile(&self, registration: Registration) -> Result<Profile, ProfileError>;

    /// Atomically returns the profile to the canonical unregistered state. Gender, about and interests are kept.
    async fn reset_profile(&self, roll_no: &str) -> Result<Profile, ProfileError>;

    async fn update_about(&self, roll_no: &str, about: &str) -> Result<(), ProfileError>;

    async fn update_interests(&self, roll_no: &str, interests: &str) -> Result<(), ProfileError>;

    async fn set_publish_consent(&self, roll_no: &str) -> Result<(), ProfileError>;

    /// Public keys of every registered user, keyed by roll number.
    async fn fetch_public_keys(&self) -> Result<HashMap<String, String>, ProfileError>;

    async fn fetch_users_info(&self) -> Result<UsersInfo, ProfileError>;

    /// The roll numbers of every registered user.
    async fn fetch_active_users(&self) -> Result<Vec<String>, ProfileError>;

    async fn fetch_registered_profiles(&self) -> Result<Vec<Profile>, ProfileError>;
}
