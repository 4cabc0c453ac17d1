//! # Database backend contracts
//!
//! This module defines the behaviour that a database backend must expose in order to drive the PuppyLove engine.
//!
//! * [`MatchmakingDatabase`] owns the heart ledger and match table: submitting, claiming, returning and verifying
//!   hearts, and publishing the results.
//! * [`ProfileManagement`] covers per-user matchmaking state: registration, resets and profile features.
//! * [`ConfigStore`] is the key/value table that gates the protocol phases.
//! * [`AssetStore`] tracks the moderation status of user-contributed content.
//!
//! [`PuppyLoveBackend`] is a convenience bound for anything that implements the first three.
mod asset_store;
mod config_store;
mod data_objects;
mod matchmaking;
mod profile_management;

pub use asset_store::{AssetStore, AssetStoreError};
pub use config_store::{ConfigError, ConfigStore};
pub use data_objects::{PublishOutcome, UsersInfo, VerifyOutcome};
pub use matchmaking::{MatchmakingDatabase, MatchmakingError};
pub use profile_management::{ProfileError, ProfileManagement};

/// Everything the HTTP surface needs from a backend.
pub trait PuppyLoveBackend: MatchmakingDatabase + ProfileManagement + ConfigStore + Clone {}

impl<T> PuppyLoveBackend for T where T: MatchmakingDatabase + ProfileManagement + ConfigStore + Clone {}
