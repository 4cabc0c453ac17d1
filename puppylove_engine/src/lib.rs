//! PuppyLove Engine
//!
//! PuppyLove is an anonymous heart exchange. Users send encrypted hearts through the server, which never learns who
//! sent a heart to whom until both sides have cryptographically confirmed a mutual match.
//!
//! The library is divided into the following sections:
//! 1. Persistence ([`mod@traits`] and [`SqliteDatabase`]). The traits describe the heart ledger, profiles, config and
//!    moderated assets. SQLite is the only backend. You should never need to access the database directly; use the
//!    public API instead. The data types stored in the database live in [`mod@db_types`].
//! 2. The public API ([`HeartsApi`], [`ProfileApi`] and [`AdminApi`]).
//! 3. Job queues and workers ([`mod@jobs`]). Moderation, mail and profile preparation run in the background, with
//!    at-least-once delivery.
//! 4. Read-through caches for the directories every client downloads ([`mod@cache`]).
pub mod cache;
pub mod db_types;
pub mod helpers;
pub mod jobs;
mod plv_api;
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use plv_api::{
    admin_api::{AdminApi, ConfigSnapshot, Stats, StatsCache},
    errors::{AdminApiError, HeartsApiError, ProfileApiError},
    heart_objects::{ReturnReport, SubmitOutcome},
    hearts_api::HeartsApi,
    profile_api::{ProfileApi, MAX_ABOUT_LENGTH, MAX_INTERESTS_LENGTH},
    profile_objects::{FirstLogin, MyMatches, UserData},
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db, SqliteDatabase};
pub use traits::{
    AssetStore,
    ConfigStore,
    MatchmakingDatabase,
    MatchmakingError,
    ProfileError,
    ProfileManagement,
    PublishOutcome,
    PuppyLoveBackend,
    UsersInfo,
    VerifyOutcome,
};
