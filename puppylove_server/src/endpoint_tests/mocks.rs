use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mockall::mock;
use plv_common::Gender;
use puppylove_engine::{
    db_types::{
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
    },
    traits::{ConfigError, ConfigStore, MatchmakingDatabase, MatchmakingError, ProfileError, ProfileManagement},
    PublishOutcome,
    UsersInfo,
    VerifyOutcome,
};
use sqlx::types::Json;

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl MatchmakingDatabase for Backend {
        async fn submit_hearts(&self, roll_no: &str, gender: Gender, hearts: &[NewHeart]) -> Result<Vec<SentHeart>, MatchmakingError>;
        async fn save_draft(&self, roll_no: &str, drafts: DraftHearts) -> Result<DraftHearts, MatchmakingError>;
        async fn claim_heart(&self, claim: &ClaimRequest, roll_no: &str) -> Result<HeartClaim, MatchmakingError>;
        async fn return_heart(&self, heart: &NewReturnHeart, roll_no: &str) -> Result<Option<ReturnHeart>, MatchmakingError>;
        async fn verify_returned_heart(&self, digest: &str, enc: &str, roll_no: &str) -> Result<VerifyOutcome, MatchmakingError>;
        async fn fetch_hearts_since_cursor(&self, roll_no: &str, next_cursor: DateTime<Utc>) -> Result<Vec<HeartSummary>, MatchmakingError>;
        async fn fetch_return_hearts_since_cursor(&self, roll_no: &str, next_cursor: DateTime<Utc>) -> Result<Vec<ReturnHeartSummary>, MatchmakingError>;
        async fn fetch_all_matches(&self) -> Result<Vec<Match>, MatchmakingError>;
        async fn fetch_match_for_pair(&self, roll_1: &str, roll_2: &str) -> Result<Option<Match>, MatchmakingError>;
        async fn publish_results(&self) -> Result<PublishOutcome, MatchmakingError>;
    }
    impl ProfileManagement for Backend {
        async fn fetch_profile(&self, roll_no: &str) -> Result<Option<Profile>, ProfileError>;
        async fn ensure_profile<'a>(&self, roll_no: &str, user_id: Option<&'a str>) -> Result<Profile, ProfileError>;
        async fn register_profile(&self, registration: Registration) -> Result<Profile, ProfileError>;
        async fn reset_profile(&self, roll_no: &str) -> Result<Profile, ProfileError>;
        async fn update_about(&self, roll_no: &str, about: &str) -> Result<(), ProfileError>;
        async fn update_interests(&self, roll_no: &str, interests: &str) -> Result<(), ProfileError>;
        async fn set_publish_consent(&self, roll_no: &str) -> Result<(), ProfileError>;
        async fn fetch_public_keys(&self) -> Result<HashMap<String, String>, ProfileError>;
        async fn fetch_users_info(&self) -> Result<UsersInfo, ProfileError>;
        async fn fetch_active_users(&self) -> Result<Vec<String>, ProfileError>;
        async fn fetch_registered_profiles(&self) -> Result<Vec<Profile>, ProfileError>;
    }
    impl ConfigStore for Backend {
        async fn fetch_config(&self, key: ConfigKey) -> Result<Option<String>, ConfigError>;
        async fn set_config(&self, key: ConfigKey, value: &str) -> Result<(), ConfigError>;
        async fn init_config_defaults(&self) -> Result<Vec<ConfigKey>, ConfigError>;
        async fn fetch_all_config(&self) -> Result<HashMap<String, String>, ConfigError>;
    }
}

/// A backend whose config table holds the given settings.
pub fn config_backend(mode: &'static str, permit: &'static str, published: &'static str) -> MockBackend {
    let mut db = MockBackend::new();
    db.expect_fetch_config().returning(move |key| {
        let value = match key {
            ConfigKey::Mode => mode,
            ConfigKey::Permit => permit,
            ConfigKey::ResultsPublished => published,
        };
        Ok(Some(value.to_string()))
    });
    db
}

pub fn profile(roll_no: &str, gender: Gender, registered: bool) -> Profile {
    let now = Utc::now();
    Profile {
        roll_no: roll_no.to_string(),
        user_id: None,
        gender: Some(gender),
        public_key: if registered { format!("pk-{roll_no}") } else { String::new() },
        private_key: if registered { format!("sk-{roll_no}") } else { String::new() },
        data: String::new(),
        claims: String::new(),
        submitted: false,
        registered,
        publish: false,
        matches: Json(HashMap::new()),
        about: String::new(),
        interests: String::new(),
        send_hearts_timestamp: now,
        return_hearts_timestamp: now,
        created_at: now,
        updated_at: now,
    }
}
