use plv_common::GenderParseError;
use thiserror::Error;

use crate::traits::{ConfigError, MatchmakingError, ProfileError};

#[derive(Debug, Clone, Error)]
pub enum HeartsApiError {
    #[error("{0}")]
    Matchmaking(#[from] MatchmakingError),
    #[error("No PuppyLove profile exists for {0}")]
    ProfileNotFound(String),
    #[error("{0} has not set their gender")]
    GenderNotSet(String),
}

impl From<ProfileError> for HeartsApiError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::ProfileNotFound(roll_no) => HeartsApiError::ProfileNotFound(roll_no),
            e => HeartsApiError::Matchmaking(e.into()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProfileApiError {
    #[error("{0}")]
    Profile(#[from] ProfileError),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    InvalidGender(#[from] GenderParseError),
    #[error("No PuppyLove profile exists for {0}")]
    ProfileNotFound(String),
    #[error("{field} can be at most {max} characters long")]
    TooLong { field: &'static str, max: usize },
    #[error("Results have already been published")]
    ResultsPublished,
}

#[derive(Debug, Clone, Error)]
pub enum AdminApiError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Matchmaking(#[from] MatchmakingError),
    #[error("{0}")]
    Profile(#[from] ProfileError),
    #[error("PuppyLove is not active right now")]
    Inactive,
    #[error("Sending hearts is closed")]
    NotPermitted,
}
