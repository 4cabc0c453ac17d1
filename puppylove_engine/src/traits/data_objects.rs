use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db_types::Match;

/// The result of verifying a returned heart. A match that already exists for the pair is not an error.
#[derive(Debug, Clone, Serialize)]
pub enum VerifyOutcome {
    Matched(Match),
    AlreadyMatched,
}

impl VerifyOutcome {
    pub fn is_new_match(&self) -> bool {
        matches!(self, VerifyOutcome::Matched(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublishOutcome {
    Published { matches: usize, profiles_updated: usize },
    AlreadyPublished,
}

/// The about and interests of every registered user, keyed by roll number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersInfo {
    pub about: HashMap<String, String>,
    pub interests: HashMap<String, String>,
}

impl UsersInfo {
    pub fn is_empty(&self) -> bool {
        self.about.is_empty() && self.interests.is_empty()
    }
}
