use std::collections::HashMap;

use plv_common::Gender;
use serde::Serialize;

use crate::db_types::Profile;

/// Everything a user's client needs to restore its state after logging in.
#[derive(Debug, Clone, Serialize)]
pub struct UserData {
    pub roll_no: String,
    pub registered: bool,
    pub gender: Option<Gender>,
    pub public_key: String,
    pub private_key: String,
    pub data: String,
    pub submitted: bool,
    pub claims: String,
    pub permit: bool,
    pub publish: bool,
    pub about: String,
    pub interests: String,
}

impl UserData {
    pub fn new(profile: Profile, permit: bool) -> Self {
        Self {
            roll_no: profile.roll_no,
            registered: profile.registered,
            gender: profile.gender,
            public_key: profile.public_key,
            private_key: profile.private_key,
            data: profile.data,
            submitted: profile.submitted,
            claims: profile.claims,
            permit,
            publish: profile.publish,
            about: profile.about,
            interests: profile.interests,
        }
    }
}

/// The new-registration request, before validation.
#[derive(Debug, Clone)]
pub struct FirstLogin {
    pub roll_no: String,
    pub user_id: Option<String>,
    pub gender: String,
    pub public_key: String,
    pub private_key: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "matches", rename_all = "snake_case")]
pub enum MyMatches {
    NotPublished,
    NotConsented,
    Published(HashMap<String, String>),
}
