use std::fmt::Display;

use puppylove_engine::db_types::{DraftHearts, Mode, NewHeart, NewReturnHeart, MAX_HEARTS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Uploaded on first login, once the client has generated the user's key pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstLoginRequest {
    pub gender: String,
    #[serde(rename = "pubKey")]
    pub public_key: String,
    #[serde(rename = "privKey")]
    pub private_key: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendHeartsRequest {
    #[serde(default)]
    pub hearts: Vec<NewHeart>,
    #[serde(rename = "returnhearts", default)]
    pub return_hearts: Vec<NewReturnHeart>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftRequest {
    pub hearts: DraftHearts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftCount {
    pub count: usize,
    pub limit: usize,
    pub remaining: usize,
}

impl DraftCount {
    pub fn new(count: usize) -> Self {
        Self { count, limit: MAX_HEARTS, remaining: MAX_HEARTS.saturating_sub(count) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnHeartsRequest {
    #[serde(rename = "returnhearts")]
    pub return_hearts: Vec<NewReturnHeart>,
}

/// The original sender of a returned heart reveals the secret behind its digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub enc: String,
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AboutRequest {
    pub about: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestsRequest {
    #[serde(default)]
    pub interests: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRequest {
    pub mode: Mode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermitResponse {
    pub permit: bool,
}
