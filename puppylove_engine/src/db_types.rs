use std::{
    collections::HashMap,
    fmt::Display,
    str::FromStr,
};

use chrono::{DateTime, Utc};
use plv_common::Gender;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

/// The maximum number of hearts a user may send, and the number of draft slots they have.
pub const MAX_HEARTS: usize = 4;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Profile        ---------------------------------------------------------
/// A user's matchmaking state. `registered` is only set once the user has completed their first login and uploaded
/// their key pair.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub roll_no: String,
    pub user_id: Option<String>,
    pub gender: Option<Gender>,
    pub public_key: String,
    pub private_key: String,
    /// Opaque draft data. Usually the JSON form of [`DraftHearts`].
    pub data: String,
    /// The `+`-delimited log of URL-escaped claim requests made by this user.
    pub claims: String,
    pub submitted: bool,
    pub registered: bool,
    pub publish: bool,
    pub matches: Json<HashMap<String, String>>,
    pub about: String,
    pub interests: String,
    pub send_hearts_timestamp: DateTime<Utc>,
    pub return_hearts_timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// True if the profile is in the canonical unregistered state.
    pub fn is_pristine(&self) -> bool {
        !self.registered &&
            self.public_key.is_empty() &&
            self.private_key.is_empty() &&
            self.data.is_empty() &&
            self.claims.is_empty() &&
            self.matches.0.is_empty() &&
            !self.submitted &&
            !self.publish
    }

    pub fn draft_hearts(&self) -> DraftHearts {
        DraftHearts::from_data(&self.data)
    }
}

//--------------------------------------     Registration      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub roll_no: String,
    pub user_id: Option<String>,
    pub gender: Gender,
    pub public_key: String,
    pub private_key: String,
    pub data: String,
}

//--------------------------------------       SentHeart       ---------------------------------------------------------
/// A heart waiting in the ledger to be claimed by its recipient.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SentHeart {
    pub id: i64,
    pub sha: String,
    pub enc: String,
    pub song_enc: String,
    pub gender_of_sender: Gender,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHeart {
    pub sha: String,
    pub enc: String,
    #[serde(rename = "songID_enc", default)]
    pub song_enc: String,
}

impl NewHeart {
    pub fn new<S: Into<String>>(sha: S, enc: S, song_enc: S) -> Self {
        Self { sha: sha.into(), enc: enc.into(), song_enc: song_enc.into() }
    }

    /// Slots with a missing digest or payload are treated as unused.
    pub fn is_empty(&self) -> bool {
        self.sha.is_empty() || self.enc.is_empty()
    }
}

/// The view of a sent heart that every user polls for.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HeartSummary {
    pub enc: String,
    #[serde(rename = "genderOfSender")]
    pub gender_of_sender: Gender,
}

//--------------------------------------      HeartClaim       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HeartClaim {
    /// The encrypted payload of the claimed heart doubles as the claim id.
    pub claim_id: String,
    pub sha: String,
    pub roll_no: String,
    pub song_enc: String,
    pub created_at: DateTime<Utc>,
}

/// A request to claim a heart. The serialized form of this request is what ends up in the claimer's claims log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub enc: String,
    pub sha: String,
    #[serde(rename = "songID_enc", default)]
    pub song_enc: String,
    #[serde(rename = "genderOfSender")]
    pub gender_of_sender: Gender,
}

//--------------------------------------      ReturnHeart      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReturnHeart {
    pub id: i64,
    pub sha: String,
    pub enc: String,
    pub song_enc: String,
    pub created_at: DateTime<Utc>,
}

/// A claimed heart being handed back to its sender, so that the sender can prove the match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReturnHeart {
    pub sha: String,
    pub enc: String,
    #[serde(rename = "songID_enc", default)]
    pub song_enc: String,
}

impl NewReturnHeart {
    pub fn new<S: Into<String>>(sha: S, enc: S, song_enc: S) -> Self {
        Self { sha: sha.into(), enc: enc.into(), song_enc: song_enc.into() }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReturnHeartSummary {
    pub sha: String,
    pub enc: String,
}

//--------------------------------------         Match         ---------------------------------------------------------
/// A confirmed mutual match. `roll_a` is the user that verified the returned heart.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Match {
    pub id: i64,
    pub roll_a: String,
    pub roll_b: String,
    /// The song `roll_a` attached to the heart `roll_b` claimed. Shown to `roll_b`.
    pub song_a_to_b: String,
    /// The song `roll_b` attached when returning the heart. Shown to `roll_a`.
    pub song_b_to_a: String,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn involves(&self, roll_no: &str) -> bool {
        self.roll_a == roll_no || self.roll_b == roll_no
    }
}

//--------------------------------------      DraftHearts      ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftHeart {
    #[serde(default)]
    pub sha_encrypt: String,
    #[serde(default)]
    pub id_encrypt: String,
    #[serde(rename = "songID_enc", default)]
    pub song_id_enc: String,
}

impl DraftHeart {
    pub fn is_empty(&self) -> bool {
        self.sha_encrypt.is_empty()
    }
}

/// The four positional draft slots stored in a profile's `data` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftHearts {
    #[serde(default)]
    pub heart1: DraftHeart,
    #[serde(default)]
    pub heart2: DraftHeart,
    #[serde(default)]
    pub heart3: DraftHeart,
    #[serde(default)]
    pub heart4: DraftHeart,
}

impl DraftHearts {
    /// Parses stored draft data. Anything that is not valid draft JSON counts as an empty draft.
    pub fn from_data(data: &str) -> Self {
        if data.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(data).unwrap_or_default()
    }

    pub fn slots(&self) -> [&DraftHeart; MAX_HEARTS] {
        [&self.heart1, &self.heart2, &self.heart3, &self.heart4]
    }

    fn slots_mut(&mut self) -> [&mut DraftHeart; MAX_HEARTS] {
        [&mut self.heart1, &mut self.heart2, &mut self.heart3, &mut self.heart4]
    }

    pub fn count(&self) -> usize {
        self.slots().iter().filter(|h| !h.is_empty()).count()
    }

    /// Merges `incoming` into this draft, slot by slot.
    ///
    /// The total number of filled slots is checked first, then each incoming slot must land on an empty one.
    pub fn merge(&mut self, incoming: DraftHearts) -> Result<(), DraftError> {
        let current = self.count();
        let added = incoming.count();
        if current + added > MAX_HEARTS {
            return Err(DraftError::LimitExceeded { current, limit: MAX_HEARTS });
        }
        for (i, (existing, new)) in self.slots().iter().zip(incoming.slots()).enumerate() {
            if !new.is_empty() && !existing.is_empty() {
                return Err(DraftError::SlotOccupied(i + 1));
            }
        }
        let DraftHearts { heart1, heart2, heart3, heart4 } = incoming;
        for (slot, new) in self.slots_mut().into_iter().zip([heart1, heart2, heart3, heart4]) {
            if !new.is_empty() {
                *slot = new;
            }
        }
        Ok(())
    }

    pub fn to_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Draft heart limit exceeded. You have {current} of {limit} drafts saved.")]
    LimitExceeded { current: usize, limit: usize },
    #[error("You already have a draft in slot {0}. Please submit or clear it first.")]
    SlotOccupied(usize),
}

//--------------------------------------       ConfigKey       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Permit,
    Mode,
    ResultsPublished,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [ConfigKey::Permit, ConfigKey::Mode, ConfigKey::ResultsPublished];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Permit => "puppylove_permit",
            ConfigKey::Mode => "puppylove_mode",
            ConfigKey::ResultsPublished => "puppylove_results_published",
        }
    }

    pub fn default_value(&self) -> &'static str {
        match self {
            ConfigKey::Permit => "true",
            ConfigKey::Mode => "inactive",
            ConfigKey::ResultsPublished => "false",
        }
    }
}

impl Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//--------------------------------------         Mode          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Active,
    Inactive,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Active => write!(f, "active"),
            Mode::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for Mode {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            s => Err(ConversionError(format!("Invalid mode: {s}"))),
        }
    }
}

//--------------------------------------      AssetStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
pub enum AssetStatus {
    Pending,
    Approved,
    Rejected,
}

impl Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetStatus::Pending => write!(f, "Pending"),
            AssetStatus::Approved => write!(f, "Approved"),
            AssetStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

//--------------------------------------         Asset         ---------------------------------------------------------
/// User-contributed content that goes through moderation. Text assets carry their content inline; image assets live
/// on disk under the assets directory.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub asset_id: String,
    pub owner_email: String,
    pub content: Option<String>,
    pub status: AssetStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
