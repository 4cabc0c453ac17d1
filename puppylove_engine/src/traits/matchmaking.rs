use chrono::{DateTime, Utc};
use plv_common::Gender;
use thiserror::Error;

use crate::{
    db_types::{
        ClaimRequest,
        DraftError,
        DraftHearts,
        HeartClaim,
        HeartSummary,
        Match,
        NewHeart,
        NewReturnHeart,
        ReturnHeart,
        ReturnHeartSummary,
        SentHeart,
    },
    helpers::ClaimsLogError,
    traits::{ProfileError, PublishOutcome, VerifyOutcome},
};

#[derive(Debug, Clone, Error)]
pub enum MatchmakingError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("No PuppyLove profile exists for {0}")]
    ProfileNotFound(String),
    #[error("Hearts already sent.")]
    AlreadySubmitted,
    #[error("At most {max} hearts can be sent, but {count} were supplied.")]
    TooManyHearts { count: usize, max: usize },
    #[error("A heart with the same digest or payload already exists.")]
    DuplicateHeart,
    #[error("{0}")]
    Draft(#[from] DraftError),
    #[error("Invalid Heart Claim Request.")]
    InvalidClaim,
    #[error("No claim exists for the returned heart.")]
    ClaimNotFound,
    #[error("Unauthorized heart return attempt by {0}. It will be recorded.")]
    UnauthorizedReturn(String),
    #[error("Could not store the returned heart. {0}")]
    ReturnPersistFailed(String),
    #[error("Could not update the claims log. {0}")]
    ClaimsLog(String),
    #[error("Match {0} refers to a profile that does not exist")]
    MissingProfileForMatch(i64),
}

impl From<sqlx::Error> for MatchmakingError {
    fn from(e: sqlx::Error) -> Self {
        MatchmakingError::DatabaseError(e.to_string())
    }
}

impl From<ProfileError> for MatchmakingError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::ProfileNotFound(roll_no) => MatchmakingError::ProfileNotFound(roll_no),
            e => MatchmakingError::DatabaseError(e.to_string()),
        }
    }
}

impl From<ClaimsLogError> for MatchmakingError {
    fn from(e: ClaimsLogError) -> Self {
        MatchmakingError::ClaimsLog(e.to_string())
    }
}

/// The heart exchange state machine.
///
/// A heart moves through the ledger in single atomic steps: Sent -> Claimed -> Returned -> Verified. The digest
/// (`sha`) is the only key correlating a heart with its claim and its return.
#[allow(async_fn_in_trait)]
pub trait MatchmakingDatabase {
    /// Stores the final set of hearts for `roll_no` and marks the profile as submitted, all in a single transaction.
    ///
    /// Empty slots are skipped. If the profile has already submitted, `AlreadySubmitted` is returned and nothing is
    /// stored. Any failure rolls back the entire submission.
    async fn submit_hearts(
        &self,
        roll_no: &str,
        gender: Gender,
        hearts: &[NewHeart],
    ) -> Result<Vec<SentHeart>, MatchmakingError>;

    /// Merges draft hearts into the profile's draft slots. Drafts can be saved after submission.
    async fn save_draft(&self, roll_no: &str, drafts: DraftHearts) -> Result<DraftHearts, MatchmakingError>;

    /// Atomically consumes the sent heart identified by `(sha, enc)`, creates a claim for `roll_no` and appends the
    /// request to the claimer's claims log.
    ///
    /// Returns `InvalidClaim` if no such heart is waiting in the ledger.
    async fn claim_heart(&self, claim: &ClaimRequest, roll_no: &str) -> Result<HeartClaim, MatchmakingError>;

    /// Returns a claimed heart to its sender. `roll_no` must hold the claim for `heart.sha`.
    ///
    /// Returns `Ok(None)` without touching the ledger if the digest or payload is empty.
    async fn return_heart(
        &self,
        heart: &NewReturnHeart,
        roll_no: &str,
    ) -> Result<Option<ReturnHeart>, MatchmakingError>;

    /// Confirms a match. `digest` is the hash of the secret held by the original sender, `roll_no`.
    ///
    /// In one transaction, the returned heart is located by `(digest, enc)` and its claim by `digest`. If the pair is
    /// not already matched, a new match is created and the returned heart is consumed.
    async fn verify_returned_heart(
        &self,
        digest: &str,
        enc: &str,
        roll_no: &str,
    ) -> Result<VerifyOutcome, MatchmakingError>;

    /// Fetches every sent heart created after the user's heart polling cursor, and moves the cursor to `next_cursor`.
    async fn fetch_hearts_since_cursor(
        &self,
        roll_no: &str,
        next_cursor: DateTime<Utc>,
    ) -> Result<Vec<HeartSummary>, MatchmakingError>;

    /// Fetches every returned heart created after the user's return polling cursor, and moves the cursor to
    /// `next_cursor`.
    async fn fetch_return_hearts_since_cursor(
        &self,
        roll_no: &str,
        next_cursor: DateTime<Utc>,
    ) -> Result<Vec<ReturnHeartSummary>, MatchmakingError>;

    async fn fetch_all_matches(&self) -> Result<Vec<Match>, MatchmakingError>;

    /// Fetches the match between the two users, regardless of which of them verified it.
    async fn fetch_match_for_pair(&self, roll_1: &str, roll_2: &str) -> Result<Option<Match>, MatchmakingError>;

    /// Copies every match into the consenting participants' profiles and sets the results-published latch, in one
    /// transaction. Running it a second time is a no-op.
    async fn publish_results(&self) -> Result<PublishOutcome, MatchmakingError>;
}
