//! The heart exchange protocol, as seen by a single user.
use std::{fmt::Debug, sync::Arc};

use chrono::{Duration, Utc};
use log::*;
use tokio::sync::Mutex;

use crate::{
    db_types::{
        ClaimRequest,
        DraftHearts,
        HeartClaim,
        HeartSummary,
        NewHeart,
        NewReturnHeart,
        ReturnHeart,
        ReturnHeartSummary,
    },
    helpers::heart_digest,
    plv_api::{
        errors::HeartsApiError,
        heart_objects::{ReturnReport, SubmitOutcome},
    },
    traits::{MatchmakingDatabase, MatchmakingError, ProfileManagement, VerifyOutcome},
};

/// Hearts created in the minute before a poll are handed out again on the next poll, so that a heart committed just
/// as the cursor moved is never missed.
const POLL_OVERLAP_MINUTES: i64 = 1;

/// `HeartsApi` drives hearts through the ledger: submission, drafts, claims, returns and match verification.
///
/// Claims, returns and verifications are serialized by a single exclusion lock shared by every clone of the API.
pub struct HeartsApi<B> {
    db: B,
    lock: Arc<Mutex<()>>,
}

impl<B: Clone> Clone for HeartsApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), lock: Arc::clone(&self.lock) }
    }
}

impl<B> Debug for HeartsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HeartsApi")
    }
}

impl<B> HeartsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, lock: Arc::new(Mutex::new(())) }
    }
}

impl<B> HeartsApi<B>
where B: MatchmakingDatabase + ProfileManagement
{
    /// Submits the user's final hearts, then processes any returns bundled with the submission.
    ///
    /// The hearts are stored all-or-nothing. Once they are stored, a failing return cannot undo the submission; it
    /// only turns the outcome into [`SubmitOutcome::PartialSuccess`].
    pub async fn submit(
        &self,
        roll_no: &str,
        hearts: &[NewHeart],
        returns: &[NewReturnHeart],
    ) -> Result<SubmitOutcome, HeartsApiError> {
        let profile =
            self.db.fetch_profile(roll_no).await?.ok_or_else(|| HeartsApiError::ProfileNotFound(roll_no.to_string()))?;
        let gender = profile.gender.ok_or_else(|| HeartsApiError::GenderNotSet(roll_no.to_string()))?;
        let sent = self.db.submit_hearts(roll_no, gender, hearts).await?;
        info!("💘️ {roll_no} submitted {} hearts", sent.len());
        let report = self.late_return(roll_no, returns).await;
        if report.is_clean() {
            Ok(SubmitOutcome::Submitted(sent))
        } else {
            Ok(SubmitOutcome::PartialSuccess { hearts: sent, failed_returns: report.failures })
        }
    }

    /// Merges the given slots into the user's drafts.
    pub async fn save_draft(&self, roll_no: &str, drafts: DraftHearts) -> Result<DraftHearts, HeartsApiError> {
        let merged = self.db.save_draft(roll_no, drafts).await?;
        Ok(merged)
    }

    /// The number of filled draft slots.
    pub async fn draft_count(&self, roll_no: &str) -> Result<usize, HeartsApiError> {
        let profile =
            self.db.fetch_profile(roll_no).await?.ok_or_else(|| HeartsApiError::ProfileNotFound(roll_no.to_string()))?;
        Ok(profile.draft_hearts().count())
    }

    pub async fn claim(&self, roll_no: &str, claim: &ClaimRequest) -> Result<HeartClaim, HeartsApiError> {
        let _guard = self.lock.lock().await;
        match self.db.claim_heart(claim, roll_no).await {
            Ok(claim) => {
                info!("💘️ {roll_no} claimed a heart");
                Ok(claim)
            },
            Err(MatchmakingError::InvalidClaim) => {
                warn!("💘️ Invalid heart claim attempt by {roll_no}");
                Err(MatchmakingError::InvalidClaim.into())
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Returns a single claimed heart. Empty returns are ignored and yield `None`.
    pub async fn return_heart(
        &self,
        roll_no: &str,
        heart: &NewReturnHeart,
    ) -> Result<Option<ReturnHeart>, HeartsApiError> {
        let _guard = self.lock.lock().await;
        match self.db.return_heart(heart, roll_no).await {
            Err(MatchmakingError::UnauthorizedReturn(who)) => {
                warn!("💘️ Unauthorized heart return attempt by {who}. Digest: {}", heart.sha);
                Err(MatchmakingError::UnauthorizedReturn(who).into())
            },
            result => Ok(result?),
        }
    }

    /// Processes returns outside of a submission. Every return is attempted; failures are collected in the report.
    pub async fn late_return(&self, roll_no: &str, returns: &[NewReturnHeart]) -> ReturnReport {
        let mut report = ReturnReport::default();
        for heart in returns {
            match self.return_heart(roll_no, heart).await {
                Ok(Some(returned)) => report.returned.push(returned),
                Ok(None) => report.skipped += 1,
                Err(e) => report.failures.push(e.to_string()),
            }
        }
        if !report.is_clean() {
            warn!("💘️ {} of {} returns by {roll_no} failed", report.failures.len(), returns.len());
        }
        report
    }

    /// Confirms a match for the original sender of a heart, who proves ownership by revealing the secret whose digest
    /// the heart was sent under.
    pub async fn verify(&self, roll_no: &str, secret: &str, enc: &str) -> Result<VerifyOutcome, HeartsApiError> {
        let digest = heart_digest(secret);
        let _guard = self.lock.lock().await;
        let outcome = self.db.verify_returned_heart(&digest, enc, roll_no).await.map_err(|e| {
            if matches!(e, MatchmakingError::InvalidClaim | MatchmakingError::ClaimNotFound) {
                warn!("💘️ Invalid match verification attempt by {roll_no}. {e}");
            }
            e
        })?;
        match &outcome {
            VerifyOutcome::Matched(m) => info!("💘️ It's a match! (#{})", m.id),
            VerifyOutcome::AlreadyMatched => debug!("💘️ Match was already confirmed from the other side"),
        }
        Ok(outcome)
    }

    /// Fetches the hearts sent since the user last polled.
    pub async fn fetch_hearts(&self, roll_no: &str) -> Result<Vec<HeartSummary>, HeartsApiError> {
        let next = Utc::now() - Duration::minutes(POLL_OVERLAP_MINUTES);
        let hearts = self.db.fetch_hearts_since_cursor(roll_no, next).await?;
        trace!("💘️ {roll_no} fetched {} new hearts", hearts.len());
        Ok(hearts)
    }

    /// Fetches the hearts returned since the user last polled.
    pub async fn fetch_return_hearts(&self, roll_no: &str) -> Result<Vec<ReturnHeartSummary>, HeartsApiError> {
        let next = Utc::now() - Duration::minutes(POLL_OVERLAP_MINUTES);
        let hearts = self.db.fetch_return_hearts_since_cursor(roll_no, next).await?;
        trace!("💘️ {roll_no} fetched {} returned hearts", hearts.len());
        Ok(hearts)
    }
}
