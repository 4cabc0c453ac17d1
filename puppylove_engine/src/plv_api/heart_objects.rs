use serde::Serialize;

use crate::db_types::{ReturnHeart, SentHeart};

/// The result of a heart submission. The hearts themselves are always stored once `submit` succeeds; bundled returns
/// that fail only downgrade the outcome to a partial success.
#[derive(Debug, Clone, Serialize)]
pub enum SubmitOutcome {
    Submitted(Vec<SentHeart>),
    PartialSuccess { hearts: Vec<SentHeart>, failed_returns: Vec<String> },
}

impl SubmitOutcome {
    pub fn hearts(&self) -> &[SentHeart] {
        match self {
            SubmitOutcome::Submitted(hearts) => hearts,
            SubmitOutcome::PartialSuccess { hearts, .. } => hearts,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, SubmitOutcome::PartialSuccess { .. })
    }
}

/// What happened to a batch of returned hearts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReturnReport {
    pub returned: Vec<ReturnHeart>,
    /// Returns with an empty digest or payload. These are accepted and ignored.
    pub skipped: usize,
    pub failures: Vec<String>,
}

impl ReturnReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
