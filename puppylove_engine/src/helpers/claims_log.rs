//! The claims log is the append-only record of every claim request a user has made. Each entry is the URL-escaped
//! JSON of the [`ClaimRequest`], and entries are joined with `+`. Since URL escaping turns spaces into `%20` and `+`
//! into `%2B`, the separator can never appear inside an entry.
use thiserror::Error;

use crate::db_types::ClaimRequest;

const SEPARATOR: char = '+';

#[derive(Debug, Error)]
pub enum ClaimsLogError {
    #[error("Could not serialize claim request. {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Claims log entry is not valid UTF-8. {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Returns a new claims log with `claim` appended to `log`.
pub fn append_claim(log: &str, claim: &ClaimRequest) -> Result<String, ClaimsLogError> {
    let json = serde_json::to_string(claim)?;
    let entry = urlencoding::encode(&json);
    if log.is_empty() {
        Ok(entry.into_owned())
    } else {
        Ok(format!("{log}{SEPARATOR}{entry}"))
    }
}

/// Splits a claims log back into its claim requests.
pub fn parse_claims(log: &str) -> Result<Vec<ClaimRequest>, ClaimsLogError> {
    log.split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let json = urlencoding::decode(entry)?;
            let claim = serde_json::from_str(&json)?;
            Ok(claim)
        })
        .collect()
}
