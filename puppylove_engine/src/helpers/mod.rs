mod claims_log;
mod digest;

pub use claims_log::{append_claim, parse_claims, ClaimsLogError};
pub use digest::{heart_digest, roll_batch};
