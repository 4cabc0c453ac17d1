use sha2::{Digest, Sha256};

/// Computes the digest that correlates a returned heart with its claim: the hex-encoded SHA-256 of the secret the
/// original sender holds.
pub fn heart_digest(secret: &str) -> String {
    let hash = Sha256::digest(secret.as_bytes());
    hex::encode(hash)
}

/// The batch a roll number belongs to, e.g. `y21` for `210123`. Roll numbers shorter than two characters have no
/// batch.
pub fn roll_batch(roll_no: &str) -> Option<String> {
    let prefix = roll_no.get(0..2)?;
    Some(format!("y{prefix}"))
}
