use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{HeartClaim, SentHeart};

/// Records that `roll_no` has claimed `heart`. The heart's payload becomes the claim id.
pub async fn insert_claim(
    heart: &SentHeart,
    roll_no: &str,
    conn: &mut SqliteConnection,
) -> Result<HeartClaim, sqlx::Error> {
    let claim = sqlx::query_as(
        r#"
            INSERT INTO heart_claims (claim_id, sha, roll_no, song_enc, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(&heart.enc)
    .bind(&heart.sha)
    .bind(roll_no)
    .bind(&heart.song_enc)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(claim)
}

pub async fn fetch_claim_by_sha(sha: &str, conn: &mut SqliteConnection) -> Result<Option<HeartClaim>, sqlx::Error> {
    let claim =
        sqlx::query_as("SELECT * FROM heart_claims WHERE sha = $1").bind(sha).fetch_optional(conn).await?;
    Ok(claim)
}

pub async fn fetch_claim_for_user(
    sha: &str,
    roll_no: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<HeartClaim>, sqlx::Error> {
    let claim = sqlx::query_as("SELECT * FROM heart_claims WHERE sha = $1 AND roll_no = $2")
        .bind(sha)
        .bind(roll_no)
        .fetch_optional(conn)
        .await?;
    Ok(claim)
}
