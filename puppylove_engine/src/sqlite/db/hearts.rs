use chrono::{DateTime, Utc};
use log::debug;
use plv_common::Gender;
use sqlx::SqliteConnection;

use crate::{
    db_types::{HeartSummary, NewHeart, SentHeart},
    traits::MatchmakingError,
};

/// Inserts a heart into the sent ledger. A heart whose digest or payload is already in the ledger is rejected with
/// `DuplicateHeart`.
pub async fn insert_heart(
    heart: &NewHeart,
    gender: Gender,
    conn: &mut SqliteConnection,
) -> Result<SentHeart, MatchmakingError> {
    let heart: SentHeart = sqlx::query_as(
        r#"
            INSERT INTO sent_hearts (sha, enc, song_enc, gender_of_sender, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(&heart.sha)
    .bind(&heart.enc)
    .bind(&heart.song_enc)
    .bind(gender)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => MatchmakingError::DuplicateHeart,
        e => MatchmakingError::from(e),
    })?;
    debug!("🗃️ Heart #{} added to the ledger", heart.id);
    Ok(heart)
}

/// Removes the heart identified by `(sha, enc)` from the ledger and returns it, or `None` if there is no such heart.
pub async fn take_heart(sha: &str, enc: &str, conn: &mut SqliteConnection) -> Result<Option<SentHeart>, sqlx::Error> {
    let heart = sqlx::query_as("DELETE FROM sent_hearts WHERE sha = $1 AND enc = $2 RETURNING *")
        .bind(sha)
        .bind(enc)
        .fetch_optional(conn)
        .await?;
    Ok(heart)
}

pub async fn fetch_hearts_since(
    since: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<HeartSummary>, sqlx::Error> {
    let hearts = sqlx::query_as("SELECT enc, gender_of_sender FROM sent_hearts WHERE created_at > $1 ORDER BY id")
        .bind(since)
        .fetch_all(conn)
        .await?;
    Ok(hearts)
}

pub async fn count_hearts(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM sent_hearts").fetch_one(conn).await?;
    Ok(count)
}
