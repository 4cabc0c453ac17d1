use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::{NewReturnHeart, ReturnHeart, ReturnHeartSummary};

pub async fn insert_return_heart(
    heart: &NewReturnHeart,
    conn: &mut SqliteConnection,
) -> Result<ReturnHeart, sqlx::Error> {
    let heart = sqlx::query_as(
        r#"
            INSERT INTO return_hearts (sha, enc, song_enc, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(&heart.sha)
    .bind(&heart.enc)
    .bind(&heart.song_enc)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(heart)
}

/// Removes the returned heart identified by `(sha, enc)` and returns it, or `None` if there is no such heart.
pub async fn take_return_heart(
    sha: &str,
    enc: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ReturnHeart>, sqlx::Error> {
    let heart = sqlx::query_as("DELETE FROM return_hearts WHERE sha = $1 AND enc = $2 RETURNING *")
        .bind(sha)
        .bind(enc)
        .fetch_optional(conn)
        .await?;
    Ok(heart)
}

pub async fn fetch_return_hearts_since(
    since: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<ReturnHeartSummary>, sqlx::Error> {
    let hearts = sqlx::query_as("SELECT sha, enc FROM return_hearts WHERE created_at > $1 ORDER BY id")
        .bind(since)
        .fetch_all(conn)
        .await?;
    Ok(hearts)
}
