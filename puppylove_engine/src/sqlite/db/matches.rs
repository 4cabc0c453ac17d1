use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{HeartClaim, Match, ReturnHeart};

/// Looks up the match between two users in either direction.
pub async fn fetch_match_for_pair(
    roll_1: &str,
    roll_2: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Match>, sqlx::Error> {
    let m = sqlx::query_as(
        r#"
            SELECT * FROM matches
            WHERE (roll_a = $1 AND roll_b = $2) OR (roll_a = $2 AND roll_b = $1)
        "#,
    )
    .bind(roll_1)
    .bind(roll_2)
    .fetch_optional(conn)
    .await?;
    Ok(m)
}

/// Creates the match that `roll_no` proved by presenting the secret behind `claim`.
///
/// Returns `None` if the unique pair index reports that the match already exists.
pub async fn insert_match(
    roll_no: &str,
    claim: &HeartClaim,
    returned: &ReturnHeart,
    conn: &mut SqliteConnection,
) -> Result<Option<Match>, sqlx::Error> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO matches (roll_a, roll_b, song_a_to_b, song_b_to_a, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(roll_no)
    .bind(&claim.roll_no)
    .bind(&claim.song_enc)
    .bind(&returned.song_enc)
    .bind(Utc::now())
    .fetch_one(conn)
    .await;
    match result {
        Ok(m) => Ok(Some(m)),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            debug!("🗃️ Match between {roll_no} and {} already exists", claim.roll_no);
            Ok(None)
        },
        Err(e) => Err(e),
    }
}

pub async fn fetch_all_matches(conn: &mut SqliteConnection) -> Result<Vec<Match>, sqlx::Error> {
    let matches = sqlx::query_as("SELECT * FROM matches ORDER BY id").fetch_all(conn).await?;
    Ok(matches)
}
