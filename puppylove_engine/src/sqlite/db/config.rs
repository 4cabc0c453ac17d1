use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::ConfigKey;

pub async fn fetch_config(key: ConfigKey, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let value =
        sqlx::query_scalar("SELECT value FROM config WHERE key = $1").bind(key.as_str()).fetch_optional(conn).await?;
    Ok(value)
}

pub async fn upsert_config(key: ConfigKey, value: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO config (key, value, updated_at) VALUES ($1, $2, $3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key.as_str())
    .bind(value)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

/// Stores `value` only if the key has no value yet. Returns `true` if the value was written.
pub async fn insert_config_if_missing(
    key: ConfigKey,
    value: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("INSERT INTO config (key, value, updated_at) VALUES ($1, $2, $3) ON CONFLICT(key) DO NOTHING")
        .bind(key.as_str())
        .bind(value)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    Ok(res.rows_affected() == 1)
}

/// Sets a one-way boolean latch to `true`. Returns `false` if the latch was already set.
pub async fn set_latch(key: ConfigKey, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        r#"
            INSERT INTO config (key, value, updated_at) VALUES ($1, 'true', $2)
            ON CONFLICT(key) DO UPDATE SET value = 'true', updated_at = excluded.updated_at
            WHERE config.value <> 'true'
        "#,
    )
    .bind(key.as_str())
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn fetch_all_config(conn: &mut SqliteConnection) -> Result<HashMap<String, String>, sqlx::Error> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM config").fetch_all(conn).await?;
    Ok(rows.into_iter().collect())
}
