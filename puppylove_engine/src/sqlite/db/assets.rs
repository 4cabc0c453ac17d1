use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Asset, AssetStatus},
    traits::AssetStoreError,
};

pub async fn insert_asset(
    asset_id: &str,
    owner_email: &str,
    content: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Asset, sqlx::Error> {
    let asset = sqlx::query_as(
        r#"
            INSERT INTO assets (asset_id, owner_email, content, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *;
        "#,
    )
    .bind(asset_id)
    .bind(owner_email)
    .bind(content)
    .bind(AssetStatus::Pending)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(asset)
}

pub async fn fetch_asset(asset_id: &str, conn: &mut SqliteConnection) -> Result<Option<Asset>, sqlx::Error> {
    let asset =
        sqlx::query_as("SELECT * FROM assets WHERE asset_id = $1").bind(asset_id).fetch_optional(conn).await?;
    Ok(asset)
}

pub async fn update_status(
    asset_id: &str,
    status: AssetStatus,
    conn: &mut SqliteConnection,
) -> Result<(), AssetStoreError> {
    let res = sqlx::query("UPDATE assets SET status = $1, updated_at = $2 WHERE asset_id = $3")
        .bind(status)
        .bind(Utc::now())
        .bind(asset_id)
        .execute(conn)
        .await?;
    match res.rows_affected() {
        0 => Err(AssetStoreError::AssetNotFound(asset_id.to_string())),
        _ => Ok(()),
    }
}
