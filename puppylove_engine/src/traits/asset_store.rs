use thiserror::Error;

use crate::db_types::{Asset, AssetStatus};

#[derive(Debug, Clone, Error)]
pub enum AssetStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Asset {0} does not exist")]
    AssetNotFound(String),
}

impl From<sqlx::Error> for AssetStoreError {
    fn from(e: sqlx::Error) -> Self {
        AssetStoreError::DatabaseError(e.to_string())
    }
}

/// Moderation status of user-contributed content.
#[allow(async_fn_in_trait)]
pub trait AssetStore {
    async fn insert_asset(
        &self,
        asset_id: &str,
        owner_email: &str,
        content: Option<&str>,
    ) -> Result<Asset, AssetStoreError>;

    async fn fetch_asset(&self, asset_id: &str) -> Result<Option<Asset>, AssetStoreError>;

    async fn set_asset_status(&self, asset_id: &str, status: AssetStatus) -> Result<(), AssetStoreError>;
}
