//! Moderation of user-contributed content.
//!
//! Clean images are promoted from `{assets_dir}/tmp` to `{assets_dir}/public`. Flagged content is rejected and its
//! owner is warned by mail. Moderation jobs are never requeued: a failed job is logged and dropped.
use std::path::{Path, PathBuf};

use log::*;
use thiserror::Error;

use crate::{
    db_types::{Asset, AssetStatus},
    jobs::{
        consumer::{JobError, JobHandler},
        job_types::{MailJob, MailKind, ModerationJob, ModerationKind},
        publisher::JobPublisher,
    },
    traits::AssetStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Flagged(String),
}

#[derive(Debug, Clone, Error)]
#[error("Moderation failed: {0}")]
pub struct ModerationError(pub String);

#[allow(async_fn_in_trait)]
pub trait ContentModerator {
    async fn moderate_text(&self, text: &str) -> Result<Verdict, ModerationError>;

    async fn moderate_image(&self, path: &Path) -> Result<Verdict, ModerationError>;
}

/// Approves everything. Used when no moderation service is configured.
#[derive(Debug, Clone, Default)]
pub struct ApproveAllModerator;

impl ContentModerator for ApproveAllModerator {
    async fn moderate_text(&self, _text: &str) -> Result<Verdict, ModerationError> {
        Ok(Verdict::Clean)
    }

    async fn moderate_image(&self, _path: &Path) -> Result<Verdict, ModerationError> {
        Ok(Verdict::Clean)
    }
}

pub struct ModerationWorker<A, M> {
    store: A,
    moderator: M,
    publisher: JobPublisher,
    assets_dir: PathBuf,
}

impl<A, M> ModerationWorker<A, M> {
    pub fn new<P: Into<PathBuf>>(store: A, moderator: M, publisher: JobPublisher, assets_dir: P) -> Self {
        Self { store, moderator, publisher, assets_dir: assets_dir.into() }
    }

    pub fn tmp_image_path(&self, asset_id: &str) -> PathBuf {
        self.assets_dir.join("tmp").join(format!("{asset_id}.webp"))
    }

    pub fn public_image_path(&self, asset_id: &str) -> PathBuf {
        self.assets_dir.join("public").join(format!("{asset_id}.webp"))
    }

    fn queue_mail(&self, job: MailJob) {
        if let Err(e) = self.publisher.publish_mail(&job) {
            error!("🛡️ Failed to queue {} mail for {}. {e}", job.kind.type_name(), job.to);
        }
    }
}

impl<A: AssetStore, M: ContentModerator> ModerationWorker<A, M> {
    async fn promote_image(&self, asset_id: &str) -> std::io::Result<()> {
        let from = self.tmp_image_path(asset_id);
        let to = self.public_image_path(asset_id);
        if let Some(dir) = to.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::rename(&from, &to).await
    }

    async fn reject(&self, asset: &Asset, kind: ModerationKind, reason: String) -> Result<(), JobError> {
        info!("🛡️ Asset {} ({kind:?}) was flagged. {reason}", asset.asset_id);
        self.store
            .set_asset_status(&asset.asset_id, AssetStatus::Rejected)
            .await
            .map_err(|e| JobError::Database(e.to_string()))?;
        let reason = match kind {
            ModerationKind::Image => "Your uploaded image violated our content policy and was rejected.",
            ModerationKind::ReviewText => "Your review violated our content policy and was rejected.",
        };
        self.queue_mail(MailJob {
            to: asset.owner_email.clone(),
            kind: MailKind::ViolationWarning { username: asset.owner_email.clone(), reason: reason.to_string() },
        });
        Ok(())
    }

    async fn approve(&self, asset: &Asset, kind: ModerationKind) -> Result<(), JobError> {
        info!("🛡️ Asset {} ({kind:?}) passed moderation", asset.asset_id);
        if kind == ModerationKind::Image {
            match self.promote_image(&asset.asset_id).await {
                Ok(()) => debug!("🛡️ Image {} moved from tmp to public", asset.asset_id),
                Err(e) => error!("🛡️ Failed to move image {} to public. {e}", asset.asset_id),
            }
        }
        self.store
            .set_asset_status(&asset.asset_id, AssetStatus::Approved)
            .await
            .map_err(|e| JobError::Database(e.to_string()))?;
        let content_title = match kind {
            ModerationKind::Image => "Your uploaded image",
            ModerationKind::ReviewText => "Your review",
        };
        self.queue_mail(MailJob {
            to: asset.owner_email.clone(),
            kind: MailKind::ThanksContribution {
                username: asset.owner_email.clone(),
                content_title: content_title.to_string(),
            },
        });
        Ok(())
    }
}

impl<A: AssetStore, M: ContentModerator> JobHandler for ModerationWorker<A, M> {
    type Job = ModerationJob;

    fn name(&self) -> &'static str {
        "Moderation"
    }

    fn requeue_on_failure(&self) -> bool {
        false
    }

    async fn handle(&self, job: ModerationJob) -> Result<(), JobError> {
        let asset_id = job.asset_id.to_string();
        let asset = self
            .store
            .fetch_asset(&asset_id)
            .await
            .map_err(|e| JobError::Database(e.to_string()))?
            .ok_or_else(|| JobError::Permanent(format!("Asset {asset_id} does not exist")))?;
        if asset.status != AssetStatus::Pending {
            debug!("🛡️ Asset {asset_id} has already been moderated ({}). Skipping", asset.status);
            return Ok(());
        }
        let verdict = match job.kind {
            ModerationKind::ReviewText => {
                let text = asset.content.as_deref().unwrap_or_default();
                self.moderator.moderate_text(text).await
            },
            ModerationKind::Image => self.moderator.moderate_image(&self.tmp_image_path(&asset_id)).await,
        }
        .map_err(|e| JobError::Moderation(e.to_string()))?;
        match verdict {
            Verdict::Flagged(reason) => self.reject(&asset, job.kind, reason).await,
            Verdict::Clean => self.approve(&asset, job.kind).await,
        }
    }
}
