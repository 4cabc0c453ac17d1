use log::*;

use crate::{
    jobs::{
        consumer::{JobError, JobHandler},
        job_types::{ProfileAction, ProfileActionJob},
    },
    traits::ProfileManagement,
};

/// Prepares PuppyLove profiles once users have passed the password check.
pub struct ProfileActionWorker<B> {
    db: B,
}

impl<B> ProfileActionWorker<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B: ProfileManagement> JobHandler for ProfileActionWorker<B> {
    type Job = ProfileActionJob;

    fn name(&self) -> &'static str {
        "PuppyLove profile"
    }

    fn requeue_on_failure(&self) -> bool {
        true
    }

    async fn handle(&self, job: ProfileActionJob) -> Result<(), JobError> {
        match job.action {
            ProfileAction::VerifyPassword => {
                info!("💘️ {} verified their password", job.roll_no);
                Ok(())
            },
            ProfileAction::VerifyPasswordAndCreateKeys => {
                let user_id = job.user_id.to_string();
                let profile = self
                    .db
                    .ensure_profile(&job.roll_no, Some(&user_id))
                    .await
                    .map_err(|e| JobError::Database(e.to_string()))?;
                info!(
                    "💘️ {} verified their password and needs to create keys (registered: {})",
                    job.roll_no, profile.registered
                );
                Ok(())
            },
        }
    }
}
