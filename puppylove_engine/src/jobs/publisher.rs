use log::*;
use serde::Serialize;

use crate::jobs::{
    job_types::{MailJob, ModerationJob, ProfileActionJob},
    queue::{JobQueue, QueueError},
};

/// The names of the queues the engine publishes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueNames {
    pub moderation: String,
    pub mail: String,
    pub profile: String,
}

impl Default for QueueNames {
    fn default() -> Self {
        Self { moderation: "moderation".into(), mail: "mail".into(), profile: "puppylove".into() }
    }
}

/// The producer side of the job queues. Publishing never runs the job; it only reports whether the job was queued.
#[derive(Clone)]
pub struct JobPublisher {
    queue: JobQueue,
    names: QueueNames,
}

impl JobPublisher {
    /// Creates a publisher and declares all the named queues on the broker.
    pub fn new(queue: JobQueue, names: QueueNames) -> Self {
        queue.declare(&names.moderation);
        queue.declare(&names.mail);
        queue.declare(&names.profile);
        Self { queue, names }
    }

    pub fn names(&self) -> &QueueNames {
        &self.names
    }

    pub fn publish(&self, payload: &[u8], queue: &str) -> Result<(), QueueError> {
        self.queue.publish(queue, payload.to_vec())?;
        Ok(())
    }

    pub fn publish_job<J: Serialize>(&self, job: &J, queue: &str) -> Result<(), QueueError> {
        let payload = serde_json::to_vec(job).map_err(|e| QueueError::Serialization(e.to_string()))?;
        self.publish(&payload, queue)
    }

    pub fn publish_mail(&self, job: &MailJob) -> Result<(), QueueError> {
        trace!("📬️ Queueing {} mail for {}", job.kind.type_name(), job.to);
        self.publish_job(job, &self.names.mail)
    }

    pub fn publish_moderation(&self, job: &ModerationJob) -> Result<(), QueueError> {
        self.publish_job(job, &self.names.moderation)
    }

    pub fn publish_profile_action(&self, job: &ProfileActionJob) -> Result<(), QueueError> {
        self.publish_job(job, &self.names.profile)
    }
}
