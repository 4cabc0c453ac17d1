use std::{any::Any, panic::AssertUnwindSafe};

use futures_util::FutureExt;
use log::*;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::jobs::queue::{Delivery, Subscription};

#[derive(Debug, Clone, Error)]
pub enum JobError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Moderation service error: {0}")]
    Moderation(String),
    #[error("Could not send mail: {0}")]
    Mail(String),
    #[error("I/O error: {0}")]
    Io(String),
    /// Retrying will not help. The message is dropped regardless of the handler's requeue policy.
    #[error("{0}")]
    Permanent(String),
}

impl JobError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, JobError::Permanent(_))
    }
}

/// Processes one type of job.
///
/// Jobs may be delivered more than once, so handlers must be idempotent.
#[allow(async_fn_in_trait)]
pub trait JobHandler {
    type Job: DeserializeOwned;

    fn name(&self) -> &'static str;

    /// Whether a failed job should go back on the queue.
    fn requeue_on_failure(&self) -> bool;

    async fn handle(&self, job: Self::Job) -> Result<(), JobError>;
}

/// How a delivery was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    Requeued,
    Dropped,
}

/// Pulls jobs off a queue one at a time and feeds them to a [`JobHandler`].
pub struct JobConsumer<H> {
    handler: H,
    subscription: Subscription,
}

impl<H: JobHandler> JobConsumer<H> {
    pub fn new(handler: H, subscription: Subscription) -> Self {
        Self { handler, subscription }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Runs until the queue is shut down.
    pub async fn run(mut self) {
        info!("📬️ {} worker is consuming '{}'", self.handler.name(), self.subscription.queue());
        while let Some(delivery) = self.subscription.next().await {
            self.process(delivery).await;
        }
        info!("📬️ {} worker has stopped", self.handler.name());
    }

    /// Processes the next message on the queue, if there is one.
    pub async fn process_next(&mut self) -> Option<Settlement> {
        let delivery = self.subscription.next().await?;
        Some(self.process(delivery).await)
    }

    /// Deserializes, dispatches and settles a single delivery.
    ///
    /// Malformed payloads are rejected without requeue. Failed jobs are requeued only if the handler's policy allows it
    /// and the error is retryable. A handler that panics is treated like a consumer that died before acknowledging: the
    /// job goes back on the queue, and the consumer carries on with the next one.
    pub async fn process(&self, delivery: Delivery) -> Settlement {
        let name = self.handler.name();
        let job: H::Job = match serde_json::from_slice(delivery.payload()) {
            Ok(job) => job,
            Err(e) => {
                error!("📬️ {name}: message #{} is not a valid job and will be dropped. {e}", delivery.id());
                delivery.nack(false);
                return Settlement::Dropped;
            },
        };
        let result = match AssertUnwindSafe(self.handler.handle(job)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                error!("📬️ {name}: handler panicked on message #{}. {}", delivery.id(), panic_message(panic.as_ref()));
                return if delivery.nack(true) { Settlement::Requeued } else { Settlement::Dropped };
            },
        };
        match result {
            Ok(()) => {
                delivery.ack();
                Settlement::Acked
            },
            Err(e) => {
                let requeue = self.handler.requeue_on_failure() && e.is_retryable();
                error!("📬️ {name}: message #{} failed (requeue: {requeue}). {e}", delivery.id());
                if delivery.nack(requeue) {
                    Settlement::Requeued
                } else {
                    Settlement::Dropped
                }
            },
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
