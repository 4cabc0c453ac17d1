//! # Job queues and workers
//!
//! Side effects such as moderation, mail and profile preparation are never run inline. Producers serialize a job and
//! hand it to the [`JobPublisher`]; a [`JobConsumer`] per queue pulls jobs off one at a time and dispatches them to
//! the queue's [`JobHandler`].
mod consumer;
mod job_types;
mod mail;
mod moderation;
mod profile_actions;
mod publisher;
mod queue;

pub use consumer::{JobConsumer, JobError, JobHandler, Settlement};
pub use job_types::{MailJob, MailKind, ModerationJob, ModerationKind, ProfileAction, ProfileActionJob};
pub use mail::{LogMailer, MailContent, MailError, MailWorker, Mailer};
pub use moderation::{ApproveAllModerator, ContentModerator, ModerationError, ModerationWorker, Verdict};
pub use profile_actions::ProfileActionWorker;
pub use publisher::{JobPublisher, QueueNames};
pub use queue::{Delivery, JobQueue, Message, QueueError, Subscription, DEFAULT_MAX_DELIVERIES};
