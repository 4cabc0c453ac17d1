use html_escape::{encode_double_quoted_attribute, encode_text};
use log::*;
use thiserror::Error;

use crate::jobs::{
    consumer::{JobError, JobHandler},
    job_types::{MailJob, MailKind},
};

/// A rendered email, ready to hand to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailContent {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

impl MailContent {
    /// Every user-supplied value is HTML-escaped before it is placed in the body.
    pub fn render(job: &MailJob) -> Self {
        let (subject, body) = match &job.kind {
            MailKind::PasswordReset { username, reset_link } => (
                "Reset your password".to_string(),
                format!(
                    "<p>Hi {},</p><p>Use the link below to reset your password. It is valid for a short time \
                     only.</p><p><a href=\"{}\">{}</a></p>",
                    encode_text(username),
                    encode_double_quoted_attribute(reset_link),
                    encode_text(reset_link)
                ),
            ),
            MailKind::ViolationWarning { username, reason } => (
                "Your contribution was rejected".to_string(),
                format!(
                    "<p>Hi {},</p><p>{}</p><p>Repeated violations of the content policy may lead to your account \
                     being suspended.</p>",
                    encode_text(username),
                    encode_text(reason)
                ),
            ),
            MailKind::ThanksContribution { username, content_title } => (
                "Thanks for your contribution".to_string(),
                format!(
                    "<p>Hi {},</p><p>{} has been approved and is now visible to everyone.</p>",
                    encode_text(username),
                    encode_text(content_title)
                ),
            ),
        };
        Self { to: job.to.clone(), subject, body, is_html: true }
    }
}

#[derive(Debug, Clone, Error)]
pub enum MailError {
    /// The mail server could not be reached, or asked us to try later.
    #[error("Temporary mail failure: {0}")]
    Transient(String),
    /// The mail server refused the message outright.
    #[error("Mail rejected: {0}")]
    Rejected(String),
}

#[allow(async_fn_in_trait)]
pub trait Mailer {
    async fn send(&self, mail: &MailContent) -> Result<(), MailError>;
}

/// A mailer that writes every mail to the log instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, mail: &MailContent) -> Result<(), MailError> {
        info!("📧️ To: {} | Subject: {}", mail.to, mail.subject);
        debug!("📧️ {}", mail.body);
        Ok(())
    }
}

pub struct MailWorker<M> {
    mailer: M,
}

impl<M> MailWorker<M> {
    pub fn new(mailer: M) -> Self {
        Self { mailer }
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }
}

impl<M: Mailer> JobHandler for MailWorker<M> {
    type Job = MailJob;

    fn name(&self) -> &'static str {
        "Mail"
    }

    fn requeue_on_failure(&self) -> bool {
        true
    }

    async fn handle(&self, job: MailJob) -> Result<(), JobError> {
        let content = MailContent::render(&job);
        match self.mailer.send(&content).await {
            Ok(()) => {
                debug!("📧️ {} mail sent to {}", job.kind.type_name(), job.to);
                Ok(())
            },
            Err(MailError::Transient(e)) => Err(JobError::Mail(e)),
            Err(MailError::Rejected(e)) => Err(JobError::Permanent(format!("Mail to {} rejected. {e}", job.to))),
        }
    }
}
