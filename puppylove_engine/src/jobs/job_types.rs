//! Payloads carried on the job queues. All of them travel as JSON.
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

//--------------------------------------        MailJob        ---------------------------------------------------------
/// A request to send an email. On the wire this is `{"type": ..., "to": ..., "data": {...}}`, where `type` selects
/// the shape of `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MailEnvelope", into = "MailEnvelope")]
pub struct MailJob {
    pub to: String,
    pub kind: MailKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MailKind {
    PasswordReset { username: String, reset_link: String },
    ViolationWarning { username: String, reason: String },
    ThanksContribution { username: String, content_title: String },
}

impl MailKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            MailKind::PasswordReset { .. } => "password_reset",
            MailKind::ViolationWarning { .. } => "violation_warning",
            MailKind::ThanksContribution { .. } => "thanks_contribution",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct MailEnvelope {
    #[serde(rename = "type")]
    kind: String,
    to: String,
    #[serde(default)]
    data: Value,
}

impl TryFrom<MailEnvelope> for MailJob {
    type Error = serde_json::Error;

    fn try_from(envelope: MailEnvelope) -> Result<Self, Self::Error> {
        let kind = serde_json::from_value(json!({ "type": envelope.kind, "data": envelope.data }))?;
        Ok(MailJob { to: envelope.to, kind })
    }
}

impl From<MailJob> for MailEnvelope {
    fn from(job: MailJob) -> Self {
        let kind = job.kind.type_name().to_string();
        let data = match serde_json::to_value(&job.kind) {
            Ok(Value::Object(mut tagged)) => tagged.remove("data").unwrap_or_default(),
            _ => Value::Null,
        };
        MailEnvelope { kind, to: job.to, data }
    }
}

//--------------------------------------     ModerationJob     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationJob {
    pub asset_id: Uuid,
    #[serde(rename = "type")]
    pub kind: ModerationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationKind {
    ReviewText,
    Image,
}

//--------------------------------------   ProfileActionJob    ---------------------------------------------------------
/// Published once a user has passed the password check for PuppyLove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileActionJob {
    pub action: ProfileAction,
    pub user_id: Uuid,
    pub roll_no: String,
    pub has_profile: bool,
    /// Whether the user has completed registration
    pub is_dirty: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileAction {
    /// The profile exists and is registered
    VerifyPassword,
    /// The user still has to generate their key pair
    VerifyPasswordAndCreateKeys,
}

impl ProfileAction {
    pub fn for_registration_state(is_registered: bool) -> Self {
        if is_registered {
            ProfileAction::VerifyPassword
        } else {
            ProfileAction::VerifyPasswordAndCreateKeys
        }
    }
}
