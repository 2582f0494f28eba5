use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::participant::ParticipantRef;

/// Upper bound on a message body, in characters.
pub const MAX_BODY_CHARS: usize = 1000;

pub type MessageId = i64;

/// A stored direct message. Only `is_read` (and with it `updated_at`) ever
/// changes after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: ParticipantRef,
    pub receiver: ParticipantRef,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Ordering key inside a thread: creation time, then id.
    pub fn order_key(&self) -> (DateTime<Utc>, MessageId) {
        (self.created_at, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("message body is empty")]
    EmptyBody,
    #[error("message body is {len} characters, the limit is {MAX_BODY_CHARS}")]
    BodyTooLong { len: usize },
    #[error("sender and receiver are the same participant")]
    SelfMessage,
}

/// A message that passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    sender: ParticipantRef,
    receiver: ParticipantRef,
    body: String,
    created_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn new(
        sender: ParticipantRef,
        receiver: ParticipantRef,
        body: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::at(sender, receiver, body, Utc::now())
    }

    pub fn at(
        sender: ParticipantRef,
        receiver: ParticipantRef,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let body = body.into();

        if sender == receiver {
            return Err(ValidationError::SelfMessage);
        }
        if body.trim().is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        let len = body.chars().count();
        if len > MAX_BODY_CHARS {
            return Err(ValidationError::BodyTooLong { len });
        }

        Ok(Self {
            sender,
            receiver,
            body,
            created_at,
        })
    }

    pub const fn sender(&self) -> &ParticipantRef {
        &self.sender
    }

    pub const fn receiver(&self) -> &ParticipantRef {
        &self.receiver
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub const fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }
}

/// Display data for a participant, as served by the participant directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub participant: ParticipantRef,
    pub display_name: String,
    pub photo_url: Option<String>,
}

impl Profile {
    /// Stand-in for a participant whose account can no longer be found.
    pub fn unknown(participant: ParticipantRef) -> Self {
        Self {
            participant,
            display_name: "unknown".to_string(),
            photo_url: None,
        }
    }
}
