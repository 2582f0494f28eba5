use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{MessageId, Profile};
use crate::participant::{AccountId, ParticipantKind, ParticipantRef};

// -- Envelope --

/// Every JSON body the API returns, success or failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

// -- JWT Claims --

/// Bearer token claims. `aud` repeats the kind so that the decoder for one
/// account kind rejects tokens minted for the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: AccountId,
    pub kind: ParticipantKind,
    pub name: String,
    pub aud: String,
    pub exp: usize,
}

impl Claims {
    pub const fn participant(&self) -> ParticipantRef {
        ParticipantRef::new(self.kind, self.sub)
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtistRegisterRequest {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub participant: ParticipantRef,
    pub name: String,
    pub token: String,
}

// -- Conversations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: MessageId,
    pub message: String,
    pub sender: ParticipantRef,
    pub receiver: ParticipantRef,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One message of an opened thread, joined with both parties' display data.
#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadMessage {
    #[serde(flatten)]
    pub message: MessageResponse,
    pub sender_data: Profile,
    pub receiver_data: Profile,
    pub is_me: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadMeta {
    pub total_messages: usize,
    /// Messages from the counterpart that were unread before this request.
    pub unread_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub me: Profile,
    pub counterpart: Profile,
    pub messages: Vec<ThreadMessage>,
    pub meta: ThreadMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub counterpart: Profile,
    pub latest_message_id: MessageId,
    pub latest_message: String,
    pub latest_at: DateTime<Utc>,
    pub message_count: u64,
    pub unread_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InboxResponse {
    pub conversations: Vec<ConversationResponse>,
    pub total_messages: u64,
    pub unread_total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub updated: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadResponse {
    pub unread: u64,
}
