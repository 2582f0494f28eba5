use serde::{Deserialize, Serialize};

use crate::models::Message;
use crate::participant::{ParticipantKind, ParticipantRef};

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { participant: ParticipantRef },

    /// A direct message was stored
    MessageCreate { message: Message },

    /// `reader` opened (or explicitly acknowledged) the thread with
    /// `counterpart`, flipping `count` messages to read
    MessagesRead {
        reader: ParticipantRef,
        counterpart: ParticipantRef,
        count: usize,
    },
}

impl GatewayEvent {
    /// Whether this event should be delivered to `participant`.
    pub fn is_for(&self, participant: &ParticipantRef) -> bool {
        match self {
            Self::Ready { participant: p } => p == participant,
            Self::MessageCreate { message } => {
                message.sender == *participant || message.receiver == *participant
            }
            Self::MessagesRead {
                reader,
                counterpart,
                ..
            } => reader == participant || counterpart == participant,
        }
    }
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection with a token of the given kind
    Identify { token: String, kind: ParticipantKind },
}
