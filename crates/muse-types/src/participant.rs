use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Row id inside one of the account tables. Only meaningful together with
/// a [`ParticipantKind`].
pub type AccountId = i64;

/// The two account kinds that can take part in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    User,
    Artist,
}

impl ParticipantKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Artist => "artist",
        }
    }
}

impl fmt::Display for ParticipantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown participant kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for ParticipantKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "artist" => Ok(Self::Artist),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Reference to one conversation participant.
///
/// User and artist accounts live in separate tables whose ids overlap, so a
/// participant is never addressed by a bare id. Serialized as
/// `{"kind": "user", "id": 7}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ParticipantRef {
    User(AccountId),
    Artist(AccountId),
}

impl ParticipantRef {
    pub const fn new(kind: ParticipantKind, id: AccountId) -> Self {
        match kind {
            ParticipantKind::User => Self::User(id),
            ParticipantKind::Artist => Self::Artist(id),
        }
    }

    pub const fn kind(&self) -> ParticipantKind {
        match self {
            Self::User(_) => ParticipantKind::User,
            Self::Artist(_) => ParticipantKind::Artist,
        }
    }

    pub const fn id(&self) -> AccountId {
        match self {
            Self::User(id) | Self::Artist(id) => *id,
        }
    }
}

impl fmt::Display for ParticipantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}
