use std::sync::Arc;

use anyhow::Result;
use muse_db::Database;
use muse_types::ParticipantRef;
use muse_types::models::{Message, MessageId, NewMessage};

pub type Store = Arc<dyn MessageStore + Send + Sync>;

/// Owner of the message log. Implementations must apply each call as a
/// single atomic write or read.
pub trait MessageStore {
    /// Persist `msg` unread and return it with its assigned id.
    fn append(&self, msg: &NewMessage) -> Result<Message>;

    /// Mark everything `counterpart` sent to `participant` as read.
    /// Returns how many messages changed state.
    fn mark_read(&self, participant: &ParticipantRef, counterpart: &ParticipantRef) -> Result<usize>;

    /// As `mark_read`, limited to messages with an id up to `through`.
    fn mark_read_through(
        &self,
        participant: &ParticipantRef,
        counterpart: &ParticipantRef,
        through: MessageId,
    ) -> Result<usize>;

    /// The unordered pair's thread, ascending by `(created_at, id)`.
    fn find_between(&self, a: &ParticipantRef, b: &ParticipantRef) -> Result<Vec<Message>>;

    /// Every message `participant` has received, read or not.
    fn inbound_for(&self, participant: &ParticipantRef) -> Result<Vec<Message>>;

    fn count_received_by(&self, participant: &ParticipantRef) -> Result<u64>;

    fn unread_from(&self, participant: &ParticipantRef, counterpart: &ParticipantRef) -> Result<u64>;
}

impl MessageStore for Database {
    fn append(&self, msg: &NewMessage) -> Result<Message> {
        self.insert_message(msg)
    }

    fn mark_read(&self, participant: &ParticipantRef, counterpart: &ParticipantRef) -> Result<usize> {
        Database::mark_read(self, participant, counterpart)
    }

    fn mark_read_through(
        &self,
        participant: &ParticipantRef,
        counterpart: &ParticipantRef,
        through: MessageId,
    ) -> Result<usize> {
        Database::mark_read_through(self, participant, counterpart, through)
    }

    fn find_between(&self, a: &ParticipantRef, b: &ParticipantRef) -> Result<Vec<Message>> {
        self.messages_between(a, b)
    }

    fn inbound_for(&self, participant: &ParticipantRef) -> Result<Vec<Message>> {
        self.inbound_messages(participant)
    }

    fn count_received_by(&self, participant: &ParticipantRef) -> Result<u64> {
        Database::count_received_by(self, participant)
    }

    fn unread_from(&self, participant: &ParticipantRef, counterpart: &ParticipantRef) -> Result<u64> {
        self.count_unread_from(participant, counterpart)
    }
}
