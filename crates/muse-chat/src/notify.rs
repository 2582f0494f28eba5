use std::sync::Arc;

use muse_types::ParticipantRef;
use muse_types::models::Message;

pub type Notify = Arc<dyn Notifier + Send + Sync>;

/// Hook fired after messaging state changes. Must not block: it runs on
/// the request path.
pub trait Notifier {
    fn message_created(&self, message: &Message);

    fn messages_read(&self, reader: &ParticipantRef, counterpart: &ParticipantRef, count: usize);
}

/// Notifier for setups without a real-time gateway.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn message_created(&self, _message: &Message) {}

    fn messages_read(&self, _reader: &ParticipantRef, _counterpart: &ParticipantRef, _count: usize) {}
}
