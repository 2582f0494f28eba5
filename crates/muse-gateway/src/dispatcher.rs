use std::sync::Arc;

use tokio::sync::broadcast;

use muse_chat::notify::Notifier;
use muse_types::ParticipantRef;
use muse_types::events::GatewayEvent;
use muse_types::models::Message;

const CHANNEL_CAPACITY: usize = 1024;

/// Fans messaging events out to connected clients.
///
/// Every connection subscribes to the same broadcast channel and keeps only
/// the events addressed to its participant (see [`GatewayEvent::is_for`]).
/// Publishing never blocks, so the dispatcher can be used as the
/// [`Notifier`] of the synchronous messaging service.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<GatewayEvent>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Publish an event. Dropped silently when nobody is connected.
    pub fn publish(&self, event: GatewayEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Number of live gateway connections.
    pub fn connection_count(&self) -> usize {
        self.inner.broadcast_tx.receiver_count()
    }
}

impl Notifier for Dispatcher {
    fn message_created(&self, message: &Message) {
        self.publish(GatewayEvent::MessageCreate {
            message: message.clone(),
        });
    }

    fn messages_read(&self, reader: &ParticipantRef, counterpart: &ParticipantRef, count: usize) {
        self.publish(GatewayEvent::MessagesRead {
            reader: *reader,
            counterpart: *counterpart,
            count,
        });
    }
}
