use tracing::{info, warn};

use muse_types::ParticipantRef;
use muse_types::models::{Message, MessageId, NewMessage, Profile};

use crate::aggregator;
use crate::directory::Directory;
use crate::notify::Notify;
use crate::store::Store;
use crate::{ChatError, Result};

/// An opened conversation, from the caller's side.
#[derive(Debug, Clone)]
pub struct Thread {
    pub caller: Profile,
    pub counterpart: Profile,
    /// Oldest first.
    pub messages: Vec<Message>,
    /// Messages from the counterpart that were unread until this open.
    pub unread_before_open: usize,
}

impl Thread {
    /// Display data for either party of the thread.
    pub fn profile_of(&self, participant: &ParticipantRef) -> &Profile {
        if *participant == self.caller.participant {
            &self.caller
        } else {
            &self.counterpart
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub counterpart: Profile,
    pub latest: Message,
    pub message_count: u64,
    pub unread_count: u64,
}

#[derive(Debug, Clone)]
pub struct Inbox {
    /// Most recent conversation first.
    pub conversations: Vec<ConversationSummary>,
    pub total_messages: u64,
    pub unread_total: u64,
}

/// Entry point for every messaging operation. The caller is always passed
/// in explicitly; nothing is read from ambient request state.
#[derive(Clone)]
pub struct MessagingService {
    store: Store,
    directory: Directory,
    notifier: Notify,
}

impl MessagingService {
    pub fn new(store: Store, directory: Directory, notifier: Notify) -> Self {
        Self {
            store,
            directory,
            notifier,
        }
    }

    fn resolve_caller(&self, caller: &ParticipantRef) -> Result<Profile> {
        self.directory
            .lookup(caller)?
            .ok_or(ChatError::Authorization(*caller))
    }

    fn resolve_counterpart(&self, counterpart: &ParticipantRef) -> Result<Profile> {
        self.directory
            .lookup(counterpart)?
            .ok_or(ChatError::NotFound(*counterpart))
    }

    /// Append a message from `caller` to `counterpart`. No deduplication and
    /// no rate limiting: every call stores a new message.
    pub fn send(&self, caller: &ParticipantRef, counterpart: &ParticipantRef, body: &str) -> Result<Message> {
        self.resolve_caller(caller)?;
        self.resolve_counterpart(counterpart)?;

        let new = NewMessage::new(*caller, *counterpart, body)?;
        let message = self.store.append(&new)?;

        info!("{} -> {}: message {} stored", caller, counterpart, message.id);
        self.notifier.message_created(&message);

        Ok(message)
    }

    /// Fetch the thread with `counterpart` **and mark it read**.
    ///
    /// This is a mutating read: the messages `counterpart` sent to `caller`
    /// are acknowledged as part of opening the thread. Only messages that
    /// were actually returned get acknowledged; one arriving while the thread
    /// is being opened stays unread. The returned messages are the ones
    /// fetched before acknowledgement, so their `is_read` flags still show
    /// what was new to the caller.
    pub fn open_thread(&self, caller: &ParticipantRef, counterpart: &ParticipantRef) -> Result<Thread> {
        let me = self.resolve_caller(caller)?;
        let them = self.resolve_counterpart(counterpart)?;

        let messages = self.store.find_between(caller, counterpart)?;
        let newest_inbound = messages
            .iter()
            .filter(|m| m.receiver == *caller)
            .map(|m| m.id)
            .max();
        let unread_before_open = match newest_inbound {
            Some(through) => self.acknowledge(caller, counterpart, Some(through))?,
            None => 0,
        };

        Ok(Thread {
            caller: me,
            counterpart: them,
            messages,
            unread_before_open,
        })
    }

    /// Mark the thread with `counterpart` read without fetching it.
    pub fn mark_read(&self, caller: &ParticipantRef, counterpart: &ParticipantRef) -> Result<usize> {
        self.resolve_caller(caller)?;
        self.resolve_counterpart(counterpart)?;

        self.acknowledge(caller, counterpart, None)
    }

    fn acknowledge(
        &self,
        caller: &ParticipantRef,
        counterpart: &ParticipantRef,
        through: Option<MessageId>,
    ) -> Result<usize> {
        let updated = match through {
            Some(id) => self.store.mark_read_through(caller, counterpart, id)?,
            None => self.store.mark_read(caller, counterpart)?,
        };
        if updated > 0 {
            self.notifier.messages_read(caller, counterpart, updated);
        }
        Ok(updated)
    }

    /// Unread messages `counterpart` has sent to `caller`.
    pub fn unread_from(&self, caller: &ParticipantRef, counterpart: &ParticipantRef) -> Result<u64> {
        self.resolve_caller(caller)?;
        self.resolve_counterpart(counterpart)?;

        Ok(self.store.unread_from(caller, counterpart)?)
    }

    /// Conversations of `caller`, most recent first. Only counterparts that
    /// have sent `caller` at least one message are listed.
    pub fn list_threads(&self, caller: &ParticipantRef) -> Result<Inbox> {
        self.resolve_caller(caller)?;

        let inbound = self.store.inbound_for(caller)?;
        let digests = aggregator::summarize(caller, &inbound);
        let unread_total = aggregator::unread_total(&digests);
        let total_messages = self.store.count_received_by(caller)?;

        let mut conversations = Vec::with_capacity(digests.len());
        for digest in digests {
            let counterpart = match self.directory.lookup(&digest.counterpart)? {
                Some(profile) => profile,
                None => {
                    warn!("Conversation of {} with missing account {}", caller, digest.counterpart);
                    Profile::unknown(digest.counterpart)
                }
            };

            conversations.push(ConversationSummary {
                counterpart,
                latest: digest.latest,
                message_count: digest.inbound_count,
                unread_count: digest.unread_count,
            });
        }

        Ok(Inbox {
            conversations,
            total_messages,
            unread_total,
        })
    }
}
